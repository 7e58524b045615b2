// src/attempt/runner.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    api::TestApi,
    attempt::state::{AttemptPhase, TestAttempt, TickOutcome},
    config::{CHANNEL_CAPACITY, TICK_INTERVAL},
    error::AppError,
    models::{
        test::{Choice, GetTestQuestionRequest},
        test_result::SubmitAnswerRequest,
    },
    session::Session,
    utils::cancel::CancelToken,
};

/// User actions fed into a running attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stage `choice` as the draft of question `number`.
    Select { number: usize, choice: Choice },
    /// Send the draft of question `number` to the server.
    SubmitAnswer { number: usize },
    /// Show a single question.
    Goto { number: usize },
    /// Show the whole attempt.
    Show,
    /// Submit the test now.
    Finish,
    /// Leave without submitting; in-flight requests are cancelled.
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Submitted { test_result_id: String },
    Abandoned,
}

/// Receives everything the user should see while an attempt runs.
pub trait AttemptObserver: Send {
    fn on_start(&mut self, _attempt: &TestAttempt) {}

    fn on_tick(&mut self, _attempt: &TestAttempt) {}

    /// `focus` is the question number to show, or `None` for the full view.
    fn on_show(&mut self, _attempt: &TestAttempt, _focus: Option<usize>) {}

    fn on_draft(&mut self, _attempt: &TestAttempt, _number: usize) {}

    fn on_answer_committed(&mut self, _attempt: &TestAttempt, _number: usize) {}

    fn on_submitted(&mut self, _attempt: &TestAttempt) {}

    /// A blocking, user-facing message.
    fn on_alert(&mut self, message: &str);
}

/// Completion of a spawned request.
#[derive(Debug)]
enum Event {
    AnswerSettled {
        request: SubmitAnswerRequest,
        result: Result<(), AppError>,
    },
    FinalizeSettled(Result<(), AppError>),
}

/// Loads (or resumes) the attempt of the session user for `test_id`.
pub async fn open_attempt(
    api: &dyn TestApi,
    session: &Session,
    test_id: &str,
    cancel: &CancelToken,
) -> Result<TestAttempt, AppError> {
    session.ensure_fresh(chrono::Utc::now().timestamp())?;

    tracing::info!("Opening test {} for user {}", test_id, session.user_id());
    let request = GetTestQuestionRequest {
        test_id: test_id.to_string(),
        user_id: session.user_id().to_string(),
    };
    let response = api.get_test_question(&request, cancel).await.map_err(|e| {
        tracing::error!("Failed to load test {}: {}", test_id, e);
        e
    })?;

    let attempt = TestAttempt::from_response(test_id, response)?;
    tracing::info!(
        "Attempt {} loaded: {} questions, {}s left",
        attempt.test_result_id(),
        attempt.sheet().len(),
        attempt.time_left()
    );
    Ok(attempt)
}

/// Drives one attempt: the countdown, user commands, and request completions.
///
/// * Answer submissions run as independent tasks; nothing orders them.
/// * When the countdown reaches zero the test is submitted exactly once.
/// * A failed final submission reopens the attempt for a manual retry.
pub struct AttemptRunner {
    api: Arc<dyn TestApi>,
    attempt: TestAttempt,
    cancel: CancelToken,
    tick_every: Duration,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
}

impl AttemptRunner {
    pub fn new(api: Arc<dyn TestApi>, attempt: TestAttempt, cancel: CancelToken) -> Self {
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            api,
            attempt,
            cancel,
            tick_every: TICK_INTERVAL,
            events_tx,
            events_rx,
        }
    }

    pub fn with_tick_interval(mut self, tick_every: Duration) -> Self {
        self.tick_every = tick_every;
        self
    }

    pub fn attempt(&self) -> &TestAttempt {
        &self.attempt
    }

    /// Runs until the test is submitted, the user quits, or the token is cancelled.
    /// Returns the outcome together with the final attempt state.
    ///
    /// A closed command channel does not end the attempt; the countdown
    /// keeps running and submits on expiry.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        observer: &mut dyn AttemptObserver,
    ) -> (Outcome, TestAttempt) {
        let mut ticker = time::interval_at(Instant::now() + self.tick_every, self.tick_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let cancel = self.cancel.clone();
        let mut commands_open = true;

        observer.on_start(&self.attempt);
        if self.attempt.take_expiry() {
            tracing::info!("Attempt {} is already overdue", self.attempt.test_result_id());
            self.finalize(observer, true);
        }

        let outcome = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Attempt {} cancelled", self.attempt.test_result_id());
                    break Outcome::Abandoned;
                }
                _ = ticker.tick() => match self.attempt.tick() {
                    TickOutcome::Running(_) => observer.on_tick(&self.attempt),
                    TickOutcome::Expired => {
                        observer.on_tick(&self.attempt);
                        tracing::info!("Time is up for attempt {}", self.attempt.test_result_id());
                        self.finalize(observer, true);
                    }
                    TickOutcome::Idle => {}
                },
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(cmd) => {
                        if let Some(outcome) = self.handle_command(cmd, observer) {
                            break outcome;
                        }
                    }
                    None => {
                        tracing::debug!("Command channel closed; waiting for the countdown");
                        commands_open = false;
                    }
                },
                Some(event) = self.events_rx.recv() => {
                    if let Some(outcome) = self.handle_event(event, observer) {
                        break outcome;
                    }
                }
            }
        };

        (outcome, self.attempt)
    }

    fn handle_command(&mut self, cmd: Command, observer: &mut dyn AttemptObserver) -> Option<Outcome> {
        match cmd {
            Command::Select { number, choice } => match self.attempt.select(number, choice) {
                Ok(()) => observer.on_draft(&self.attempt, number),
                Err(e) => observer.on_alert(&e.user_message()),
            },
            Command::SubmitAnswer { number } => match self.attempt.prepare_answer(number) {
                Ok(request) => self.spawn_answer(request),
                Err(e) => observer.on_alert(&e.user_message()),
            },
            Command::Goto { number } => {
                if self.attempt.question_at(number).is_some() {
                    observer.on_show(&self.attempt, Some(number));
                } else {
                    observer.on_alert(&format!("There is no question {}.", number));
                }
            }
            Command::Show => observer.on_show(&self.attempt, None),
            Command::Finish => self.finalize(observer, false),
            Command::Quit if self.attempt.phase() == AttemptPhase::Finalizing => {
                observer.on_alert("The test is being submitted. Please wait for the result.");
            }
            Command::Quit => {
                tracing::info!("Leaving attempt {} without submitting", self.attempt.test_result_id());
                self.cancel.cancel();
                return Some(Outcome::Abandoned);
            }
        }
        None
    }

    fn handle_event(&mut self, event: Event, observer: &mut dyn AttemptObserver) -> Option<Outcome> {
        match event {
            Event::AnswerSettled { request, result } => match result {
                Ok(()) => {
                    if let Err(e) = self.attempt.answer_acknowledged(&request) {
                        tracing::error!("Dropping acknowledgement: {}", e);
                        return None;
                    }
                    if let Some(number) = self.attempt.sheet().number_of(&request.question_id) {
                        observer.on_answer_committed(&self.attempt, number);
                    }
                }
                Err(AppError::Cancelled) => {}
                Err(e) => {
                    tracing::error!("Failed to submit answer for question {}: {}", request.question_id, e);
                    observer.on_alert(&e.user_message());
                }
            },
            Event::FinalizeSettled(Ok(())) => {
                self.attempt.finalize_succeeded();
                tracing::info!("Attempt {} submitted", self.attempt.test_result_id());
                observer.on_submitted(&self.attempt);
                return Some(Outcome::Submitted {
                    test_result_id: self.attempt.test_result_id().to_string(),
                });
            }
            Event::FinalizeSettled(Err(e)) => {
                self.attempt.finalize_failed();
                if !matches!(e, AppError::Cancelled) {
                    tracing::error!("Failed to submit attempt {}: {}", self.attempt.test_result_id(), e);
                    observer.on_alert(&e.user_message());
                }
            }
        }
        None
    }

    /// Starts the submit-test call. `automatic` is set when the countdown expired.
    fn finalize(&mut self, observer: &mut dyn AttemptObserver, automatic: bool) {
        if automatic && self.attempt.phase() == AttemptPhase::Finalizing {
            // A manual submission is already on its way.
            return;
        }
        let request = match self.attempt.begin_finalize() {
            Ok(request) => request,
            Err(e) => {
                observer.on_alert(&e.user_message());
                return;
            }
        };

        let api = Arc::clone(&self.api);
        let cancel = self.cancel.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.submit_test(&request, &cancel).await;
            let _ = tx.send(Event::FinalizeSettled(result)).await;
        });
    }

    fn spawn_answer(&self, request: SubmitAnswerRequest) {
        tracing::debug!(
            "Submitting answer {} for question {}",
            request.selected_answer,
            request.question_id
        );
        let api = Arc::clone(&self.api);
        let cancel = self.cancel.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.submit_answer(&request, &cancel).await;
            let _ = tx.send(Event::AnswerSettled { request, result }).await;
        });
    }
}
