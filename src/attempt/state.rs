// src/attempt/state.rs

use crate::{
    attempt::{answers::AnswerSheet, countdown::Countdown},
    error::AppError,
    models::{
        test::{Choice, GetTestQuestionResponse, Question, QuestionGroup, TestInfo},
        test_result::{SubmitAnswerRequest, SubmitTestRequest},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    /// Answers can be staged and submitted.
    InProgress,
    /// The submit-test call is in flight.
    Finalizing,
    /// The server accepted the submission; the attempt is closed.
    Submitted,
}

/// What a countdown tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time left after the tick.
    Running(u64),
    /// Time just ran out. Reported once per attempt.
    Expired,
    /// The countdown no longer runs (already at zero, or attempt closed).
    Idle,
}

/// Client-side state of one running attempt.
///
/// Pure state machine: network calls are made by the runner, which feeds
/// their outcomes back through `answer_acknowledged` and `finalize_*`.
#[derive(Debug, Clone)]
pub struct TestAttempt {
    test_id: String,
    test_result_id: String,
    test: TestInfo,
    questions: Vec<Question>,
    sub_questions: Vec<Question>,
    groups: Vec<QuestionGroup>,
    sheet: AnswerSheet,
    countdown: Countdown,
    phase: AttemptPhase,
    auto_submit_fired: bool,
}

impl TestAttempt {
    /// Builds the attempt from a `get-test-question` payload.
    ///
    /// Previously committed answers are restored as both draft and committed.
    pub fn from_response(test_id: impl Into<String>, response: GetTestQuestionResponse) -> Result<Self, AppError> {
        response.check()?;

        let sheet = AnswerSheet::new(
            response
                .questions
                .iter()
                .chain(&response.sub_questions)
                .map(|q| (q.id.clone(), q.current_answer)),
        );

        Ok(Self {
            test_id: test_id.into(),
            test_result_id: response.test_result_id,
            test: response.test,
            questions: response.questions,
            sub_questions: response.sub_questions,
            groups: response.question_with_sub_questions,
            sheet,
            countdown: Countdown::new(response.time_left),
            phase: AttemptPhase::InProgress,
            auto_submit_fired: false,
        })
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn test_result_id(&self) -> &str {
        &self.test_result_id
    }

    pub fn test(&self) -> &TestInfo {
        &self.test
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn groups(&self) -> &[QuestionGroup] {
        &self.groups
    }

    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn time_left(&self) -> u64 {
        self.countdown.remaining()
    }

    pub fn is_expired(&self) -> bool {
        self.countdown.is_zero()
    }

    /// Sub-questions of a group, in delivery order.
    pub fn children_of<'a>(&'a self, group: &'a QuestionGroup) -> impl Iterator<Item = &'a Question> + 'a {
        self.sub_questions
            .iter()
            .filter(move |q| group.child_question_ids.contains(&q.id))
    }

    /// Question shown under sidebar number `number` (1-based).
    pub fn question_at(&self, number: usize) -> Option<&Question> {
        let id = self.sheet.id_at(number)?;
        self.find_question(id)
    }

    pub fn find_question(&self, question_id: &str) -> Option<&Question> {
        self.questions
            .iter()
            .chain(&self.sub_questions)
            .find(|q| q.id == question_id)
    }

    /// Stages a draft choice for question `number`.
    pub fn select(&mut self, number: usize, choice: Choice) -> Result<(), AppError> {
        self.ensure_in_progress()?;
        let id = self.id_for(number)?;
        self.sheet.stage(&id, choice)
    }

    /// Builds the submit-answer request for question `number` from its draft.
    ///
    /// Rejected locally when nothing is selected, the attempt is closing,
    /// or the local countdown already reached zero.
    pub fn prepare_answer(&self, number: usize) -> Result<SubmitAnswerRequest, AppError> {
        self.ensure_in_progress()?;
        if self.is_expired() {
            return Err(AppError::BadRequest("Time is up, answers can no longer be changed.".to_string()));
        }
        let id = self.id_for(number)?;
        let selected = self
            .sheet
            .draft(&id)
            .ok_or_else(|| AppError::BadRequest("You have not selected an answer yet!".to_string()))?;

        Ok(SubmitAnswerRequest {
            test_result_id: self.test_result_id.clone(),
            question_id: id,
            selected_answer: selected,
        })
    }

    /// Marks the acknowledged choice as committed. Other questions are untouched.
    pub fn answer_acknowledged(&mut self, request: &SubmitAnswerRequest) -> Result<(), AppError> {
        if request.test_result_id != self.test_result_id {
            return Err(AppError::InternalError(format!(
                "Acknowledgement for attempt '{}' delivered to attempt '{}'",
                request.test_result_id, self.test_result_id
            )));
        }
        self.sheet.commit(&request.question_id, request.selected_answer)
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase == AttemptPhase::Submitted || self.auto_submit_fired {
            return TickOutcome::Idle;
        }
        let remaining = self.countdown.tick();
        if self.take_expiry() {
            TickOutcome::Expired
        } else {
            TickOutcome::Running(remaining)
        }
    }

    /// Reports an expiry that is due without ticking, e.g. an attempt that
    /// was already overdue when loaded. Shares the once-only guard with `tick`.
    pub fn take_expiry(&mut self) -> bool {
        if self.countdown.is_zero() && !self.auto_submit_fired && self.phase != AttemptPhase::Submitted {
            self.auto_submit_fired = true;
            true
        } else {
            false
        }
    }

    /// `InProgress -> Finalizing`. Only one finalization may be in flight.
    pub fn begin_finalize(&mut self) -> Result<SubmitTestRequest, AppError> {
        match self.phase {
            AttemptPhase::InProgress => {
                self.phase = AttemptPhase::Finalizing;
                Ok(SubmitTestRequest {
                    test_result_id: self.test_result_id.clone(),
                })
            }
            AttemptPhase::Finalizing => Err(AppError::BadRequest("The test is already being submitted.".to_string())),
            AttemptPhase::Submitted => Err(AppError::BadRequest("The test has already been submitted.".to_string())),
        }
    }

    pub fn finalize_succeeded(&mut self) {
        self.phase = AttemptPhase::Submitted;
    }

    /// Reopens the attempt so the user can retry the submission.
    pub fn finalize_failed(&mut self) {
        if self.phase == AttemptPhase::Finalizing {
            self.phase = AttemptPhase::InProgress;
        }
    }

    fn ensure_in_progress(&self) -> Result<(), AppError> {
        match self.phase {
            AttemptPhase::InProgress => Ok(()),
            _ => Err(AppError::BadRequest("The test is being submitted.".to_string())),
        }
    }

    fn id_for(&self, number: usize) -> Result<String, AppError> {
        self.sheet
            .id_at(number)
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest(format!("There is no question {}.", number)))
    }
}
