// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};

use ezlearn_test::{
    AppError, Session, TestApi,
    attempt::{AttemptObserver, TestAttempt},
    models::{
        test::{Choice, GetTestQuestionRequest, GetTestQuestionResponse, TestSummary},
        test_result::{
            GetTestResultRequest, GetTestResultResponse, HistoryEntry, SubmitAnswerRequest,
            SubmitTestRequest, TestHistoryRequest,
        },
        user::SessionUser,
    },
    utils::cancel::CancelToken,
};

pub const TOKEN: &str = "test-token";
pub const USER_ID: &str = "user-1";
pub const TEST_ID: &str = "test-1";
pub const RESULT_ID: &str = "result-1";

/// Correct choice per question of the sample test.
pub fn answer_key() -> HashMap<&'static str, u8> {
    HashMap::from([("q1", 1), ("q2", 3), ("s1", 2)])
}

/// Two single questions and one reading passage with one sub-question.
pub fn sample_test_json(time_left: i64, current: &HashMap<String, u8>) -> Value {
    let current_of = |id: &str| current.get(id).copied().unwrap_or(0);
    json!({
        "test": { "name": "IELTS Mock 1", "timeLimitByMinutes": 1, "maxGrade": 30 },
        "questions": [
            {
                "_id": "q1", "question": "2 + 2 = ?",
                "choice_1": "4", "choice_2": "5", "choice_3": "6", "choice_4": "22",
                "currentAnswer": current_of("q1")
            },
            {
                "_id": "q2", "question": "Capital of France?",
                "choice_1": "Rome", "choice_2": "Berlin", "choice_3": "Paris", "choice_4": "Madrid",
                "currentAnswer": current_of("q2")
            }
        ],
        "subQuestions": [
            {
                "_id": "s1", "question": "What is the passage about?",
                "choice_1": "Cats", "choice_2": "Rivers", "choice_3": "Trains", "choice_4": "Bread",
                "currentAnswer": current_of("s1")
            }
        ],
        "questionWithSubQuestions": [
            {
                "_id": "g1", "readingText": "Rivers shape the land.", "audioUrl": "",
                "childQuestionIds": ["s1"], "questionType": "Reading"
            }
        ],
        "timeLeft": time_left,
        "testResultId": RESULT_ID
    })
}

pub fn sample_response(time_left: i64) -> GetTestQuestionResponse {
    serde_json::from_value(sample_test_json(time_left, &HashMap::new())).expect("sample payload must decode")
}

/// Graded payload for the given committed answers; 10 points per correct answer.
pub fn sample_result_json(answers: &HashMap<String, u8>) -> Value {
    let key = answer_key();
    let grade: u32 = answers
        .iter()
        .filter(|(id, choice)| key.get(id.as_str()) == Some(*choice))
        .map(|_| 10)
        .sum();
    let logs: Vec<Value> = answers
        .iter()
        .map(|(id, choice)| json!({ "questionId": id, "answer": choice }))
        .collect();
    json!({
        "test": { "name": "IELTS Mock 1", "maxGrade": 30 },
        "questions": [
            { "_id": "q1", "question": "2 + 2 = ?", "choice_1": "4", "choice_2": "5", "choice_3": "6", "choice_4": "22", "answer": 1 },
            { "_id": "q2", "question": "Capital of France?", "choice_1": "Rome", "choice_2": "Berlin", "choice_3": "Paris", "choice_4": "Madrid", "answer": 3 },
            { "_id": "s1", "question": "What is the passage about?", "choice_1": "Cats", "choice_2": "Rivers", "choice_3": "Trains", "choice_4": "Bread", "answer": 2 }
        ],
        "questionLogs": logs,
        "grade": grade
    })
}

pub fn session() -> Session {
    let user = SessionUser {
        id: USER_ID.to_string(),
        username: Some("student1".to_string()),
        role: None,
    };
    Session::new(user, TOKEN)
}

pub fn choice(letter: &str) -> Choice {
    Choice::parse(letter).expect("valid choice letter")
}

// ---------------------------------------------------------------------------
// In-process HTTP mock of the test service
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MockState {
    pub time_left: i64,
    pub answers: HashMap<String, u8>,
    pub submit_answer_calls: usize,
    pub submit_test_calls: usize,
    pub submitted: bool,
    pub fail_submit_test: bool,
    /// Delay applied to `get-tests`, for cancellation tests.
    pub slow_list: Option<Duration>,
    pub last_history_body: Option<Value>,
}

pub type Shared = Arc<Mutex<MockState>>;

pub struct MockServer {
    pub address: String,
    pub state: Shared,
}

/// Spawns the mock service on a random port.
pub async fn spawn_app(time_left: i64) -> MockServer {
    let state: Shared = Arc::new(Mutex::new(MockState {
        time_left,
        ..MockState::default()
    }));

    let app = Router::new()
        .route("/api/test/get-tests", post(get_tests))
        .route("/api/test/get-test-history", post(get_test_history))
        .route("/api/test/get-test-question", post(get_test_question))
        .route("/api/test/submit-answer", post(submit_answer))
        .route("/api/test/submit-test", post(submit_test))
        .route("/api/test/get-test-result", post(get_test_result))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}/api", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer { address, state }
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()),
    }
}

async fn get_tests(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    let delay = state.lock().unwrap().slow_list;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Json(json!([
        {
            "_id": TEST_ID, "name": "IELTS Mock 1", "numberOfQuestions": 3, "language": "en",
            "maxGrade": 30, "timeLimitByMinutes": 1, "thumbnail": "https://cdn.example/t1.png"
        },
        {
            "_id": "test-2", "name": "Kiểm tra tiếng Việt", "numberOfQuestions": 20, "language": "vi",
            "maxGrade": 10, "timeLimitByMinutes": 45
        }
    ]))
    .into_response()
}

async fn get_test_history(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    let mut s = state.lock().unwrap();
    s.last_history_body = Some(body.clone());
    if body["testId"] != TEST_ID {
        return Json(Value::Null).into_response();
    }
    Json(json!([
        {
            "testResultId": "result-0", "startIsoDate": "2026-10-01T08:30:00Z", "grade": 19.6,
            "createdAt": "2026-10-01T08:30:00Z", "testId": { "name": "IELTS Mock 1", "maxGrade": 30 }
        }
    ]))
    .into_response()
}

async fn get_test_question(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    if body["testId"] != TEST_ID || body["userId"] != USER_ID {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Test not found" }))).into_response();
    }
    let s = state.lock().unwrap();
    Json(sample_test_json(s.time_left, &s.answers)).into_response()
}

async fn submit_answer(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    let mut s = state.lock().unwrap();
    s.submit_answer_calls += 1;
    if body["testResultId"] != RESULT_ID {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Unknown attempt" }))).into_response();
    }
    let (Some(question_id), Some(selected)) = (body["questionId"].as_str(), body["selectedAnswer"].as_u64()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Malformed answer" }))).into_response();
    };
    s.answers.insert(question_id.to_string(), selected as u8);
    Json(json!({ "message": "Answer saved" })).into_response()
}

async fn submit_test(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    let mut s = state.lock().unwrap();
    s.submit_test_calls += 1;
    if s.fail_submit_test {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "boom" }))).into_response();
    }
    if body["testResultId"] != RESULT_ID {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Unknown attempt" }))).into_response();
    }
    s.submitted = true;
    Json(json!({ "message": "Test submitted" })).into_response()
}

async fn get_test_result(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    if body["testResultId"] != RESULT_ID {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "Result not found" }))).into_response();
    }
    let s = state.lock().unwrap();
    Json(sample_result_json(&s.answers)).into_response()
}

// ---------------------------------------------------------------------------
// In-memory TestApi for driving the runner without sockets
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeState {
    pub answers: HashMap<String, u8>,
    pub answer_requests: Vec<SubmitAnswerRequest>,
    pub submit_test_calls: usize,
    /// Number of upcoming submit-test calls that fail.
    pub failing_submits: usize,
    /// Questions whose submit-answer call fails.
    pub failing_answers: Vec<String>,
    /// How long submit-test takes to answer.
    pub submit_delay: Option<Duration>,
}

pub struct FakeApi {
    pub time_left: i64,
    pub state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new(time_left: i64) -> Self {
        Self {
            time_left,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn submit_test_calls(&self) -> usize {
        self.state.lock().unwrap().submit_test_calls
    }

    pub fn answers(&self) -> HashMap<String, u8> {
        self.state.lock().unwrap().answers.clone()
    }
}

#[async_trait]
impl TestApi for FakeApi {
    async fn list_tests(&self, _cancel: &CancelToken) -> Result<Vec<TestSummary>, AppError> {
        Ok(Vec::new())
    }

    async fn test_history(
        &self,
        _req: &TestHistoryRequest,
        _cancel: &CancelToken,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(Vec::new())
    }

    async fn get_test_question(
        &self,
        _req: &GetTestQuestionRequest,
        _cancel: &CancelToken,
    ) -> Result<GetTestQuestionResponse, AppError> {
        let answers = self.answers();
        Ok(serde_json::from_value(sample_test_json(self.time_left, &answers))?)
    }

    async fn submit_answer(&self, req: &SubmitAnswerRequest, cancel: &CancelToken) -> Result<(), AppError> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let mut s = self.state.lock().unwrap();
        s.answer_requests.push(req.clone());
        if s.failing_answers.contains(&req.question_id) {
            return Err(AppError::Server {
                status: 500,
                message: "database down".to_string(),
            });
        }
        s.answers.insert(req.question_id.clone(), req.selected_answer.number());
        Ok(())
    }

    async fn submit_test(&self, _req: &SubmitTestRequest, cancel: &CancelToken) -> Result<(), AppError> {
        let delay = self.state.lock().unwrap().submit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let mut s = self.state.lock().unwrap();
        s.submit_test_calls += 1;
        if s.failing_submits > 0 {
            s.failing_submits -= 1;
            return Err(AppError::Network("connection reset".to_string()));
        }
        Ok(())
    }

    async fn get_test_result(
        &self,
        _req: &GetTestResultRequest,
        _cancel: &CancelToken,
    ) -> Result<GetTestResultResponse, AppError> {
        let answers = self.answers();
        Ok(serde_json::from_value(sample_result_json(&answers))?)
    }
}

// ---------------------------------------------------------------------------
// Observer that records what the user would have seen
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Recorder {
    pub ticks: Vec<u64>,
    pub alerts: Vec<String>,
    pub drafts: Vec<usize>,
    pub committed: Vec<usize>,
    pub shown: Vec<Option<usize>>,
    pub submitted: usize,
    /// Sidebar state (answered flags) after each commit.
    pub sidebars: Vec<Vec<bool>>,
}

impl AttemptObserver for Recorder {
    fn on_tick(&mut self, attempt: &TestAttempt) {
        self.ticks.push(attempt.time_left());
    }

    fn on_show(&mut self, _attempt: &TestAttempt, focus: Option<usize>) {
        self.shown.push(focus);
    }

    fn on_draft(&mut self, _attempt: &TestAttempt, number: usize) {
        self.drafts.push(number);
    }

    fn on_answer_committed(&mut self, attempt: &TestAttempt, number: usize) {
        self.committed.push(number);
        self.sidebars
            .push(attempt.sheet().markers().iter().map(|m| m.answered).collect());
    }

    fn on_submitted(&mut self, _attempt: &TestAttempt) {
        self.submitted += 1;
    }

    fn on_alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}
