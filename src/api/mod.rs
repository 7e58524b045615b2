// src/api/mod.rs

pub mod http;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        test::{GetTestQuestionRequest, GetTestQuestionResponse, TestSummary},
        test_result::{
            GetTestResultRequest, GetTestResultResponse, HistoryEntry, SubmitAnswerRequest,
            SubmitTestRequest, TestHistoryRequest,
        },
    },
    utils::cancel::CancelToken,
};

pub use http::HttpTestApi;

/// Endpoint paths, relative to the configured API base URL.
pub mod paths {
    pub const GET_TESTS: &str = "test/get-tests";
    pub const GET_TEST_HISTORY: &str = "test/get-test-history";
    pub const GET_TEST_QUESTION: &str = "test/get-test-question";
    pub const SUBMIT_ANSWER: &str = "test/submit-answer";
    pub const SUBMIT_TEST: &str = "test/submit-test";
    pub const GET_TEST_RESULT: &str = "test/get-test-result";
}

/// The remote test service.
///
/// Every call is independent and may be abandoned through `cancel`,
/// in which case it resolves to `AppError::Cancelled`.
#[async_trait]
pub trait TestApi: Send + Sync {
    async fn list_tests(&self, cancel: &CancelToken) -> Result<Vec<TestSummary>, AppError>;

    async fn test_history(
        &self,
        req: &TestHistoryRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<HistoryEntry>, AppError>;

    /// Opens the attempt (or resumes the running one) for a test.
    async fn get_test_question(
        &self,
        req: &GetTestQuestionRequest,
        cancel: &CancelToken,
    ) -> Result<GetTestQuestionResponse, AppError>;

    async fn submit_answer(&self, req: &SubmitAnswerRequest, cancel: &CancelToken) -> Result<(), AppError>;

    async fn submit_test(&self, req: &SubmitTestRequest, cancel: &CancelToken) -> Result<(), AppError>;

    async fn get_test_result(
        &self,
        req: &GetTestResultRequest,
        cancel: &CancelToken,
    ) -> Result<GetTestResultResponse, AppError>;
}
