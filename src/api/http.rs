// src/api/http.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;
use validator::Validate;

use crate::{
    api::{TestApi, paths},
    error::AppError,
    models::{
        test::{GetTestQuestionRequest, GetTestQuestionResponse, TestSummary},
        test_result::{
            GetTestResultRequest, GetTestResultResponse, HistoryEntry, SubmitAnswerRequest,
            SubmitTestRequest, TestHistoryRequest,
        },
    },
    session::Session,
    utils::cancel::CancelToken,
};

/// `TestApi` over HTTP/JSON.
///
/// All endpoints are `POST` with a JSON body and the session's bearer token.
#[derive(Debug, Clone)]
pub struct HttpTestApi {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HttpTestApi {
    pub fn new(base_url: Url, session: Session, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base_url.join(path)?)
    }

    /// Sends one request and returns the raw successful response.
    async fn send<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response, AppError> {
        let url = self.endpoint(path)?;
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.session.bearer_token()))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = server_message(response).await;
        tracing::warn!("POST {} failed with {}: {}", path, status, message);
        Err(error_for_status(status, message))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B, cancel: &CancelToken) -> Result<R, AppError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        cancel
            .run(async {
                let response = self.send(path, body).await?;
                let bytes = response.bytes().await?;
                Ok(serde_json::from_slice::<R>(&bytes)?)
            })
            .await
    }

    async fn post_ack<B>(&self, path: &str, body: &B, cancel: &CancelToken) -> Result<(), AppError>
    where
        B: Serialize + ?Sized + Sync,
    {
        cancel
            .run(async {
                self.send(path, body).await?;
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl TestApi for HttpTestApi {
    async fn list_tests(&self, cancel: &CancelToken) -> Result<Vec<TestSummary>, AppError> {
        let tests: Vec<TestSummary> = self
            .post_json(paths::GET_TESTS, &serde_json::json!({}), cancel)
            .await?;
        for test in &tests {
            test.validate()?;
        }
        Ok(tests)
    }

    async fn test_history(
        &self,
        req: &TestHistoryRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        // The endpoint answers `null` when the user never took the test.
        let entries: Option<Vec<HistoryEntry>> = self.post_json(paths::GET_TEST_HISTORY, req, cancel).await?;
        let entries = entries.unwrap_or_default();
        for entry in &entries {
            entry.validate()?;
        }
        Ok(entries)
    }

    async fn get_test_question(
        &self,
        req: &GetTestQuestionRequest,
        cancel: &CancelToken,
    ) -> Result<GetTestQuestionResponse, AppError> {
        let response: GetTestQuestionResponse = self.post_json(paths::GET_TEST_QUESTION, req, cancel).await?;
        response.check()?;
        Ok(response)
    }

    async fn submit_answer(&self, req: &SubmitAnswerRequest, cancel: &CancelToken) -> Result<(), AppError> {
        self.post_ack(paths::SUBMIT_ANSWER, req, cancel).await
    }

    async fn submit_test(&self, req: &SubmitTestRequest, cancel: &CancelToken) -> Result<(), AppError> {
        self.post_ack(paths::SUBMIT_TEST, req, cancel).await
    }

    async fn get_test_result(
        &self,
        req: &GetTestResultRequest,
        cancel: &CancelToken,
    ) -> Result<GetTestResultResponse, AppError> {
        let response: GetTestResultResponse = self.post_json(paths::GET_TEST_RESULT, req, cancel).await?;
        response.validate()?;
        Ok(response)
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Extracts the `message` or `error` field of an error body, falling back to the raw text.
async fn server_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<Value>(&text) {
        Ok(body) => body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(text),
        Err(_) => text,
    }
}

fn error_for_status(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::BAD_REQUEST => AppError::BadRequest(message),
        StatusCode::UNAUTHORIZED => AppError::AuthError(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        _ => AppError::Server {
            status: status.as_u16(),
            message,
        },
    }
}
