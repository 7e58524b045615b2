// src/models/test_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::test::{Choice, ChoiceTexts, TestInfo, optional_choice};

/// DTO for committing one answer of a running attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub test_result_id: String,
    pub question_id: String,
    pub selected_answer: Choice,
}

/// DTO for finalizing an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestRequest {
    pub test_result_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTestResultRequest {
    pub test_result_id: String,
}

/// A question of a finished attempt, including the correct choice.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GradedQuestion {
    #[serde(rename = "_id")]
    #[validate(length(min = 1))]
    pub id: String,

    #[serde(default)]
    pub question: String,

    #[serde(flatten)]
    pub choices: ChoiceTexts,

    /// The correct choice; `None` when the key is missing or `0`.
    #[serde(default, deserialize_with = "optional_choice")]
    pub answer: Option<Choice>,
}

/// What the candidate chose for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionLog {
    pub question_id: String,
    #[serde(default, deserialize_with = "optional_choice")]
    pub answer: Option<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetTestResultResponse {
    #[validate(nested)]
    pub test: TestInfo,

    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<GradedQuestion>,

    #[serde(default)]
    pub question_logs: Vec<QuestionLog>,

    #[validate(range(min = 0.0, message = "Grade must not be negative."))]
    pub grade: f64,
}

/// DTO for listing earlier attempts of a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestHistoryRequest {
    pub test_id: String,
    pub user_id: String,
}

/// The test an attempt belongs to, as embedded in a history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTest {
    pub name: String,
    #[serde(default)]
    pub max_grade: f64,
}

/// One earlier attempt.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[validate(length(min = 1))]
    pub test_result_id: String,
    #[serde(default)]
    pub start_iso_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub grade: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "testId")]
    pub test: HistoryTest,
}

impl HistoryEntry {
    /// When the attempt was taken: `createdAt`, else `startIsoDate`.
    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.start_iso_date)
    }
}
