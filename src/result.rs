// src/result.rs

use std::collections::HashMap;

use crate::{
    api::TestApi,
    error::AppError,
    models::{
        test::{Choice, ChoiceTexts},
        test_result::{GetTestResultRequest, GetTestResultResponse},
    },
    utils::cancel::CancelToken,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Nothing was chosen. Always counts as wrong.
    Unanswered,
}

impl Verdict {
    /// A question without a known correct choice can only be wrong.
    pub fn judge(selected: Option<Choice>, correct: Option<Choice>) -> Self {
        match selected {
            None => Verdict::Unanswered,
            Some(choice) if Some(choice) == correct => Verdict::Correct,
            Some(_) => Verdict::Incorrect,
        }
    }

    pub fn is_correct(self) -> bool {
        self == Verdict::Correct
    }

    /// Sidebar/row color: green when correct, red otherwise.
    pub fn color(self) -> Color {
        if self.is_correct() { Color::Green } else { Color::Red }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
}

/// One graded question.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub number: usize,
    pub question_id: String,
    pub question: String,
    pub choices: ChoiceTexts,
    pub correct: Option<Choice>,
    pub selected: Option<Choice>,
    pub verdict: Verdict,
}

impl ResultRow {
    /// Text of the correct choice, empty when the server did not say.
    pub fn correct_text(&self) -> &str {
        self.correct.map(|c| self.choices.text(c)).unwrap_or_default()
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selected.map(|c| self.choices.text(c))
    }
}

/// Read-only view of a finished attempt.
#[derive(Debug, Clone)]
pub struct ResultView {
    pub test_name: String,
    pub max_grade: Option<f64>,
    pub grade: f64,
    pub rows: Vec<ResultRow>,
}

impl ResultView {
    /// Joins the graded questions with the answer log by question id.
    /// A question without a log entry is unanswered.
    pub fn build(response: GetTestResultResponse) -> Self {
        let logs: HashMap<&str, Option<Choice>> = response
            .question_logs
            .iter()
            .map(|log| (log.question_id.as_str(), log.answer))
            .collect();

        let rows = response
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let selected = logs.get(q.id.as_str()).copied().flatten();
                ResultRow {
                    number: i + 1,
                    question_id: q.id.clone(),
                    question: q.question.clone(),
                    choices: q.choices.clone(),
                    correct: q.answer,
                    selected,
                    verdict: Verdict::judge(selected, q.answer),
                }
            })
            .collect();

        Self {
            test_name: response.test.name,
            max_grade: response.test.max_grade,
            grade: response.grade,
            rows,
        }
    }

    pub fn correct_count(&self) -> usize {
        self.rows.iter().filter(|r| r.verdict.is_correct()).count()
    }

    /// Grade rounded to the nearest whole point, as displayed.
    pub fn rounded_grade(&self) -> i64 {
        self.grade.round() as i64
    }
}

/// Fetches and builds the result of a finished attempt.
pub async fn load_result(
    api: &dyn TestApi,
    test_result_id: &str,
    cancel: &CancelToken,
) -> Result<ResultView, AppError> {
    let request = GetTestResultRequest {
        test_result_id: test_result_id.to_string(),
    };
    let response = api.get_test_result(&request, cancel).await.map_err(|e| {
        tracing::error!("Failed to load result {}: {}", test_result_id, e);
        e
    })?;
    Ok(ResultView::build(response))
}
