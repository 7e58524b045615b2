// src/render.rs

//! Plain-text views for the terminal front-end.
//!
//! Every function returns a `String`; printing is left to the caller.

use std::fmt::Write;

use crate::{
    attempt::{AnswerSheet, TestAttempt, format_time},
    models::{
        test::{Choice, Question, QuestionType, TestSummary},
        test_result::HistoryEntry,
    },
    result::{Color, ResultView},
};

/// Sidebar numbers per row.
const SIDEBAR_COLUMNS: usize = 5;

pub fn render_clock(attempt: &TestAttempt) -> String {
    format!("Time left: {}", format_time(attempt.time_left()))
}

/// Sidebar index: `[ 3*]` once the server has the answer, `[ 3 ]` otherwise.
pub fn render_sidebar(sheet: &AnswerSheet) -> String {
    let mut out = String::new();
    for chunk in sheet.markers().chunks(SIDEBAR_COLUMNS) {
        let line: Vec<String> = chunk
            .iter()
            .map(|m| format!("[{:>2}{}]", m.number, if m.answered { '*' } else { ' ' }))
            .collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    let _ = writeln!(out, "Answered: {}/{}", sheet.answered_count(), sheet.len());
    out
}

/// The full attempt: clock, sidebar, single questions, then grouped questions.
pub fn render_attempt(attempt: &TestAttempt) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", attempt.test().name);
    let _ = writeln!(out, "{}", render_clock(attempt));
    out.push_str(&render_sidebar(attempt.sheet()));
    out.push('\n');

    for (i, q) in attempt.questions().iter().enumerate() {
        let _ = writeln!(out, "Question {}: {}", i + 1, q.question);
        out.push_str(&render_choices(attempt, q));
        out.push('\n');
    }

    for (i, group) in attempt.groups().iter().enumerate() {
        let kind = match group.question_type {
            QuestionType::Listening => "Listening question",
            QuestionType::Reading => "Reading question",
        };
        let _ = writeln!(out, "{}. {}", i + 1, kind);
        if let Some(url) = group.audio_url.as_deref().filter(|u| !u.is_empty()) {
            let _ = writeln!(out, "   Audio: {}", url);
        }
        if let Some(text) = group.reading_text.as_deref().filter(|t| !t.is_empty()) {
            let _ = writeln!(out, "   {}", text);
        }
        for (k, sub) in attempt.children_of(group).enumerate() {
            let _ = writeln!(out, "   Sub-question {}: {}", k + 1, sub.question);
            out.push_str(&render_choices(attempt, sub));
        }
        out.push('\n');
    }

    out
}

/// A single question, addressed by its sidebar number.
pub fn render_question(attempt: &TestAttempt, number: usize) -> Option<String> {
    let q = attempt.question_at(number)?;
    let mut out = String::new();
    let _ = writeln!(out, "Question {}: {}", number, q.question);
    out.push_str(&render_choices(attempt, q));
    Some(out)
}

fn render_choices(attempt: &TestAttempt, q: &Question) -> String {
    let sheet = attempt.sheet();
    let draft = sheet.draft(&q.id);
    let committed = sheet.committed(&q.id);
    let number = sheet.number_of(&q.id).unwrap_or_default();

    let mut out = String::new();
    for choice in Choice::all() {
        let mark = if draft == Some(choice) { "(x)" } else { "( )" };
        let _ = writeln!(out, "    {} {}. {}", mark, choice, q.choices.text(choice));
    }
    let status = match (draft, committed) {
        (_, Some(c)) if draft == committed => format!("submitted {}", c),
        (Some(d), _) => format!("{} selected, not submitted", d),
        (None, _) => "no answer".to_string(),
    };
    let _ = writeln!(out, "    [#{} {}]", number, status);
    out
}

pub fn render_result(view: &ResultView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Result: {} ==", view.test_name);
    let max = view
        .max_grade
        .map(|m| format!("{}", m))
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "Total: {} / {}", view.rounded_grade(), max);
    let _ = writeln!(out, "Correct: {}/{}", view.correct_count(), view.rows.len());
    out.push('\n');

    for chunk in view.rows.chunks(SIDEBAR_COLUMNS) {
        let line: Vec<String> = chunk
            .iter()
            .map(|r| format!("[{:>2} {}]", r.number, color_tag(r.verdict.color())))
            .collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    out.push('\n');

    for row in &view.rows {
        let _ = writeln!(
            out,
            "Question {} [{}]: {}",
            row.number,
            color_tag(row.verdict.color()),
            row.question
        );
        for choice in Choice::all() {
            let mark = if row.selected == Some(choice) { "(x)" } else { "( )" };
            let _ = writeln!(out, "    {} {}. {}", mark, choice, row.choices.text(choice));
        }
        let correct_text = match row.correct_text() {
            "" => "(unknown)",
            text => text,
        };
        let _ = writeln!(out, "    Correct answer: {}", correct_text);
        let chosen = if row.verdict.is_correct() {
            "Correct".to_string()
        } else {
            row.selected_text().unwrap_or("(not chosen)").to_string()
        };
        let _ = writeln!(out, "    Your answer: {}", chosen);
        out.push('\n');
    }
    out
}

fn color_tag(color: Color) -> &'static str {
    match color {
        Color::Green => "ok",
        Color::Red => "x",
    }
}

pub fn render_catalogue(tests: &[TestSummary]) -> String {
    if tests.is_empty() {
        return "No tests available.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<26} {:<32} {:>4} {:>9} {:>7} {:>6}",
        "ID", "NAME", "LANG", "QUESTIONS", "MINUTES", "MAX"
    );
    for t in tests {
        let _ = writeln!(
            out,
            "{:<26} {:<32} {:>4} {:>9} {:>7} {:>6}",
            t.id,
            truncate(&t.name, 32),
            t.language.to_string(),
            t.number_of_questions,
            t.time_limit_by_minutes,
            t.max_grade
        );
    }
    out
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No attempts for this test yet.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:<26} {:<17} {:>10}", "RESULT ID", "DATE", "GRADE");
    for e in entries {
        let _ = writeln!(
            out,
            "{:<26} {:<17} {:>10}",
            e.test_result_id,
            e.taken_at()
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{}/{}", e.grade.round(), e.test.max_grade)
        );
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
