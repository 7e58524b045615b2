// src/terminal.rs

use std::io::Write;

use crate::{
    attempt::{AttemptObserver, TestAttempt},
    render::{render_attempt, render_clock, render_question, render_sidebar},
};

/// Seconds below which every tick is printed.
const FINAL_COUNTDOWN: u64 = 10;

/// `AttemptObserver` that prints to a terminal.
///
/// The clock is printed on every full minute and every second of the final
/// countdown; alerts go to `alerts`, everything else to `out`.
pub struct TerminalView<W: Write + Send, E: Write + Send> {
    out: W,
    alerts: E,
}

impl<W: Write + Send, E: Write + Send> TerminalView<W, E> {
    pub fn new(out: W, alerts: E) -> Self {
        Self { out, alerts }
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.alerts)
    }

    fn print(&mut self, text: &str) {
        // Write errors are ignored; the attempt keeps running.
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

impl<W: Write + Send, E: Write + Send> AttemptObserver for TerminalView<W, E> {
    fn on_start(&mut self, attempt: &TestAttempt) {
        self.print(&render_attempt(attempt));
        self.print("Type `help` for the list of commands.\n");
    }

    fn on_tick(&mut self, attempt: &TestAttempt) {
        let left = attempt.time_left();
        if left % 60 == 0 || left <= FINAL_COUNTDOWN {
            self.print(&format!("{}\n", render_clock(attempt)));
        }
    }

    fn on_show(&mut self, attempt: &TestAttempt, focus: Option<usize>) {
        let text = match focus.and_then(|n| render_question(attempt, n)) {
            Some(question) => format!("{}\n{}", render_clock(attempt), question),
            None => render_attempt(attempt),
        };
        self.print(&text);
    }

    fn on_draft(&mut self, attempt: &TestAttempt, number: usize) {
        if let Some(choice) = attempt
            .sheet()
            .id_at(number)
            .and_then(|id| attempt.sheet().draft(id))
        {
            self.print(&format!(
                "Question {}: {} selected. Type `submit {}` to send it.\n",
                number, choice, number
            ));
        }
    }

    fn on_answer_committed(&mut self, attempt: &TestAttempt, number: usize) {
        self.print(&format!("Answer for question {} saved.\n", number));
        self.print(&render_sidebar(attempt.sheet()));
    }

    fn on_submitted(&mut self, _attempt: &TestAttempt) {
        self.print("Test submitted successfully!\n");
    }

    fn on_alert(&mut self, message: &str) {
        let _ = writeln!(self.alerts, "! {}", message);
        let _ = self.alerts.flush();
    }
}
