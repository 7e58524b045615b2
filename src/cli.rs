// src/cli.rs

use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use regex::Regex;

use crate::{attempt::Command, error::AppError, models::test::Choice};

#[derive(Debug, Parser)]
#[command(name = "ezlearn-test", about = "Take EzLearn practice tests from the terminal")]
pub struct Cli {
    /// Session file written at sign-in (overrides EZLEARN_SESSION_FILE)
    #[arg(long, global = true, value_name = "PATH")]
    pub session: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the available tests
    List,
    /// Show your earlier attempts of a test
    History {
        test_id: String,
    },
    /// Start (or resume) a timed attempt
    Take {
        test_id: String,
        /// Skip the start confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the graded result of a finished attempt
    Result {
        test_result_id: String,
    },
}

/// One line typed during an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Run(Command),
    /// `finish`; the front-end asks for confirmation first.
    ConfirmFinish,
    Help,
}

pub const HELP: &str = "\
Commands:
  <n> <A-D>     select an answer for question n (e.g. `3 b`)
  submit <n>    send your selected answer for question n
  goto <n>      show question n
  show          show the whole test
  finish        submit the test
  quit          leave without submitting
  help          show this help";

static SELECT_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(?:pick\s+)?(\d+)\s*[.:]?\s*([a-d])$"));
static NUMBERED_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^(submit|answer|goto|go)\s+(\d+)$"));

/// Parses one line of interactive input.
pub fn parse_input(line: &str) -> Result<Input, AppError> {
    let line = line.trim();
    let lower = line.to_ascii_lowercase();

    match lower.as_str() {
        "show" | "s" => return Ok(Input::Run(Command::Show)),
        "finish" | "f" => return Ok(Input::ConfirmFinish),
        "quit" | "q" | "exit" => return Ok(Input::Run(Command::Quit)),
        "help" | "h" | "?" => return Ok(Input::Help),
        _ => {}
    }

    let select_re = regex(&SELECT_RE)?;
    if let Some(caps) = select_re.captures(&lower) {
        let number = parse_number(&caps[1])?;
        let choice = Choice::parse(&caps[2])
            .ok_or_else(|| AppError::BadRequest(format!("'{}' is not a valid choice.", &caps[2])))?;
        return Ok(Input::Run(Command::Select { number, choice }));
    }

    let numbered_re = regex(&NUMBERED_RE)?;
    if let Some(caps) = numbered_re.captures(&lower) {
        let number = parse_number(&caps[2])?;
        let command = match &caps[1] {
            "submit" | "answer" => Command::SubmitAnswer { number },
            _ => Command::Goto { number },
        };
        return Ok(Input::Run(command));
    }

    Err(AppError::BadRequest(format!("Unknown command '{}'. Type `help`.", line)))
}

/// Parses a y/N confirmation answer. Anything but yes means no.
pub fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn parse_number(raw: &str) -> Result<usize, AppError> {
    raw.parse::<usize>()
        .map_err(|_| AppError::BadRequest(format!("'{}' is not a question number.", raw)))
}

fn regex(cell: &'static LazyLock<Result<Regex, regex::Error>>) -> Result<&'static Regex, AppError> {
    cell.as_ref()
        .map_err(|e| AppError::InternalError(format!("Invalid command pattern: {}", e)))
}
