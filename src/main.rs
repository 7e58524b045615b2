// src/main.rs

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use ezlearn_test::{
    AppError, HttpTestApi, Session, TestApi,
    attempt::{AttemptRunner, Command, Outcome, open_attempt},
    cli::{Cli, CliCommand, HELP, Input, is_yes, parse_input},
    config::{CHANNEL_CAPACITY, Config},
    models::test_result::TestHistoryRequest,
    render::{render_catalogue, render_history, render_result},
    result::load_result,
    terminal::TerminalView,
    utils::cancel::CancelToken,
};
use tokio::sync::mpsc;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file (if present)
    dotenv().ok();

    let cli = Cli::parse();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("! {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "ezlearn-test.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    // The terminal is shared with the test view, so only warnings reach it.
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(env_filter);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("! {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<(), AppError> {
    let session_path = cli.session.unwrap_or(config.session_file.clone());
    let session = Session::load(&session_path)?;
    let api = Arc::new(HttpTestApi::new(
        config.api_url.clone(),
        session,
        config.request_timeout,
    )?);
    let cancel = CancelToken::new();

    match cli.command {
        CliCommand::List => {
            let tests = api.list_tests(&cancel).await?;
            print!("{}", render_catalogue(&tests));
        }
        CliCommand::History { test_id } => {
            let request = TestHistoryRequest {
                test_id,
                user_id: api.session().user_id().to_string(),
            };
            let entries = api.test_history(&request, &cancel).await?;
            print!("{}", render_history(&entries));
        }
        CliCommand::Take { test_id, yes } => take(api, &test_id, yes).await?,
        CliCommand::Result { test_result_id } => {
            let view = load_result(&*api, &test_result_id, &cancel).await?;
            print!("{}", render_result(&view));
        }
    }
    Ok(())
}

/// Runs an attempt in the terminal, then shows its result.
async fn take(api: Arc<HttpTestApi>, test_id: &str, yes: bool) -> Result<(), AppError> {
    if !yes {
        println!("Start test {} now? The timer starts immediately. [y/N]", test_id);
        let answer = tokio::task::spawn_blocking(read_line)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))??;
        if !is_yes(&answer) {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let cancel = CancelToken::new();
    let attempt = open_attempt(&*api, api.session(), test_id, &cancel).await?;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    // Interactive stdin gets its own thread; it dies with the process.
    std::thread::spawn(move || read_commands(tx));

    let dyn_api: Arc<dyn TestApi> = api.clone();
    let runner = AttemptRunner::new(dyn_api, attempt, cancel.clone());
    let mut view = TerminalView::new(std::io::stdout(), std::io::stderr());
    let (outcome, _) = runner.run(rx, &mut view).await;

    match outcome {
        Outcome::Submitted { test_result_id } => {
            let view = load_result(&*api, &test_result_id, &CancelToken::new()).await?;
            print!("{}", render_result(&view));
        }
        Outcome::Abandoned => {
            println!("You left the test. Run `take {}` again to resume while time remains.", test_id);
        }
    }
    Ok(())
}

fn read_line() -> Result<String, AppError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

/// Reads interactive commands until stdin closes or the runner goes away.
fn read_commands(tx: mpsc::Sender<Command>) {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    while let Some(Ok(line)) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_input(&line) {
            Ok(Input::Run(command)) => command,
            Ok(Input::Help) => {
                println!("{}", HELP);
                continue;
            }
            Ok(Input::ConfirmFinish) => {
                println!("End the test before the time is up? [y/N]");
                match lines.next() {
                    Some(Ok(answer)) if is_yes(&answer) => Command::Finish,
                    Some(Ok(_)) => continue,
                    _ => break,
                }
            }
            Err(e) => {
                eprintln!("! {}", e.user_message());
                continue;
            }
        };
        if tx.blocking_send(command).is_err() {
            break;
        }
    }
}
