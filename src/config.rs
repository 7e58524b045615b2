// src/config.rs

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;
use url::Url;

use crate::error::AppError;

/// Interval between two countdown ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Every question offers exactly this many choices (A-D).
pub const CHOICES_PER_QUESTION: u8 = 4;

/// Buffer size of the command and event channels used by the attempt runner.
pub const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the test service, e.g. `https://api.ezlearn.vn/`.
    pub api_url: Url,
    /// JSON file holding the signed-in user and access token.
    pub session_file: PathBuf,
    pub request_timeout: Duration,
    pub rust_log: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let api_url = env::var("EZLEARN_API_URL")
            .map_err(|_| AppError::Config("EZLEARN_API_URL must be set".to_string()))?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| AppError::Config(format!("EZLEARN_API_URL is not a valid URL: {}", e)))?;

        let session_file = env::var("EZLEARN_SESSION_FILE")
            .unwrap_or_else(|_| "session.json".to_string())
            .into();

        let request_timeout = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                AppError::Config(format!("REQUEST_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            Err(_) => 15,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".to_string())
            .into();

        Ok(Self {
            api_url,
            session_file,
            request_timeout: Duration::from_secs(request_timeout),
            rust_log,
            log_dir,
        })
    }
}
