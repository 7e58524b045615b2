// src/error.rs

use std::fmt;

/// Global Application Error Enum.
/// Every fallible operation of the client returns this type.
#[derive(Debug)]
pub enum AppError {
    // Transport failure: DNS, refused connection, timeout
    Network(String),

    // 401 Unauthorized, or a missing/expired local session
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 400 Bad Request, or an action rejected locally before any request
    BadRequest(String),

    // Any other non-success status from the server
    Server { status: u16, message: String },

    // The server answered with a payload that does not match its schema
    InvalidResponse(String),

    // Missing or malformed configuration
    Config(String),

    // The request was abandoned through its cancellation token
    Cancelled,

    InternalError(String),
}

impl AppError {
    /// Short text shown to the user in an alert.
    ///
    /// Local rejections carry their own wording; everything that went wrong
    /// on the wire collapses into a generic message, details go to the log.
    pub fn user_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::AuthError(_) => "Your session is no longer valid. Please sign in again.".to_string(),
            AppError::NotFound(_) => "The requested test could not be found.".to_string(),
            AppError::Config(msg) => format!("Configuration error: {}", msg),
            AppError::Cancelled => "The request was cancelled.".to_string(),
            _ => "An error occurred.".to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "network error: {}", msg),
            AppError::AuthError(msg) => write!(f, "unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            AppError::Server { status, message } => write!(f, "server error {}: {}", status, message),
            AppError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
            AppError::Config(msg) => write!(f, "config error: {}", msg),
            AppError::Cancelled => write!(f, "request cancelled"),
            AppError::InternalError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Transport errors from `reqwest`.
/// Decode failures are reported as an invalid response, not a network problem.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::InvalidResponse(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidResponse(err.to_string())
    }
}

/// Schema violations detected at the API boundary.
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}
