// src/session.rs

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::SessionUser,
    utils::jwt::{is_expired, peek_claims},
};

/// On-disk layout written by the sign-in flow.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    #[validate(length(min = 1, message = "Access token must not be empty."))]
    access_token: String,
    #[validate(nested)]
    user: SessionUser,
}

/// Identity and credentials of the signed-in user.
///
/// Built once at startup and handed to every service that talks to the
/// server, so no call site reads the session store on its own.
#[derive(Debug, Clone)]
pub struct Session {
    user: SessionUser,
    token: String,
}

impl Session {
    pub fn new(user: SessionUser, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
        }
    }

    /// Loads and validates a session file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::AuthError(format!("No session at {}: {}. Sign in first.", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let file: SessionFile = serde_json::from_str(raw)
            .map_err(|e| AppError::AuthError(format!("Malformed session: {}", e)))?;
        file.validate()
            .map_err(|e| AppError::AuthError(format!("Malformed session: {}", e)))?;

        // Older clients stored the token JSON-encoded a second time.
        let token = file.access_token.trim_matches('"').to_string();

        Ok(Self::new(file.user, token))
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn bearer_token(&self) -> &str {
        &self.token
    }

    /// Rejects a token whose `exp` claim lies in the past.
    ///
    /// Tokens that are not JWTs are let through; the server decides.
    pub fn ensure_fresh(&self, now: i64) -> Result<(), AppError> {
        match peek_claims(&self.token) {
            Ok(claims) if is_expired(&claims, now) => {
                tracing::warn!("Access token for user {} has expired", self.user.id);
                Err(AppError::AuthError("Access token has expired".to_string()))
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::debug!("Skipping local token check: {}", e);
                Ok(())
            }
        }
    }
}
