// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Platform roles as issued by the sign-in endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
    Teacher,
}

/// The signed-in user, as stored next to the access token.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionUser {
    #[serde(rename = "_id")]
    #[validate(length(min = 1, message = "User id must not be empty."))]
    pub id: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub role: Option<Role>,
}
