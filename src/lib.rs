// src/lib.rs

pub mod api;
pub mod attempt;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod result;
pub mod session;
pub mod terminal;
pub mod utils;

// Re-export specific items for convenience if needed
pub use api::{HttpTestApi, TestApi};
pub use error::AppError;
pub use session::Session;
