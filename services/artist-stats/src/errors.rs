//!
//! src/errors.rs  Andrew Belles  Oct 19th, 2026
//!
//! Defines enums and methods of error conversion
//! for errors the catalog client and analyzer surface
//!
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("config error: {0}")]
    Config(String),
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("empty input: {0}")]
    EmptyInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl StatsError {
    /// Process exit status reported for this error at the entry point
    pub fn exit_code(&self) -> u8 {
        match self {
            StatsError::Config(_) => 1,
            StatsError::NotFound(_) => 2,
            StatsError::RemoteUnavailable(_)
                | StatsError::RateLimited(_)
                | StatsError::Parse(_) => 3,
            StatsError::EmptyInput(_) => 4,
            StatsError::InvalidInput(_) | StatsError::Io(_) => 5,
        }
    }

    /// True for every failure that originates at the remote service
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            StatsError::RemoteUnavailable(_)
                | StatsError::RateLimited(_)
                | StatsError::Parse(_)
        )
    }
}

impl From<reqwest::Error> for StatsError {
    fn from(e: reqwest::Error) -> Self { StatsError::RemoteUnavailable(e.to_string()) }
}

impl From<serde_json::Error> for StatsError {
    fn from(e: serde_json::Error) -> Self { StatsError::Parse(e.to_string()) }
}
