//! Error types for the tracker library.

use thiserror::Error;

/// Errors that can occur during a tracker run.
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is absent or blank.
    #[error("Configuration error: {0} is not set")]
    MissingSetting(&'static str),

    /// A setting is present but unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provider answered with a non-success status.
    #[error("{service} API error: status={status} body={body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Access token could not be obtained.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Table encoding error.
    #[error("Table error: {0}")]
    Table(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors that abort at startup, before any network call.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::MissingSetting(_) | Error::Config(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
