//! Error types for the companion store

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures the store does not recover from locally.
///
/// Application-level failures reported by the backend (`code == 0` on a
/// proxy action) are not errors here: they are surfaced through the
/// notifier and the response is still returned.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("No async runtime attached to run background work")]
    NoRuntime,
}

impl StoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        StoreError::Transport(message.into())
    }
}
