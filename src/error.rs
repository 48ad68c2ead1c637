use thiserror::Error;

/// Custom error type for Relarc operations.
#[derive(Debug, Error)]
pub enum RelarcError {
    /// Event source fetch failed (transport, decode, or collaborator fault).
    #[error("Source error: {0}")]
    Source(String),

    /// Session store operation failed.
    #[error("Store error: {0}")]
    Store(String),

    /// The session store rejected a write for capacity reasons.
    #[error("Store quota exceeded while writing '{key}'")]
    StoreQuota { key: String },

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for RelarcError {
    fn from(err: serde_json::Error) -> Self {
        RelarcError::Store(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for RelarcError {
    fn from(err: std::io::Error) -> Self {
        RelarcError::Source(format!("I/O error: {}", err))
    }
}
