//! Error types for alert synchronization.

/// Top-level error type for feed polling, persistence, and scheduling.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// Remote feed request or response decoding failed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Seen-identity store could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A notification could not be rendered or posted.
    #[error("notify error: {0}")]
    Notify(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Trigger coordination error.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlertError {
    /// Returns `true` when a later attempt may succeed without intervention.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AlertError>;
