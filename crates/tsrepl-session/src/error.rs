use thiserror::Error;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session has been started, or its buffer is gone.
    #[error("no interpreter session; start one first")]
    NoSession,
    #[error("interpreter spawn failed: {0}")]
    Spawn(String),
    #[error("interpreter I/O error: {0}")]
    Io(#[from] std::io::Error),
}
