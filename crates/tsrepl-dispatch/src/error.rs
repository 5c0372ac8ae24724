use std::path::PathBuf;

use thiserror::Error;
use tsrepl_session::SessionError;

/// Errors from dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Nothing but whitespace or an opening bracket before the cursor.
    #[error("no expression before point")]
    NoExpression,
    #[error("cannot derive a module name from {}", .0.display())]
    InvalidFileName(PathBuf),
    #[error("cannot resolve {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },
}
