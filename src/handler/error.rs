//! Per-request error types.

use hyper::StatusCode;
use std::io;
use thiserror::Error;

/// Why a request could not be answered with content.
///
/// Every variant maps onto an HTTP status; none of them reaches the listener.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Nothing exists at the requested path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The path resolves outside the root directory.
    #[error("Path escapes root directory: {0}")]
    OutsideRoot(String),

    /// The filesystem refused access.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Directory without a default document while listings are disabled.
    #[error("Directory listing disabled: {0}")]
    ListingDisabled(String),

    /// Any other I/O failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ServeError {
    /// Classify an I/O error raised while resolving or reading `path`
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
                Self::NotFound(path.to_string())
            }
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            _ => Self::Io {
                path: path.to_string(),
                source: err,
            },
        }
    }

    /// HTTP status answered for this error
    ///
    /// Escapes from the root look like missing files, so probing reveals nothing
    /// about the tree above it.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::OutsideRoot(_) => StatusCode::NOT_FOUND,
            Self::PermissionDenied(_) | Self::ListingDisabled(_) => StatusCode::FORBIDDEN,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
