//! Error types
//!
//! Every failure the serving path can produce is one `ServeError` value. The
//! variant is the tag; status code and public message are derived from it.

use hyper::StatusCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure category, used for logging and by callers that only care
/// about the class of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRange,
    ReadError,
    BadRequest,
    InternalError,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("No files requested.")]
    EmptyCombo,

    #[error("Mixing content-types in combo request.")]
    MixedContentTypes,

    #[error("Range not satisfiable for {size} bytes")]
    BadRange { size: u64 },

    #[error("Error reading file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ServeError>;

impl ServeError {
    pub fn not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::NotFound(path.as_ref().display().to_string())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::EmptyCombo | Self::MixedContentTypes => ErrorKind::NotFound,
            Self::BadRange { .. } => ErrorKind::BadRange,
            Self::Read { .. } => ErrorKind::ReadError,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRange => StatusCode::RANGE_NOT_SATISFIABLE,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::ReadError | ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text safe to show to a client.
    ///
    /// Combo validation failures carry their own message; everything else
    /// uses the canonical reason phrase so storage paths never leak.
    pub fn public_message(&self) -> String {
        match self {
            Self::EmptyCombo | Self::MixedContentTypes => self.to_string(),
            _ => self
                .status()
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
        }
    }
}
