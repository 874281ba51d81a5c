//! Error taxonomy shared by every retake crate.
//!
//! Each crate keeps its own `thiserror` enum; `kind()` on those enums maps
//! every variant onto one of these categories so an outer layer (HTTP, CLI)
//! can pick a status without matching on crate-specific variants.

use serde::{Deserialize, Serialize};

/// Category of a failure, as seen by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input: bad identifier syntax, out-of-range index, unknown
    /// placement, field length violations.
    InvalidArgument,
    /// Input was well-formed but nothing matches (or the caller does not own it).
    NotFound,
    /// Caller is not allowed. Produced by the auth collaborator, never by this core.
    Unauthorized,
    /// A compare-and-swap write lost against a concurrent writer.
    Conflict,
    /// A stored document violates its invariants or cannot be decoded.
    Fatal,
    /// The storage layer failed (I/O, SQLite).
    Storage,
}

impl ErrorKind {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Fatal => "fatal",
            ErrorKind::Storage => "storage",
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidArgument
                | ErrorKind::NotFound
                | ErrorKind::Unauthorized
                | ErrorKind::Conflict
        )
    }

    /// Whether this is a server-side fault.
    pub fn is_server_fault(&self) -> bool {
        !self.is_caller_error()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
