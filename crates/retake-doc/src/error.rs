//! Error types for snapshot operations.

use retake_types::{AlternativeId, BlockId, ErrorKind, InvariantViolation};
use thiserror::Error;

/// Errors that can occur while editing, projecting or decoding a snapshot.
#[derive(Error, Debug)]
pub enum DocError {
    /// Block not found in snapshot.
    #[error("block not found: {0}")]
    BlockNotFound(BlockId),

    /// Alternative not found in its block.
    #[error("alternative {alternative} not found in block {block}")]
    AlternativeNotFound {
        block: BlockId,
        alternative: AlternativeId,
    },

    /// A block update named an alternative belonging to another block (or none).
    #[error("alternative {alternative} does not belong to block {block}")]
    ForeignAlternative {
        block: BlockId,
        alternative: AlternativeId,
    },

    /// Move target outside `0..=len` of the sequence after removal.
    #[error("index {index} out of range for {len} remaining blocks")]
    IndexOutOfRange { index: i64, len: usize },

    /// Placement other than `before` / `after`.
    #[error("unknown placement: {0:?}")]
    UnknownPlacement(String),

    /// Persisted document carries a version tag this build cannot read.
    #[error("unknown snapshot schema version: {0:?}")]
    UnknownSchemaVersion(String),

    /// Persisted body failed to parse as the tagged version.
    #[error("corrupt snapshot body: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Stored document violates a structural invariant.
    #[error("snapshot invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    /// A block's current alternative could not be resolved during projection.
    #[error("block {block} points at missing alternative {current}")]
    DanglingCurrent {
        block: BlockId,
        current: AlternativeId,
    },
}

impl DocError {
    /// Caller-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocError::BlockNotFound(_) | DocError::AlternativeNotFound { .. } => {
                ErrorKind::NotFound
            }
            DocError::ForeignAlternative { .. }
            | DocError::IndexOutOfRange { .. }
            | DocError::UnknownPlacement(_) => ErrorKind::InvalidArgument,
            DocError::UnknownSchemaVersion(_)
            | DocError::Corrupt(_)
            | DocError::Invariant(_)
            | DocError::DanglingCurrent { .. } => ErrorKind::Fatal,
        }
    }
}
