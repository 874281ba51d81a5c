//! Error types for the snapshot repository.

use retake_doc::DocError;
use retake_types::{ErrorKind, ProjectId};
use thiserror::Error;

/// Errors that can occur in repository operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No such project, or it belongs to someone else.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Project row exists but has no snapshot row.
    #[error("project {0} has no snapshot")]
    SnapshotNotFound(ProjectId),

    /// Identifier is not a canonical UUID.
    #[error("invalid {field}: {value:?} is not a canonical UUID")]
    InvalidId { field: &'static str, value: String },

    /// Field failed length or content validation.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Compare-and-swap write found a different `modified_at`.
    #[error("project {project} was modified concurrently (expected {expected}, found {actual})")]
    Conflict {
        project: ProjectId,
        expected: u64,
        actual: u64,
    },

    /// Engine, projection or codec failure, passed through unchanged.
    #[error(transparent)]
    Doc(#[from] DocError),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    #[error("failed to write config: {0}")]
    ConfigWrite(#[from] ron::Error),
}

impl StoreError {
    /// Caller-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::ProjectNotFound(_) | StoreError::SnapshotNotFound(_) => {
                ErrorKind::NotFound
            }
            StoreError::InvalidId { .. } | StoreError::InvalidField { .. } => {
                ErrorKind::InvalidArgument
            }
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Doc(e) => e.kind(),
            StoreError::Sqlite(_) | StoreError::Io(_) => ErrorKind::Storage,
            StoreError::ConfigParse(_) | StoreError::ConfigWrite(_) => ErrorKind::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retake_types::BlockId;

    #[test]
    fn test_kind_passes_through_doc_errors() {
        let err = StoreError::from(DocError::BlockNotFound(BlockId::new()));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = StoreError::from(DocError::UnknownSchemaVersion("V0".into()));
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_kind_mapping() {
        let project = ProjectId::new();
        assert_eq!(StoreError::ProjectNotFound(project).kind(), ErrorKind::NotFound);
        assert_eq!(
            StoreError::InvalidId {
                field: "block_id",
                value: "x".into()
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            StoreError::Conflict {
                project,
                expected: 1,
                actual: 2
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            StoreError::from(rusqlite::Error::QueryReturnedNoRows).kind(),
            ErrorKind::Storage
        );
    }
}
