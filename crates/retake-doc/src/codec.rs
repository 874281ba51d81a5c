//! Versioned persisted form of a snapshot.
//!
//! Each stored body carries a schema tag in a companion column. Reads dispatch
//! on the tag to the matching parser and validate the result; there is no
//! repair path, so an unknown tag, an unparsable body or a structurally
//! broken document is always an error.

use std::str::FromStr;

use retake_types::ProjectSnapshot;
use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::{DocError, Result};

/// Schema tag stored next to each snapshot body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
pub enum SchemaVersion {
    V1,
}

impl SchemaVersion {
    /// Version written by this build.
    pub const CURRENT: SchemaVersion = SchemaVersion::V1;

    /// Parse a stored tag. Tags are exact, not case-folded.
    pub fn parse(tag: &str) -> Result<Self> {
        <Self as FromStr>::from_str(tag).map_err(|_| DocError::UnknownSchemaVersion(tag.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "V1",
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded body, tagged by the schema it was read as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionedSnapshot {
    V1(ProjectSnapshot),
}

impl VersionedSnapshot {
    pub fn version(&self) -> SchemaVersion {
        match self {
            VersionedSnapshot::V1(_) => SchemaVersion::V1,
        }
    }

    /// Upgrade to the in-memory model.
    pub fn into_current(self) -> ProjectSnapshot {
        match self {
            VersionedSnapshot::V1(snapshot) => snapshot,
        }
    }
}

/// Serialize a snapshot for storage under [`SchemaVersion::CURRENT`].
///
/// Malformed snapshots are refused so nothing unreadable is ever written.
pub fn encode(snapshot: &ProjectSnapshot) -> Result<(SchemaVersion, String)> {
    snapshot.validate()?;
    let body = serde_json::to_string(snapshot)?;
    Ok((SchemaVersion::CURRENT, body))
}

/// Parse a stored body according to its tag, without validating invariants.
pub fn decode_versioned(tag: &str, body: &str) -> Result<VersionedSnapshot> {
    match SchemaVersion::parse(tag)? {
        SchemaVersion::V1 => Ok(VersionedSnapshot::V1(serde_json::from_str(body)?)),
    }
}

/// Parse and validate a stored body.
pub fn decode(tag: &str, body: &str) -> Result<ProjectSnapshot> {
    let snapshot = decode_versioned(tag, body)?.into_current();
    snapshot.validate()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Placement, add_block_around, create_new_snapshot};
    use retake_types::{ErrorKind, InvariantViolation};

    #[test]
    fn test_encode_decode_roundtrip() {
        let snap = create_new_snapshot();
        let first = snap.blocks[0].id;
        let (snap, _) = add_block_around(&snap, first, Placement::After).unwrap();

        let (version, body) = encode(&snap).unwrap();
        assert_eq!(version, SchemaVersion::V1);

        let back = decode(version.as_str(), &body).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_unknown_version_is_fatal() {
        let (_, body) = encode(&create_new_snapshot()).unwrap();
        for tag in ["V2", "v1", ""] {
            let err = decode(tag, &body).unwrap_err();
            assert!(matches!(err, DocError::UnknownSchemaVersion(_)), "{tag}");
            assert_eq!(err.kind(), ErrorKind::Fatal);
        }
    }

    #[test]
    fn test_unparsable_body_is_fatal() {
        let err = decode("V1", "{\"blocks\": 7}").unwrap_err();
        assert!(matches!(err, DocError::Corrupt(_)));
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let err = decode("V1", "{\"blocks\": []}").unwrap_err();
        assert!(matches!(
            err,
            DocError::Invariant(InvariantViolation::NoBlocks)
        ));
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_decode_versioned_skips_validation() {
        let versioned = decode_versioned("V1", "{\"blocks\": []}").unwrap();
        assert_eq!(versioned.version(), SchemaVersion::V1);
        assert!(versioned.into_current().is_empty());
    }

    #[test]
    fn test_encode_refuses_malformed() {
        let err = encode(&ProjectSnapshot::default()).unwrap_err();
        assert!(matches!(err, DocError::Invariant(_)));
    }
}
