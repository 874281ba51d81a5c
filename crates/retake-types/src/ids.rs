//! Typed identifiers for projects, snapshots, blocks, alternatives and users.
//!
//! All ID types wrap a random UUIDv4 drawn from the OS CSPRNG, so fresh IDs
//! never need a collision re-check against the document they are added to.
//! They serialize transparently as canonical hyphenated UUID text, which is
//! also the only form accepted at the repository boundary
//! (see [`ProjectId::parse_canonical`]). The `short()` form (first 8 hex
//! chars) is for logs and human-facing output, never for lookup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A project identifier.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(uuid::Uuid);

/// A snapshot row identifier (one per persisted document version).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(uuid::Uuid);

/// A block identifier, unique within its snapshot.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(uuid::Uuid);

/// An alternative identifier, unique within its block.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlternativeId(uuid::Uuid);

/// A user identifier (the project owner), issued by the auth collaborator.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(uuid::Uuid);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_typed_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Create a new random ID (UUIDv4).
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// First 8 hex characters. For human display only, not lookup.
            pub fn short(&self) -> String {
                self.0.as_simple().to_string()[..8].to_string()
            }

            /// The wrapped UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Parse any textual UUID form the `uuid` crate accepts
            /// (hyphenated, simple, braced, urn).
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }

            /// Parse only the canonical 8-4-4-4-12 hyphenated form.
            ///
            /// Returns `None` for anything else, including otherwise valid
            /// simple or braced forms.
            pub fn parse_canonical(s: &str) -> Option<Self> {
                if s.len() != 36 {
                    return None;
                }
                let uuid = uuid::Uuid::try_parse(s).ok()?;
                if uuid.hyphenated().to_string().eq_ignore_ascii_case(s) {
                    Some(Self(uuid))
                } else {
                    None
                }
            }

            /// A nil / zero ID, for sentinel values only.
            pub fn nil() -> Self {
                Self(uuid::Uuid::nil())
            }

            /// Check if this is the nil ID.
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $T {
            fn from(u: uuid::Uuid) -> Self {
                Self(u)
            }
        }

        impl From<$T> for uuid::Uuid {
            fn from(id: $T) -> uuid::Uuid {
                id.0
            }
        }

        impl FromStr for $T {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Full UUID with hyphens, same as the persisted form
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.short())
            }
        }
    };
}

impl_typed_id!(ProjectId, "ProjectId");
impl_typed_id!(SnapshotId, "SnapshotId");
impl_typed_id!(BlockId, "BlockId");
impl_typed_id!(AlternativeId, "AlternativeId");
impl_typed_id!(UserId, "UserId");

// ============================================================================
// Tests
// ============================================================================
