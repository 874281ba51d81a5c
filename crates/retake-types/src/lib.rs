//! Shared identity and document types for retake.
//!
//! This crate is the leaf of the workspace: typed IDs, the project snapshot
//! document (blocks and their alternatives), project metadata, and the
//! invariant checker. It has **no internal retake dependencies**.
//!
//! # Entity-Relationship Overview
//!
//! ```text
//! Project (ProjectId) ← owned by a user (UserId)
//!     └── current ProjectSnapshot (one JSON document, versioned)
//!             └── Block (BlockId), ordered
//!                     ├── Alternative (AlternativeId), ordered, ≥ 1
//!                     │       └── Recording (optional, external media refs)
//!                     └── current_alternative_id → one of its Alternatives
//! ```
//!
//! # Key Types
//!
//! |-----------------------|----------------------------------------------|
//! | Type                  | Purpose                                      |
//! |-----------------------|----------------------------------------------|
//! | [`ProjectSnapshot`]   | Root aggregate: ordered blocks               |
//! | [`Block`]             | Content slot with competing alternatives     |
//! | [`Alternative`]       | One concrete version of a block's content    |
//! | [`Recording`]         | Metadata for externally stored media         |
//! | [`Project`]           | Project metadata row (owner, name, media)    |
//! | [`ErrorKind`]         | Error taxonomy shared by every crate         |
//! |-----------------------|----------------------------------------------|

pub mod block;
pub mod error;
pub mod ids;
pub mod project;
pub mod snapshot;

// Re-export primary types at crate root for convenience.
pub use block::{Alternative, Block, Codec, MediaFile, MediaUsage, Recording};
pub use error::ErrorKind;
pub use ids::{AlternativeId, BlockId, ProjectId, SnapshotId, UserId};
pub use project::{MediaType, Project};
pub use snapshot::{InvariantViolation, ProjectSnapshot, is_well_formed, validate};

/// Current time as Unix milliseconds. Used by constructors throughout the workspace.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
