//! Snapshot mutation engine for retake.
//!
//! Everything here is a pure function over [`ProjectSnapshot`] values: the
//! engine edits, the projection layer summarizes, the codec reads and writes
//! the versioned persisted form, and the exporter renders descriptions as
//! text. None of it touches storage.
//!
//! # Example
//!
//! ```
//! use retake_doc::{Placement, add_block_around, create_new_snapshot, list_blocks, remove_block};
//!
//! let snap = create_new_snapshot();
//! let original = snap.blocks[0].id;
//!
//! let (snap, added) = add_block_around(&snap, original, Placement::After).unwrap();
//! let (snap, next) = remove_block(&snap, original).unwrap();
//!
//! assert_eq!(next, added);
//! assert_eq!(list_blocks(&snap).unwrap().len(), 1);
//! ```
//!
//! [`ProjectSnapshot`]: retake_types::ProjectSnapshot

pub mod codec;
pub mod engine;
mod error;
pub mod export;
pub mod projection;

pub use codec::{SchemaVersion, VersionedSnapshot, decode, encode};
pub use engine::{
    AlternativeUpdate, BlockUpdate, DEFAULT_ALTERNATIVE_NAME, DEFAULT_BLOCK_NAME, Placement,
    add_alternative, add_alternative_with_id, add_block_around, attach_recording,
    create_new_snapshot, move_block, remove_alternative, remove_block, set_block_disabled,
    update_alternative, update_block,
};
pub use error::DocError;
pub use export::{ExportScope, export_descriptions, export_file_name};
pub use projection::{
    AlternativeListItem, BlockListItem, NewBlockId, NewCurrentAlternativeId, list_alternatives,
    list_blocks,
};

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, DocError>;
