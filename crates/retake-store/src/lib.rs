//! Persistent snapshot repository for retake.
//!
//! Wraps the pure engine in `retake-doc` with storage: projects and their
//! snapshot documents live in SQLite, each edit is a load, mutate, persist
//! cycle under one lock, and ownership is checked on every call.
//!
//! ```text
//! request (project id, owner, params)
//!     │ parse ids, validate fields          input.rs
//!     ▼
//! SnapshotRepository ── owner check ──►  ProjectDb (SQLite)   db.rs
//!     │ decode current row                 retake_doc::decode
//!     ▼
//! engine fn (pure)                         retake_doc::engine
//!     │ encode, stamp modified_at
//!     ▼
//! overwrite current row, or append when keep_history is on
//! ```

pub mod config;
pub mod db;
mod error;
pub mod input;
pub mod repository;

pub use config::StoreConfig;
pub use db::{ProjectDb, SnapshotRow};
pub use error::StoreError;
pub use input::FieldLimits;
pub use repository::{DescriptionExport, SnapshotRepository, StoredSnapshot};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StoreError>;
