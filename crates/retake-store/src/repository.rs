//! Snapshot repository: the read-modify-write cycle around the engine.
//!
//! Every write follows the same path: parse identifiers, check the caller
//! owns the project, load and decode the current snapshot, run one engine
//! function, encode and persist the result with a fresh `modified_at`. The
//! database lock is held for the whole cycle, so writes from one process are
//! serialized; across processes the last writer wins unless the caller uses
//! [`SnapshotRepository::mutate_if_unmodified`].
//!
//! A project owned by someone else is reported exactly like a missing one.

use std::path::Path;

use parking_lot::Mutex;

use retake_doc::{
    AlternativeListItem, AlternativeUpdate, BlockListItem, BlockUpdate, ExportScope, Placement,
    SchemaVersion,
};
use retake_types::{
    AlternativeId, BlockId, MediaType, Project, ProjectId, ProjectSnapshot, Recording, SnapshotId,
    UserId, now_millis,
};

use crate::config::StoreConfig;
use crate::db::{ProjectDb, SnapshotRow};
use crate::input::parse_id;
use crate::{Result, StoreError};

/// The current snapshot of a project with its row metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredSnapshot {
    pub id: SnapshotId,
    pub project_id: ProjectId,
    /// Last write (Unix millis). Pass to `mutate_if_unmodified`.
    pub modified_at: u64,
    pub version: SchemaVersion,
    pub snapshot: ProjectSnapshot,
}

/// A rendered description export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptionExport {
    pub file_name: String,
    pub body: String,
}

/// Owns the database connection and applies engine operations to stored projects.
pub struct SnapshotRepository {
    db: Mutex<ProjectDb>,
    config: StoreConfig,
}

fn parse_project_id(value: &str) -> Result<ProjectId> {
    parse_id("project_id", value, ProjectId::parse_canonical)
}

fn parse_block_id(value: &str) -> Result<BlockId> {
    parse_id("block_id", value, BlockId::parse_canonical)
}

fn parse_alternative_id(value: &str) -> Result<AlternativeId> {
    parse_id("alternative_id", value, AlternativeId::parse_canonical)
}

/// Strictly after `previous`, so every write is observable as a change.
fn next_timestamp(previous: u64) -> u64 {
    now_millis().max(previous.saturating_add(1))
}

impl SnapshotRepository {
    pub fn new(db: ProjectDb, config: StoreConfig) -> Self {
        Self {
            db: Mutex::new(db),
            config,
        }
    }

    /// Open the database named by the config, creating its directory.
    pub fn open(config: StoreConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = ProjectDb::open(&config.database_path)?;
        tracing::debug!(path = %config.database_path.display(), "opened project database");
        Ok(Self::new(db, config))
    }

    /// In-memory database with the given config (for testing).
    pub fn in_memory(config: StoreConfig) -> Result<Self> {
        Ok(Self::new(ProjectDb::in_memory()?, config))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn database_path(&self) -> &Path {
        &self.config.database_path
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Create a project with a fresh single-block snapshot.
    #[tracing::instrument(skip(self), name = "repo.create_project")]
    pub fn create_project(
        &self,
        owner: UserId,
        name: &str,
        media_type: MediaType,
    ) -> Result<Project> {
        let name = self.config.limits.project_name(name)?;
        let project = Project::new(owner, name, media_type);

        let snapshot = retake_doc::create_new_snapshot();
        let (version, body) = retake_doc::encode(&snapshot)?;
        let initial = SnapshotRow {
            id: SnapshotId::new(),
            project_id: project.id,
            modified_at: project.created_at,
            name: None,
            is_autosave: false,
            body,
            body_version: version.to_string(),
        };

        self.db.lock().insert_project(&project, &initial)?;
        tracing::info!(project = %project.id, "created project");
        Ok(project)
    }

    /// Projects of `owner`, newest first.
    #[tracing::instrument(skip(self), name = "repo.list_projects")]
    pub fn list_projects(&self, owner: UserId) -> Result<Vec<Project>> {
        Ok(self.db.lock().list_projects(owner)?)
    }

    #[tracing::instrument(skip(self), name = "repo.project_details")]
    pub fn project_details(&self, project_id: &str, owner: UserId) -> Result<Project> {
        let project_id = parse_project_id(project_id)?;
        owned_project(&self.db.lock(), project_id, owner)
    }

    /// Rename a project and replace its description.
    #[tracing::instrument(skip(self, description), name = "repo.update_project")]
    pub fn update_project(
        &self,
        project_id: &str,
        owner: UserId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project> {
        let project_id = parse_project_id(project_id)?;
        let name = self.config.limits.project_name(name)?;
        let description = self.config.limits.description(description)?;

        let db = self.db.lock();
        let project = owned_project(&db, project_id, owner)?;
        db.update_project(project_id, &name, description.as_deref())?;
        Ok(Project {
            name,
            description,
            ..project
        })
    }

    /// Delete a project and every snapshot row it has.
    #[tracing::instrument(skip(self), name = "repo.delete_project")]
    pub fn delete_project(&self, project_id: &str, owner: UserId) -> Result<()> {
        let project_id = parse_project_id(project_id)?;
        let db = self.db.lock();
        owned_project(&db, project_id, owner)?;
        db.delete_project(project_id)?;
        tracing::info!(project = %project_id, "deleted project");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[tracing::instrument(skip(self), name = "repo.read_snapshot")]
    pub fn read_snapshot(&self, project_id: &str, owner: UserId) -> Result<ProjectSnapshot> {
        self.read_stored(project_id, owner).map(|s| s.snapshot)
    }

    /// Current snapshot with its row id, timestamp and schema version.
    pub fn read_stored(&self, project_id: &str, owner: UserId) -> Result<StoredSnapshot> {
        let project_id = parse_project_id(project_id)?;
        let db = self.db.lock();
        owned_project(&db, project_id, owner)?;
        load_current(&db, project_id)
    }

    /// Number of stored snapshot rows (more than one only with history retention).
    pub fn snapshot_count(&self, project_id: &str, owner: UserId) -> Result<usize> {
        let project_id = parse_project_id(project_id)?;
        let db = self.db.lock();
        owned_project(&db, project_id, owner)?;
        Ok(db.snapshot_count(project_id)?)
    }

    #[tracing::instrument(skip(self), name = "repo.list_blocks")]
    pub fn list_blocks(&self, project_id: &str, owner: UserId) -> Result<Vec<BlockListItem>> {
        let snapshot = self.read_snapshot(project_id, owner)?;
        Ok(retake_doc::list_blocks(&snapshot)?)
    }

    #[tracing::instrument(skip(self), name = "repo.list_alternatives")]
    pub fn list_alternatives(
        &self,
        project_id: &str,
        owner: UserId,
        block_id: &str,
    ) -> Result<Vec<AlternativeListItem>> {
        let block_id = parse_block_id(block_id)?;
        let snapshot = self.read_snapshot(project_id, owner)?;
        Ok(retake_doc::list_alternatives(&snapshot, block_id)?)
    }

    /// Render block and alternative descriptions as a text file.
    #[tracing::instrument(skip(self), name = "repo.export")]
    pub fn export_descriptions(
        &self,
        project_id: &str,
        owner: UserId,
        scope: ExportScope,
    ) -> Result<DescriptionExport> {
        let project_id = parse_project_id(project_id)?;
        let db = self.db.lock();
        let project = owned_project(&db, project_id, owner)?;
        let stored = load_current(&db, project_id)?;
        Ok(DescriptionExport {
            file_name: retake_doc::export_file_name(&project.name, scope),
            body: retake_doc::export_descriptions(&stored.snapshot, scope),
        })
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Load, edit and persist the current snapshot. Last writer wins.
    ///
    /// `edit` returns the new snapshot and a value handed back to the caller.
    #[tracing::instrument(skip(self, edit), name = "repo.mutate")]
    pub fn mutate<T>(
        &self,
        project_id: &str,
        owner: UserId,
        edit: impl FnOnce(&ProjectSnapshot) -> retake_doc::Result<(ProjectSnapshot, T)>,
    ) -> Result<T> {
        let project_id = parse_project_id(project_id)?;
        self.apply(project_id, owner, None, edit)
    }

    /// Like [`mutate`](Self::mutate), but fails with `Conflict` when the
    /// stored `modified_at` is no longer `expected_modified_at`.
    #[tracing::instrument(skip(self, edit), name = "repo.mutate_if_unmodified")]
    pub fn mutate_if_unmodified<T>(
        &self,
        project_id: &str,
        owner: UserId,
        expected_modified_at: u64,
        edit: impl FnOnce(&ProjectSnapshot) -> retake_doc::Result<(ProjectSnapshot, T)>,
    ) -> Result<T> {
        let project_id = parse_project_id(project_id)?;
        self.apply(project_id, owner, Some(expected_modified_at), edit)
    }

    fn apply<T>(
        &self,
        project_id: ProjectId,
        owner: UserId,
        expected_modified_at: Option<u64>,
        edit: impl FnOnce(&ProjectSnapshot) -> retake_doc::Result<(ProjectSnapshot, T)>,
    ) -> Result<T> {
        let db = self.db.lock();
        owned_project(&db, project_id, owner)?;
        let stored = load_current(&db, project_id)?;

        if let Some(expected) = expected_modified_at {
            if stored.modified_at != expected {
                return Err(StoreError::Conflict {
                    project: project_id,
                    expected,
                    actual: stored.modified_at,
                });
            }
        }

        let (next, value) = edit(&stored.snapshot)?;
        self.persist(&db, &stored, &next, expected_modified_at)?;
        Ok(value)
    }

    fn persist(
        &self,
        db: &ProjectDb,
        stored: &StoredSnapshot,
        next: &ProjectSnapshot,
        guard: Option<u64>,
    ) -> Result<u64> {
        let (version, body) = retake_doc::encode(next)?;
        let modified_at = next_timestamp(stored.modified_at);

        let written = if self.config.keep_history {
            let row = SnapshotRow {
                id: SnapshotId::new(),
                project_id: stored.project_id,
                modified_at,
                name: None,
                is_autosave: true,
                body,
                body_version: version.to_string(),
            };
            db.append_snapshot(&row, guard)?
        } else {
            db.overwrite_snapshot(stored.id, guard, modified_at, &body, version.as_str())?
        };

        if !written {
            let actual = db
                .current_snapshot(stored.project_id)?
                .map(|row| row.modified_at)
                .unwrap_or_default();
            tracing::warn!(project = %stored.project_id, "snapshot changed during write");
            return Err(StoreError::Conflict {
                project: stored.project_id,
                expected: guard.unwrap_or(stored.modified_at),
                actual,
            });
        }

        tracing::debug!(project = %stored.project_id, modified_at, blocks = next.len(), "persisted snapshot");
        Ok(modified_at)
    }

    // ── Block operations ────────────────────────────────────────────────

    /// Insert a default block next to `anchor_block_id`. Returns its id.
    #[tracing::instrument(skip(self), name = "repo.add_block")]
    pub fn add_block(
        &self,
        project_id: &str,
        owner: UserId,
        anchor_block_id: &str,
        placement: &str,
    ) -> Result<BlockId> {
        let anchor = parse_block_id(anchor_block_id)?;
        let placement = Placement::parse(placement)?;
        self.mutate(project_id, owner, |snap| {
            retake_doc::add_block_around(snap, anchor, placement)
        })
    }

    /// Remove a block. Returns the block to select next.
    #[tracing::instrument(skip(self), name = "repo.remove_block")]
    pub fn remove_block(&self, project_id: &str, owner: UserId, block_id: &str) -> Result<BlockId> {
        let block_id = parse_block_id(block_id)?;
        self.mutate(project_id, owner, |snap| retake_doc::remove_block(snap, block_id))
    }

    #[tracing::instrument(skip(self), name = "repo.move_block")]
    pub fn move_block(
        &self,
        project_id: &str,
        owner: UserId,
        block_id: &str,
        new_index: i64,
    ) -> Result<()> {
        let block_id = parse_block_id(block_id)?;
        self.mutate(project_id, owner, |snap| {
            Ok((retake_doc::move_block(snap, block_id, new_index)?, ()))
        })
    }

    #[tracing::instrument(skip(self, description), name = "repo.update_block")]
    pub fn update_block(
        &self,
        project_id: &str,
        owner: UserId,
        block_id: &str,
        name: &str,
        description: Option<&str>,
        current_alternative_id: &str,
    ) -> Result<()> {
        let block_id = parse_block_id(block_id)?;
        let update = BlockUpdate {
            name: self.config.limits.name("block name", name)?,
            description: self.config.limits.description(description)?,
            current_alternative_id: parse_alternative_id(current_alternative_id)?,
        };
        self.mutate(project_id, owner, |snap| {
            Ok((retake_doc::update_block(snap, block_id, &update)?, ()))
        })
    }

    #[tracing::instrument(skip(self), name = "repo.set_block_disabled")]
    pub fn set_block_disabled(
        &self,
        project_id: &str,
        owner: UserId,
        block_id: &str,
        disabled: bool,
    ) -> Result<()> {
        let block_id = parse_block_id(block_id)?;
        self.mutate(project_id, owner, |snap| {
            Ok((retake_doc::set_block_disabled(snap, block_id, disabled)?, ()))
        })
    }

    // ── Alternative operations ──────────────────────────────────────────

    /// Append a default alternative and make it current. Returns its id.
    #[tracing::instrument(skip(self), name = "repo.add_alternative")]
    pub fn add_alternative(
        &self,
        project_id: &str,
        owner: UserId,
        block_id: &str,
    ) -> Result<AlternativeId> {
        let block_id = parse_block_id(block_id)?;
        self.mutate(project_id, owner, |snap| {
            retake_doc::add_alternative_with_id(snap, block_id)
        })
    }

    /// Remove an alternative. Returns the block's current alternative afterwards.
    #[tracing::instrument(skip(self), name = "repo.remove_alternative")]
    pub fn remove_alternative(
        &self,
        project_id: &str,
        owner: UserId,
        block_id: &str,
        alternative_id: &str,
    ) -> Result<AlternativeId> {
        let block_id = parse_block_id(block_id)?;
        let alternative_id = parse_alternative_id(alternative_id)?;
        self.mutate(project_id, owner, |snap| {
            retake_doc::remove_alternative(snap, block_id, alternative_id)
        })
    }

    #[tracing::instrument(skip(self, description), name = "repo.update_alternative")]
    pub fn update_alternative(
        &self,
        project_id: &str,
        owner: UserId,
        block_id: &str,
        alternative_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<()> {
        let block_id = parse_block_id(block_id)?;
        let alternative_id = parse_alternative_id(alternative_id)?;
        let update = AlternativeUpdate {
            name: self.config.limits.name("alternative name", name)?,
            description: self.config.limits.description(description)?,
        };
        self.mutate(project_id, owner, |snap| {
            Ok((
                retake_doc::update_alternative(snap, block_id, alternative_id, &update)?,
                (),
            ))
        })
    }

    /// Record where an alternative's media lives.
    #[tracing::instrument(skip(self, recording), name = "repo.attach_recording")]
    pub fn attach_recording(
        &self,
        project_id: &str,
        owner: UserId,
        block_id: &str,
        alternative_id: &str,
        recording: Recording,
    ) -> Result<()> {
        let block_id = parse_block_id(block_id)?;
        let alternative_id = parse_alternative_id(alternative_id)?;
        self.mutate(project_id, owner, |snap| {
            Ok((
                retake_doc::attach_recording(snap, block_id, alternative_id, recording)?,
                (),
            ))
        })
    }
}

/// The project, if it exists and `owner` owns it.
fn owned_project(db: &ProjectDb, project_id: ProjectId, owner: UserId) -> Result<Project> {
    match db.project(project_id)? {
        Some(project) if project.is_owned_by(owner) => Ok(project),
        Some(_) => {
            tracing::debug!(project = %project_id, ?owner, "ownership mismatch");
            Err(StoreError::ProjectNotFound(project_id))
        }
        None => Err(StoreError::ProjectNotFound(project_id)),
    }
}

fn load_current(db: &ProjectDb, project_id: ProjectId) -> Result<StoredSnapshot> {
    let row = db
        .current_snapshot(project_id)?
        .ok_or(StoreError::SnapshotNotFound(project_id))?;

    let snapshot = retake_doc::decode(&row.body_version, &row.body).map_err(|e| {
        tracing::error!(project = %project_id, snapshot = %row.id, error = %e, "stored snapshot is unreadable");
        e
    })?;

    Ok(StoredSnapshot {
        id: row.id,
        project_id,
        modified_at: row.modified_at,
        version: SchemaVersion::parse(&row.body_version)?,
        snapshot,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use retake_doc::{DEFAULT_BLOCK_NAME, DocError};
    use retake_types::{Codec, ErrorKind, MediaFile};

    fn repo() -> SnapshotRepository {
        SnapshotRepository::in_memory(StoreConfig::default()).unwrap()
    }

    fn history_repo() -> SnapshotRepository {
        SnapshotRepository::in_memory(StoreConfig {
            keep_history: true,
            ..StoreConfig::default()
        })
        .unwrap()
    }

    /// A project with its id as text and the sole block's id as text.
    fn setup(repo: &SnapshotRepository) -> (UserId, String, String) {
        let owner = UserId::new();
        let project = repo.create_project(owner, "demo", MediaType::Audio).unwrap();
        let pid = project.id.to_string();
        let block = repo.list_blocks(&pid, owner).unwrap()[0].id.to_string();
        (owner, pid, block)
    }

    // ── Projects ────────────────────────────────────────────────────────

    #[test]
    fn test_create_project_has_single_block() {
        let repo = repo();
        let (owner, pid, _) = setup(&repo);

        let snapshot = repo.read_snapshot(&pid, owner).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.blocks[0].name, DEFAULT_BLOCK_NAME);
        assert_eq!(snapshot.blocks[0].alternatives.len(), 1);
    }

    #[test]
    fn test_create_project_validates_name() {
        let repo = repo();
        let owner = UserId::new();

        let err = repo.create_project(owner, "  ", MediaType::Audio).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = repo
            .create_project(owner, &"x".repeat(33), MediaType::Video)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let project = repo.create_project(owner, "  trimmed ", MediaType::Video).unwrap();
        assert_eq!(project.name, "trimmed");
    }

    #[test]
    fn test_project_lifecycle() {
        let repo = repo();
        let (owner, pid, _) = setup(&repo);
        repo.create_project(owner, "second", MediaType::Video).unwrap();

        assert_eq!(repo.list_projects(owner).unwrap().len(), 2);
        assert!(repo.list_projects(UserId::new()).unwrap().is_empty());

        let updated = repo
            .update_project(&pid, owner, "renamed", Some("notes"))
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(repo.project_details(&pid, owner).unwrap(), updated);

        repo.delete_project(&pid, owner).unwrap();
        let err = repo.read_snapshot(&pid, owner).unwrap_err();
        assert!(matches!(err, StoreError::ProjectNotFound(_)));
        assert_eq!(repo.list_projects(owner).unwrap().len(), 1);
    }

    // ── Ownership and identifiers ───────────────────────────────────────

    #[test]
    fn test_other_owner_sees_not_found() {
        let repo = repo();
        let (_, pid, block) = setup(&repo);
        let stranger = UserId::new();

        let errors = vec![
            repo.read_snapshot(&pid, stranger).unwrap_err(),
            repo.project_details(&pid, stranger).unwrap_err(),
            repo.add_block(&pid, stranger, &block, "after").unwrap_err(),
            repo.delete_project(&pid, stranger).unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(err, StoreError::ProjectNotFound(_)), "{err:?}");
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn test_malformed_ids_rejected_before_engine() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);
        let before = repo.read_stored(&pid, owner).unwrap();

        let errors = vec![
            repo.read_snapshot("not-a-uuid", owner).unwrap_err(),
            repo.add_block(&pid, owner, "12345", "after").unwrap_err(),
            repo.remove_alternative(&pid, owner, &block, "x").unwrap_err(),
            repo.update_block(&pid, owner, &block, "n", None, "{bad}").unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(err, StoreError::InvalidId { .. }), "{err:?}");
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        // Nothing written
        assert_eq!(repo.read_stored(&pid, owner).unwrap(), before);
    }

    #[test]
    fn test_unknown_placement_rejected() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);
        let err = repo.add_block(&pid, owner, &block, "inside").unwrap_err();
        assert!(matches!(err, StoreError::Doc(DocError::UnknownPlacement(_))));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_missing_block_is_not_found() {
        let repo = repo();
        let (owner, pid, _) = setup(&repo);
        let missing = BlockId::new().to_string();

        let err = repo.remove_block(&pid, owner, &missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = repo.list_alternatives(&pid, owner, &missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_missing_alternative_is_not_found() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);
        let missing = AlternativeId::new().to_string();

        let err = repo
            .update_alternative(&pid, owner, &block, &missing, "n", None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = repo
            .attach_recording(&pid, owner, &block, &missing, Recording::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = repo.remove_alternative(&pid, owner, &block, &missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let alternatives = repo.list_alternatives(&pid, owner, &block).unwrap();
        assert_eq!(alternatives.len(), 1);
    }

    // ── Writes ──────────────────────────────────────────────────────────

    #[test]
    fn test_add_after_then_remove_original() {
        let repo = repo();
        let (owner, pid, original) = setup(&repo);

        let added = repo.add_block(&pid, owner, &original, "after").unwrap();
        let next = repo.remove_block(&pid, owner, &original).unwrap();

        assert_eq!(next, added);
        let blocks = repo.list_blocks(&pid, owner).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, added);
    }

    #[test]
    fn test_each_write_stamps_later_timestamp() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);

        let t0 = repo.read_stored(&pid, owner).unwrap().modified_at;
        repo.add_alternative(&pid, owner, &block).unwrap();
        let t1 = repo.read_stored(&pid, owner).unwrap().modified_at;
        repo.set_block_disabled(&pid, owner, &block, true).unwrap();
        let t2 = repo.read_stored(&pid, owner).unwrap().modified_at;

        assert!(t1 > t0);
        assert!(t2 > t1);
    }

    #[test]
    fn test_failed_edit_writes_nothing() {
        let repo = repo();
        let (owner, pid, _) = setup(&repo);
        let before = repo.read_stored(&pid, owner).unwrap();

        let err = repo
            .move_block(&pid, owner, &before.snapshot.blocks[0].id.to_string(), 5)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(repo.read_stored(&pid, owner).unwrap(), before);
    }

    #[test]
    fn test_alternative_round_trip() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);
        let first = repo.list_alternatives(&pid, owner, &block).unwrap()[0].id;

        let added = repo.add_alternative(&pid, owner, &block).unwrap();
        repo.update_alternative(
            &pid,
            owner,
            &block,
            &added.to_string(),
            "Take 2",
            Some("warmer"),
        )
        .unwrap();
        repo.attach_recording(
            &pid,
            owner,
            &block,
            &added.to_string(),
            Recording::single(MediaFile::master("t2.webm", Codec::DefaultOpusV1)),
        )
        .unwrap();

        let item = &repo.list_blocks(&pid, owner).unwrap()[0];
        assert_eq!(item.current_alternative_id, added);
        assert_eq!(item.current_alternative_name, "Take 2");
        assert_eq!(item.alternative_description.as_deref(), Some("warmer"));

        let current = repo
            .remove_alternative(&pid, owner, &block, &added.to_string())
            .unwrap();
        assert_eq!(current, first);
    }

    #[test]
    fn test_update_block_validates_fields() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);
        let alt = repo.list_alternatives(&pid, owner, &block).unwrap()[0]
            .id
            .to_string();

        let err = repo
            .update_block(&pid, owner, &block, "", None, &alt)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { .. }));

        let long = "d".repeat(1001);
        let err = repo
            .update_block(&pid, owner, &block, "ok", Some(&long), &alt)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        repo.update_block(&pid, owner, &block, "Intro", Some("hi"), &alt)
            .unwrap();
        let item = &repo.list_blocks(&pid, owner).unwrap()[0];
        assert_eq!(item.name, "Intro");
        assert_eq!(item.description.as_deref(), Some("hi"));
    }

    #[test]
    fn test_move_block() {
        let repo = repo();
        let (owner, pid, first) = setup(&repo);
        let second = repo.add_block(&pid, owner, &first, "after").unwrap();

        repo.move_block(&pid, owner, &second.to_string(), 0).unwrap();
        let ids: Vec<_> = repo
            .list_blocks(&pid, owner)
            .unwrap()
            .iter()
            .map(|b| b.id.to_string())
            .collect();
        assert_eq!(ids, vec![second.to_string(), first]);

        let err = repo
            .move_block(&pid, owner, &second.to_string(), -1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    // ── History and concurrency ─────────────────────────────────────────

    #[test]
    fn test_overwrite_keeps_one_row() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);
        repo.add_alternative(&pid, owner, &block).unwrap();
        repo.add_alternative(&pid, owner, &block).unwrap();
        assert_eq!(repo.snapshot_count(&pid, owner).unwrap(), 1);
    }

    #[test]
    fn test_history_appends_rows() {
        let repo = history_repo();
        let (owner, pid, block) = setup(&repo);
        let first_row = repo.read_stored(&pid, owner).unwrap().id;

        repo.add_alternative(&pid, owner, &block).unwrap();
        repo.add_alternative(&pid, owner, &block).unwrap();

        assert_eq!(repo.snapshot_count(&pid, owner).unwrap(), 3);
        let current = repo.read_stored(&pid, owner).unwrap();
        assert_ne!(current.id, first_row);
        assert_eq!(current.snapshot.blocks[0].alternatives.len(), 3);
    }

    #[test]
    fn test_compare_and_swap() {
        for repo in [repo(), history_repo()] {
            let (owner, pid, block) = setup(&repo);
            let block_id = BlockId::parse_canonical(&block).unwrap();
            let seen = repo.read_stored(&pid, owner).unwrap().modified_at;

            repo.mutate_if_unmodified(&pid, owner, seen, |snap| {
                retake_doc::add_alternative_with_id(snap, block_id)
            })
            .unwrap();

            // Second writer still holds the stale timestamp
            let err = repo
                .mutate_if_unmodified(&pid, owner, seen, |snap| {
                    retake_doc::add_alternative_with_id(snap, block_id)
                })
                .unwrap_err();
            assert!(matches!(err, StoreError::Conflict { expected, .. } if expected == seen));
            assert_eq!(err.kind(), ErrorKind::Conflict);

            let snapshot = repo.read_snapshot(&pid, owner).unwrap();
            assert_eq!(snapshot.blocks[0].alternatives.len(), 2);
        }
    }

    // ── Corrupt storage ─────────────────────────────────────────────────

    #[test]
    fn test_unknown_schema_version_is_fatal() {
        let repo = repo();
        let (owner, pid, _) = setup(&repo);
        let stored = repo.read_stored(&pid, owner).unwrap();
        let body = serde_json::to_string(&stored.snapshot).unwrap();
        repo.db.lock().set_snapshot_body(stored.id, &body, "V7").unwrap();

        let err = repo.read_snapshot(&pid, owner).unwrap_err();
        assert!(matches!(err, StoreError::Doc(DocError::UnknownSchemaVersion(_))));
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_corrupt_document_is_fatal_and_not_repaired() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);
        let stored = repo.read_stored(&pid, owner).unwrap();

        let mut broken = stored.snapshot.clone();
        broken.blocks[0].current_alternative_id = AlternativeId::new();
        let body = serde_json::to_string(&broken).unwrap();
        repo.db.lock().set_snapshot_body(stored.id, &body, "V1").unwrap();

        let err = repo.add_alternative(&pid, owner, &block).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fatal);
        let err = repo.list_blocks(&pid, owner).unwrap_err();
        assert!(matches!(err, StoreError::Doc(DocError::Invariant(_))));
    }

    // ── Export ──────────────────────────────────────────────────────────

    #[test]
    fn test_export_descriptions() {
        let repo = repo();
        let (owner, pid, block) = setup(&repo);
        let alt = repo.list_alternatives(&pid, owner, &block).unwrap()[0]
            .id
            .to_string();
        repo.update_alternative(&pid, owner, &block, &alt, "Take 1", Some("calm"))
            .unwrap();

        let export = repo
            .export_descriptions(&pid, owner, ExportScope::CurrentOnly)
            .unwrap();
        assert_eq!(export.file_name, "demo_current_descriptions.txt");
        assert!(export.body.starts_with("--- Block 1: New block ---\n"));
        assert!(export.body.contains("Current Alternative: Take 1\nDescription: calm\n"));
    }

    // ── File-backed ─────────────────────────────────────────────────────

    #[test]
    fn test_open_creates_database_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            database_path: dir.path().join("nested").join("retake.db"),
            ..StoreConfig::default()
        };

        let owner = UserId::new();
        let pid = {
            let repo = SnapshotRepository::open(config.clone()).unwrap();
            repo.create_project(owner, "disk", MediaType::Audio)
                .unwrap()
                .id
                .to_string()
        };

        let repo = SnapshotRepository::open(config).unwrap();
        assert_eq!(repo.list_blocks(&pid, owner).unwrap().len(), 1);
    }
}
