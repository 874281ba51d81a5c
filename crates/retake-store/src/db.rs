//! SQLite persistence for projects and their snapshot documents.
//!
//! One row per project, one or more rows per project in `project_snapshots`.
//! The current snapshot is the row with the highest `seq`; older rows only
//! exist when history retention is on and are never read back by the engine.
//! Bodies are stored as JSON text with their schema tag alongside; decoding
//! happens above this layer.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult, Row, params};

use retake_types::{MediaType, Project, ProjectId, SnapshotId, UserId};

/// Database handle for project persistence.
pub struct ProjectDb {
    conn: Connection,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    media_type TEXT NOT NULL DEFAULT 'audio',
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id, created_at DESC);

-- Snapshot documents; highest seq per project is current
CREATE TABLE IF NOT EXISTS project_snapshots (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    project_id TEXT NOT NULL,
    modified_at INTEGER NOT NULL,
    name TEXT,
    is_autosave INTEGER NOT NULL DEFAULT 0,
    body TEXT NOT NULL,
    body_version TEXT NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_snapshots_project ON project_snapshots(project_id, seq DESC);
"#;

/// A stored snapshot row, body still encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotRow {
    pub id: SnapshotId,
    pub project_id: ProjectId,
    /// Last write (Unix millis).
    pub modified_at: u64,
    pub name: Option<String>,
    /// Written by an edit rather than at project creation.
    pub is_autosave: bool,
    pub body: String,
    pub body_version: String,
}

/// Parse a text column, surfacing bad text as a conversion error.
fn text_column<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> SqliteResult<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    parse(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_project(row: &Row<'_>) -> SqliteResult<Project> {
    let created_at: i64 = row.get(5)?;
    Ok(Project {
        id: text_column(row, 0, ProjectId::parse)?,
        owner: text_column(row, 1, UserId::parse)?,
        name: row.get(2)?,
        description: row.get(3)?,
        media_type: text_column(row, 4, |s| s.parse::<MediaType>())?,
        created_at: created_at as u64,
    })
}

fn row_to_snapshot(row: &Row<'_>) -> SqliteResult<SnapshotRow> {
    let modified_at: i64 = row.get(2)?;
    let is_autosave: i32 = row.get(4)?;
    Ok(SnapshotRow {
        id: text_column(row, 0, SnapshotId::parse)?,
        project_id: text_column(row, 1, ProjectId::parse)?,
        modified_at: modified_at as u64,
        name: row.get(3)?,
        is_autosave: is_autosave != 0,
        body: row.get(5)?,
        body_version: row.get(6)?,
    })
}

const PROJECT_COLUMNS: &str = "id, owner_id, name, description, media_type, created_at";
const SNAPSHOT_COLUMNS: &str = "id, project_id, modified_at, name, is_autosave, body, body_version";

impl ProjectDb {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Insert a project together with its first snapshot.
    pub fn insert_project(&self, project: &Project, initial: &SnapshotRow) -> SqliteResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO projects (id, owner_id, name, description, media_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project.id.to_string(),
                project.owner.to_string(),
                project.name,
                project.description,
                project.media_type.as_str(),
                project.created_at as i64,
            ],
        )?;
        insert_snapshot(&tx, initial)?;
        tx.commit()
    }

    /// Load a project by ID, regardless of owner.
    pub fn project(&self, id: ProjectId) -> SqliteResult<Option<Project>> {
        self.conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id.to_string()],
                row_to_project,
            )
            .optional()
    }

    /// All projects of an owner, newest first.
    pub fn list_projects(&self, owner: UserId) -> SqliteResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let projects = stmt
            .query_map(params![owner.to_string()], row_to_project)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(projects)
    }

    /// Replace name and description. Returns whether the project existed.
    pub fn update_project(
        &self,
        id: ProjectId,
        name: &str,
        description: Option<&str>,
    ) -> SqliteResult<bool> {
        let changed = self.conn.execute(
            "UPDATE projects SET name = ?2, description = ?3 WHERE id = ?1",
            params![id.to_string(), name, description],
        )?;
        Ok(changed > 0)
    }

    /// Delete a project and, by cascade, all its snapshots.
    pub fn delete_project(&self, id: ProjectId) -> SqliteResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// The most recently written snapshot of a project.
    pub fn current_snapshot(&self, project_id: ProjectId) -> SqliteResult<Option<SnapshotRow>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {SNAPSHOT_COLUMNS} FROM project_snapshots
                     WHERE project_id = ?1 ORDER BY seq DESC LIMIT 1"
                ),
                params![project_id.to_string()],
                row_to_snapshot,
            )
            .optional()
    }

    /// Replace the body of an existing snapshot row.
    ///
    /// With `expected_modified_at`, the row is only written if its stored
    /// timestamp still matches. Returns whether a row was written.
    pub fn overwrite_snapshot(
        &self,
        id: SnapshotId,
        expected_modified_at: Option<u64>,
        modified_at: u64,
        body: &str,
        body_version: &str,
    ) -> SqliteResult<bool> {
        let changed = self.conn.execute(
            "UPDATE project_snapshots
             SET modified_at = ?2, body = ?3, body_version = ?4, is_autosave = 1
             WHERE id = ?1 AND (?5 IS NULL OR modified_at = ?5)",
            params![
                id.to_string(),
                modified_at as i64,
                body,
                body_version,
                expected_modified_at.map(|t| t as i64),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Add a new current snapshot row, keeping older ones.
    ///
    /// With `expected_modified_at`, the row is only added if the current
    /// snapshot's timestamp still matches. Returns whether a row was added.
    pub fn append_snapshot(
        &self,
        row: &SnapshotRow,
        expected_modified_at: Option<u64>,
    ) -> SqliteResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        if let Some(expected) = expected_modified_at {
            let current: Option<i64> = tx
                .query_row(
                    "SELECT modified_at FROM project_snapshots
                     WHERE project_id = ?1 ORDER BY seq DESC LIMIT 1",
                    params![row.project_id.to_string()],
                    |r| r.get(0),
                )
                .optional()?;
            if current != Some(expected as i64) {
                return Ok(false);
            }
        }
        insert_snapshot(&tx, row)?;
        tx.commit()?;
        Ok(true)
    }

    /// Number of snapshot rows stored for a project.
    pub fn snapshot_count(&self, project_id: ProjectId) -> SqliteResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM project_snapshots WHERE project_id = ?1",
            params![project_id.to_string()],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    /// Raw body replacement, bypassing the codec (for tests).
    #[cfg(test)]
    pub(crate) fn set_snapshot_body(
        &self,
        id: SnapshotId,
        body: &str,
        body_version: &str,
    ) -> SqliteResult<()> {
        self.conn.execute(
            "UPDATE project_snapshots SET body = ?2, body_version = ?3 WHERE id = ?1",
            params![id.to_string(), body, body_version],
        )?;
        Ok(())
    }
}

fn insert_snapshot(tx: &rusqlite::Transaction<'_>, row: &SnapshotRow) -> SqliteResult<()> {
    tx.execute(
        "INSERT INTO project_snapshots
            (id, project_id, modified_at, name, is_autosave, body, body_version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            row.id.to_string(),
            row.project_id.to_string(),
            row.modified_at as i64,
            row.name,
            row.is_autosave as i32,
            row.body,
            row.body_version,
        ],
    )?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
