//! Snapshot mutation engine.
//!
//! Every operation borrows the current snapshot and returns a new one; the
//! input is never modified. Sequence edits build fresh vectors with
//! [`insert_at`] / [`without`] rather than splicing in place, so a caller can
//! keep the previous value around (for compare-and-swap, or to discard the
//! result on a failed persist).
//!
//! Outputs always satisfy the snapshot invariants (checked with
//! `debug_assert!` in debug builds). The engine never does I/O; the only
//! nondeterminism is fresh id generation and modification timestamps.

use std::str::FromStr;

use retake_types::{
    Alternative, AlternativeId, Block, BlockId, ProjectSnapshot, Recording, is_well_formed,
    now_millis,
};
use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::{DocError, Result};

/// Name given to blocks the engine creates.
pub const DEFAULT_BLOCK_NAME: &str = "New block";

/// Name given to alternatives the engine creates.
pub const DEFAULT_ALTERNATIVE_NAME: &str = "New alternative";

// ── Parameters ──────────────────────────────────────────────────────────────

/// Where a new block goes relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Placement {
    Before,
    After,
}

impl Placement {
    /// Parse a boundary string, rejecting anything but `before` / `after`.
    pub fn parse(s: &str) -> Result<Self> {
        <Self as FromStr>::from_str(s).map_err(|_| DocError::UnknownPlacement(s.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Before => "before",
            Placement::After => "after",
        }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Replacement metadata for a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub current_alternative_id: AlternativeId,
}

/// Replacement metadata for an alternative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ── Sequence helpers ────────────────────────────────────────────────────────

/// New vector with `item` inserted at `index` (`index <= items.len()`).
fn insert_at<T: Clone>(items: &[T], index: usize, item: T) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len() + 1);
    out.extend_from_slice(&items[..index]);
    out.push(item);
    out.extend_from_slice(&items[index..]);
    out
}

/// New vector without the element at `index` (`index < items.len()`).
fn without<T: Clone>(items: &[T], index: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len().saturating_sub(1));
    out.extend_from_slice(&items[..index]);
    out.extend_from_slice(&items[index + 1..]);
    out
}

/// New vector with the element at `index` replaced.
fn replaced<T: Clone>(items: &[T], index: usize, item: T) -> Vec<T> {
    let mut out = items.to_vec();
    out[index] = item;
    out
}

fn checked(snapshot: ProjectSnapshot) -> ProjectSnapshot {
    debug_assert!(
        is_well_formed(&snapshot),
        "engine produced malformed snapshot: {:?}",
        snapshot.validate()
    );
    snapshot
}

fn fresh_alternative() -> Alternative {
    Alternative::new(AlternativeId::new(), DEFAULT_ALTERNATIVE_NAME)
}

fn fresh_block() -> Block {
    Block::new(BlockId::new(), DEFAULT_BLOCK_NAME, fresh_alternative())
}

fn touch(alternative: &mut Alternative) {
    alternative.modified_at = now_millis().max(alternative.modified_at);
}

fn find_block(snapshot: &ProjectSnapshot, block_id: BlockId) -> Result<usize> {
    snapshot
        .block_index(block_id)
        .ok_or(DocError::BlockNotFound(block_id))
}

fn find_alternative(block: &Block, alternative_id: AlternativeId) -> Result<usize> {
    block
        .alternative_index(alternative_id)
        .ok_or(DocError::AlternativeNotFound {
            block: block.id,
            alternative: alternative_id,
        })
}

/// Snapshot with the block at `index` swapped for `block`.
fn with_block(snapshot: &ProjectSnapshot, index: usize, block: Block) -> ProjectSnapshot {
    ProjectSnapshot::new(replaced(&snapshot.blocks, index, block))
}

// ── Snapshot ────────────────────────────────────────────────────────────────

/// A fresh project document: one default block holding one default alternative.
pub fn create_new_snapshot() -> ProjectSnapshot {
    checked(ProjectSnapshot::new(vec![fresh_block()]))
}

// ── Blocks ──────────────────────────────────────────────────────────────────

/// Insert a fresh block before or after `anchor`. Returns the new block's id.
pub fn add_block_around(
    snapshot: &ProjectSnapshot,
    anchor: BlockId,
    placement: Placement,
) -> Result<(ProjectSnapshot, BlockId)> {
    let anchor_index = find_block(snapshot, anchor)?;
    let index = match placement {
        Placement::Before => anchor_index,
        Placement::After => anchor_index + 1,
    };

    let block = fresh_block();
    let new_id = block.id;
    let blocks = insert_at(&snapshot.blocks, index, block);
    Ok((checked(ProjectSnapshot::new(blocks)), new_id))
}

/// Remove a block and pick the block a UI should select next.
///
/// The next selection is the block just before the removed one, or the new
/// first block when the first was removed. Removing the last remaining block
/// leaves a fresh default block in its place.
pub fn remove_block(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
) -> Result<(ProjectSnapshot, BlockId)> {
    let index = find_block(snapshot, block_id)?;
    let mut blocks = without(&snapshot.blocks, index);

    if blocks.is_empty() {
        let block = fresh_block();
        tracing::debug!(removed = %block_id, replacement = %block.id, "removed last block, synthesized default");
        let next = block.id;
        blocks.push(block);
        return Ok((checked(ProjectSnapshot::new(blocks)), next));
    }

    let next = blocks[index.saturating_sub(1)].id;
    Ok((checked(ProjectSnapshot::new(blocks)), next))
}

/// Move a block to `new_index`, where the index refers to the sequence with
/// the block already taken out. `0..=len` (after removal) is accepted.
pub fn move_block(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
    new_index: i64,
) -> Result<ProjectSnapshot> {
    let index = find_block(snapshot, block_id)?;
    let remaining = without(&snapshot.blocks, index);

    let target = usize::try_from(new_index)
        .ok()
        .filter(|i| *i <= remaining.len())
        .ok_or(DocError::IndexOutOfRange {
            index: new_index,
            len: remaining.len(),
        })?;

    let block = snapshot.blocks[index].clone();
    Ok(checked(ProjectSnapshot::new(insert_at(
        &remaining, target, block,
    ))))
}

/// Replace a block's name, description and current alternative.
pub fn update_block(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
    update: &BlockUpdate,
) -> Result<ProjectSnapshot> {
    let index = find_block(snapshot, block_id)?;
    let old = &snapshot.blocks[index];

    if !old.has_alternative(update.current_alternative_id) {
        return Err(DocError::ForeignAlternative {
            block: block_id,
            alternative: update.current_alternative_id,
        });
    }

    let block = Block {
        name: update.name.clone(),
        description: update.description.clone(),
        current_alternative_id: update.current_alternative_id,
        ..old.clone()
    };
    Ok(checked(with_block(snapshot, index, block)))
}

/// Set or clear a block's `disabled` flag.
pub fn set_block_disabled(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
    disabled: bool,
) -> Result<ProjectSnapshot> {
    let index = find_block(snapshot, block_id)?;
    let block = Block {
        disabled,
        ..snapshot.blocks[index].clone()
    };
    Ok(checked(with_block(snapshot, index, block)))
}

// ── Alternatives ────────────────────────────────────────────────────────────

/// Append a fresh alternative to a block and make it current.
pub fn add_alternative(snapshot: &ProjectSnapshot, block_id: BlockId) -> Result<ProjectSnapshot> {
    add_alternative_with_id(snapshot, block_id).map(|(snapshot, _)| snapshot)
}

/// Like [`add_alternative`], also returning the new alternative's id.
pub fn add_alternative_with_id(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
) -> Result<(ProjectSnapshot, AlternativeId)> {
    let index = find_block(snapshot, block_id)?;
    let old = &snapshot.blocks[index];

    let alternative = fresh_alternative();
    let new_id = alternative.id;
    let alternatives = insert_at(&old.alternatives, old.alternatives.len(), alternative);

    let block = Block {
        alternatives,
        current_alternative_id: new_id,
        ..old.clone()
    };
    Ok((checked(with_block(snapshot, index, block)), new_id))
}

/// Remove an alternative. Returns the block's resulting current alternative.
///
/// Removing the current alternative at index `i` makes the one now at
/// `i - 1` current (or the new first one when `i == 0`). Removing the last
/// alternative leaves a fresh default alternative, which becomes current.
pub fn remove_alternative(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
    alternative_id: AlternativeId,
) -> Result<(ProjectSnapshot, AlternativeId)> {
    let index = find_block(snapshot, block_id)?;
    let old = &snapshot.blocks[index];
    let alt_index = find_alternative(old, alternative_id)?;

    let mut alternatives = without(&old.alternatives, alt_index);
    let current = if alternatives.is_empty() {
        let alternative = fresh_alternative();
        let id = alternative.id;
        alternatives.push(alternative);
        id
    } else if old.current_alternative_id == alternative_id {
        alternatives[alt_index.saturating_sub(1)].id
    } else {
        old.current_alternative_id
    };

    let block = Block {
        alternatives,
        current_alternative_id: current,
        ..old.clone()
    };
    Ok((checked(with_block(snapshot, index, block)), current))
}

/// Replace an alternative's name and description, refreshing its timestamp.
pub fn update_alternative(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
    alternative_id: AlternativeId,
    update: &AlternativeUpdate,
) -> Result<ProjectSnapshot> {
    edit_alternative(snapshot, block_id, alternative_id, |alt| {
        alt.name = update.name.clone();
        alt.description = update.description.clone();
    })
}

/// Set or replace the recording reference of an alternative.
pub fn attach_recording(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
    alternative_id: AlternativeId,
    recording: Recording,
) -> Result<ProjectSnapshot> {
    edit_alternative(snapshot, block_id, alternative_id, move |alt| {
        alt.recording = Some(recording);
    })
}

fn edit_alternative(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
    alternative_id: AlternativeId,
    edit: impl FnOnce(&mut Alternative),
) -> Result<ProjectSnapshot> {
    let index = find_block(snapshot, block_id)?;
    let old = &snapshot.blocks[index];
    let alt_index = find_alternative(old, alternative_id)?;

    let mut alternative = old.alternatives[alt_index].clone();
    edit(&mut alternative);
    touch(&mut alternative);

    let block = Block {
        alternatives: replaced(&old.alternatives, alt_index, alternative),
        ..old.clone()
    };
    Ok(checked(with_block(snapshot, index, block)))
}

// ============================================================================
// Tests
// ============================================================================
