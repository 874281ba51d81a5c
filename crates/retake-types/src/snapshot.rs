//! The project snapshot document and its structural invariants.
//!
//! A snapshot is the whole arrangement of a project: an ordered sequence of
//! blocks. It is persisted as one JSON document and replaced wholesale on
//! every edit. A well-formed snapshot satisfies:
//!
//! - every block has at least one alternative
//! - every block's current alternative is one of its own alternatives
//! - there is at least one block
//! - block ids are unique in the snapshot, alternative ids unique in their block
//!
//! Order of blocks and of alternatives is significant and preserved.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::Block;
use crate::ids::{AlternativeId, BlockId};

/// Root aggregate: the ordered blocks of one project.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub blocks: Vec<Block>,
}

impl ProjectSnapshot {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Position of a block in the sequence.
    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    /// Look up a block by ID.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// First violated invariant, if any. See [`validate`].
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        validate(self)
    }

    pub fn is_well_formed(&self) -> bool {
        is_well_formed(self)
    }
}

/// A structural invariant a snapshot fails to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("snapshot has no blocks")]
    NoBlocks,

    #[error("block {0} has no alternatives")]
    EmptyBlock(BlockId),

    #[error("block {block} points at alternative {current} which it does not contain")]
    DanglingCurrent {
        block: BlockId,
        current: AlternativeId,
    },

    #[error("block id {0} appears more than once")]
    DuplicateBlock(BlockId),

    #[error("alternative id {alternative} appears more than once in block {block}")]
    DuplicateAlternative {
        block: BlockId,
        alternative: AlternativeId,
    },
}

/// Check a snapshot, returning the first violation found in sequence order.
pub fn validate(snapshot: &ProjectSnapshot) -> Result<(), InvariantViolation> {
    if snapshot.blocks.is_empty() {
        return Err(InvariantViolation::NoBlocks);
    }

    let mut seen_blocks = HashSet::with_capacity(snapshot.blocks.len());
    for block in &snapshot.blocks {
        if !seen_blocks.insert(block.id) {
            return Err(InvariantViolation::DuplicateBlock(block.id));
        }
        if block.alternatives.is_empty() {
            return Err(InvariantViolation::EmptyBlock(block.id));
        }

        let mut seen_alts = HashSet::with_capacity(block.alternatives.len());
        for alt in &block.alternatives {
            if !seen_alts.insert(alt.id) {
                return Err(InvariantViolation::DuplicateAlternative {
                    block: block.id,
                    alternative: alt.id,
                });
            }
        }

        if !seen_alts.contains(&block.current_alternative_id) {
            return Err(InvariantViolation::DanglingCurrent {
                block: block.id,
                current: block.current_alternative_id,
            });
        }
    }

    Ok(())
}

/// Whether every structural invariant holds.
pub fn is_well_formed(snapshot: &ProjectSnapshot) -> bool {
    validate(snapshot).is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Alternative;

    fn block(name: &str) -> Block {
        Block::new(
            BlockId::new(),
            name,
            Alternative::new(AlternativeId::new(), "take"),
        )
    }

    #[test]
    fn test_single_block_is_well_formed() {
        let snap = ProjectSnapshot::new(vec![block("a")]);
        assert!(snap.is_well_formed());
        assert_eq!(snap.validate(), Ok(()));
    }

    #[test]
    fn test_empty_snapshot_rejected() {
        let snap = ProjectSnapshot::default();
        assert_eq!(validate(&snap), Err(InvariantViolation::NoBlocks));
    }

    #[test]
    fn test_empty_block_rejected() {
        let mut b = block("a");
        b.alternatives.clear();
        let id = b.id;
        let snap = ProjectSnapshot::new(vec![b]);
        assert_eq!(validate(&snap), Err(InvariantViolation::EmptyBlock(id)));
    }

    #[test]
    fn test_dangling_current_rejected() {
        let mut b = block("a");
        let stray = AlternativeId::new();
        b.current_alternative_id = stray;
        let id = b.id;
        let snap = ProjectSnapshot::new(vec![b]);
        assert_eq!(
            validate(&snap),
            Err(InvariantViolation::DanglingCurrent {
                block: id,
                current: stray
            })
        );
    }

    #[test]
    fn test_duplicate_block_rejected() {
        let b = block("a");
        let id = b.id;
        let snap = ProjectSnapshot::new(vec![b.clone(), b]);
        assert_eq!(validate(&snap), Err(InvariantViolation::DuplicateBlock(id)));
    }

    #[test]
    fn test_duplicate_alternative_rejected() {
        let mut b = block("a");
        let dup = b.alternatives[0].clone();
        let alt_id = dup.id;
        b.alternatives.push(dup);
        let block_id = b.id;
        let snap = ProjectSnapshot::new(vec![b]);
        assert_eq!(
            validate(&snap),
            Err(InvariantViolation::DuplicateAlternative {
                block: block_id,
                alternative: alt_id
            })
        );
    }

    #[test]
    fn test_same_alternative_id_in_different_blocks_is_allowed() {
        let a = block("a");
        let mut b = block("b");
        b.alternatives[0].id = a.alternatives[0].id;
        b.current_alternative_id = a.alternatives[0].id;
        assert!(ProjectSnapshot::new(vec![a, b]).is_well_formed());
    }

    #[test]
    fn test_lookup_by_id() {
        let a = block("a");
        let b = block("b");
        let b_id = b.id;
        let snap = ProjectSnapshot::new(vec![a, b]);
        assert_eq!(snap.block_index(b_id), Some(1));
        assert_eq!(snap.block(b_id).map(|b| b.name.as_str()), Some("b"));
        assert_eq!(snap.block_index(BlockId::new()), None);
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let snap = ProjectSnapshot::new(vec![block("a"), block("b"), block("c")]);
        let json = serde_json::to_string(&snap).unwrap();
        let back: ProjectSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        assert!(back.is_well_formed());
    }
}
