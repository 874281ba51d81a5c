//! Read-only views over a snapshot, shaped for API responses.

use retake_types::{AlternativeId, BlockId, ProjectSnapshot};
use serde::{Deserialize, Serialize};

use crate::{DocError, Result};

/// One row of the block list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockListItem {
    pub id: BlockId,
    pub name: String,
    pub description: Option<String>,
    pub current_alternative_id: AlternativeId,
    pub current_alternative_name: String,
    /// Description of the current alternative.
    pub alternative_description: Option<String>,
    pub alternative_count: usize,
    pub disabled: bool,
}

/// One row of a block's alternative list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeListItem {
    pub id: AlternativeId,
    pub name: String,
}

/// Acknowledgement body for block insertion and removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlockId {
    pub new_block_id: BlockId,
}

/// Acknowledgement body for alternative insertion and removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCurrentAlternativeId {
    pub new_current_alternative_id: AlternativeId,
}

/// Summarize every block in order.
///
/// A block whose current alternative does not resolve is a consistency
/// failure, not something to skip.
pub fn list_blocks(snapshot: &ProjectSnapshot) -> Result<Vec<BlockListItem>> {
    snapshot
        .blocks
        .iter()
        .map(|block| {
            let current = block
                .current_alternative()
                .ok_or(DocError::DanglingCurrent {
                    block: block.id,
                    current: block.current_alternative_id,
                })?;
            Ok(BlockListItem {
                id: block.id,
                name: block.name.clone(),
                description: block.description.clone(),
                current_alternative_id: current.id,
                current_alternative_name: current.name.clone(),
                alternative_description: current.description.clone(),
                alternative_count: block.alternatives.len(),
                disabled: block.disabled,
            })
        })
        .collect()
}

/// Alternatives of one block, in order.
pub fn list_alternatives(
    snapshot: &ProjectSnapshot,
    block_id: BlockId,
) -> Result<Vec<AlternativeListItem>> {
    let block = snapshot
        .block(block_id)
        .ok_or(DocError::BlockNotFound(block_id))?;
    Ok(block
        .alternatives
        .iter()
        .map(|alt| AlternativeListItem {
            id: alt.id,
            name: alt.name.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        AlternativeUpdate, Placement, add_alternative_with_id, add_block_around,
        create_new_snapshot, update_alternative,
    };
    use retake_types::ErrorKind;

    #[test]
    fn test_list_blocks_reports_current_alternative() {
        let snap = create_new_snapshot();
        let block = snap.blocks[0].id;
        let (snap, alt) = add_alternative_with_id(&snap, block).unwrap();
        let snap = update_alternative(
            &snap,
            block,
            alt,
            &AlternativeUpdate {
                name: "Take 2".into(),
                description: Some("closer mic".into()),
            },
        )
        .unwrap();

        let items = list_blocks(&snap).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, block);
        assert_eq!(item.current_alternative_id, alt);
        assert_eq!(item.current_alternative_name, "Take 2");
        assert_eq!(item.alternative_description.as_deref(), Some("closer mic"));
        assert_eq!(item.alternative_count, 2);
    }

    #[test]
    fn test_list_blocks_preserves_order() {
        let snap = create_new_snapshot();
        let first = snap.blocks[0].id;
        let (snap, second) = add_block_around(&snap, first, Placement::Before).unwrap();

        let ids: Vec<_> = list_blocks(&snap).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_list_blocks_dangling_current_is_fatal() {
        let mut snap = create_new_snapshot();
        snap.blocks[0].current_alternative_id = AlternativeId::new();

        let err = list_blocks(&snap).unwrap_err();
        assert!(matches!(err, DocError::DanglingCurrent { .. }));
        assert_eq!(err.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_list_alternatives() {
        let snap = create_new_snapshot();
        let block = snap.blocks[0].id;
        let (snap, added) = add_alternative_with_id(&snap, block).unwrap();

        let items = list_alternatives(&snap, block).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, added);

        let err = list_alternatives(&snap, BlockId::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_ack_bodies_are_camel_case() {
        let id = BlockId::new();
        let json = serde_json::to_value(NewBlockId { new_block_id: id }).unwrap();
        assert_eq!(json, serde_json::json!({ "newBlockId": id }));

        let alt = AlternativeId::new();
        let json = serde_json::to_value(NewCurrentAlternativeId {
            new_current_alternative_id: alt,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "newCurrentAlternativeId": alt }));
    }
}
