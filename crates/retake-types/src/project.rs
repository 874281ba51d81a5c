//! Project metadata.
//!
//! The project row lives next to the snapshot document, not inside it: the
//! document only carries blocks, the row carries ownership and display data.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::block::Codec;
use crate::ids::{ProjectId, UserId};

/// What a project records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MediaType {
    #[default]
    Audio,
    Video,
}

impl MediaType {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }

    /// Codec new recordings use by default.
    pub fn default_codec(&self) -> Codec {
        match self {
            MediaType::Audio => Codec::DefaultOpusV1,
            MediaType::Video => Codec::DefaultWebpV1,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A project: one owner, one current snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub owner: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub media_type: MediaType,
    /// Creation time (Unix millis).
    pub created_at: u64,
}

impl Project {
    pub fn new(owner: UserId, name: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id: ProjectId::new(),
            owner,
            name: name.into(),
            description: None,
            media_type,
            created_at: crate::now_millis(),
        }
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}
