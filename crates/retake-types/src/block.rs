//! Blocks, alternatives and recording references.
//!
//! A [`Block`] is an ordered content slot. It owns a non-empty, ordered list
//! of competing [`Alternative`]s and names exactly one of them as current.
//! Alternatives are never shared between blocks and never outlive removal
//! from their block.
//!
//! Field names on the wire follow the V1 persisted document (`disable`,
//! `currentAltId`, `modifiedAt`), so documents written by earlier deployments
//! decode unchanged.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::ids::{AlternativeId, BlockId};

/// One concrete version of a block's content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub id: AlternativeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Last modification (Unix millis).
    pub modified_at: u64,
    /// Reference to externally stored media, once something was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<Recording>,
}

impl Alternative {
    /// Create an alternative with no description and no recording.
    pub fn new(id: AlternativeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            modified_at: crate::now_millis(),
            recording: None,
        }
    }

    /// Whether media has been recorded for this alternative.
    pub fn has_recording(&self) -> bool {
        self.recording.is_some()
    }
}

/// A named content slot holding competing alternatives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled blocks stay in the sequence but are skipped on playback.
    #[serde(rename = "disable", default)]
    pub disabled: bool,
    /// Ordered, never empty.
    pub alternatives: Vec<Alternative>,
    /// Always one of `alternatives`.
    #[serde(rename = "currentAltId")]
    pub current_alternative_id: AlternativeId,
}

impl Block {
    /// Create a block whose only alternative is `alternative`, which becomes current.
    pub fn new(id: BlockId, name: impl Into<String>, alternative: Alternative) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            disabled: false,
            current_alternative_id: alternative.id,
            alternatives: vec![alternative],
        }
    }

    /// Position of an alternative within this block.
    pub fn alternative_index(&self, id: AlternativeId) -> Option<usize> {
        self.alternatives.iter().position(|a| a.id == id)
    }

    /// Look up an alternative by ID.
    pub fn alternative(&self, id: AlternativeId) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.id == id)
    }

    /// Check if an alternative belongs to this block.
    pub fn has_alternative(&self, id: AlternativeId) -> bool {
        self.alternative_index(id).is_some()
    }

    /// The alternative `current_alternative_id` points at.
    ///
    /// `None` only for a corrupt block; every engine output resolves.
    pub fn current_alternative(&self) -> Option<&Alternative> {
        self.alternative(self.current_alternative_id)
    }

    /// Number of alternatives.
    pub fn alternative_count(&self) -> usize {
        self.alternatives.len()
    }
}

/// Metadata for externally stored media attached to an alternative.
///
/// The media bytes live elsewhere (object storage, on-device cache); this
/// only records what exists and how to interpret it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub exports: Vec<MediaFile>,
}

impl Recording {
    /// A recording with a single master file.
    pub fn single(file: MediaFile) -> Self {
        Self {
            exports: vec![file],
        }
    }

    /// The captured original, if present.
    pub fn master(&self) -> Option<&MediaFile> {
        self.exports.iter().find(|f| f.usage == MediaUsage::Master)
    }

    /// Longest estimated duration across all exports.
    pub fn estimated_duration_millis(&self) -> Option<u64> {
        self.exports
            .iter()
            .filter_map(|f| f.estimated_duration_millis)
            .max()
    }
}

/// One exported media file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_millis: Option<u64>,
    pub codec: Codec,
    #[serde(default)]
    pub usage: MediaUsage,
}

impl MediaFile {
    /// A master file with the given codec and no duration estimate.
    pub fn master(filename: impl Into<String>, codec: Codec) -> Self {
        Self {
            filename: filename.into(),
            estimated_duration_millis: None,
            codec,
            usage: MediaUsage::Master,
        }
    }

    pub fn with_duration(mut self, millis: u64) -> Self {
        self.estimated_duration_millis = Some(millis);
        self
    }
}

/// Media encoding of an exported file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Codec {
    /// Opus in WebM, the default for audio projects.
    #[serde(rename = "opus_v1")]
    #[strum(serialize = "opus_v1", serialize = "opus")]
    DefaultOpusV1,
    /// WebP frames, the default for video projects.
    #[serde(rename = "webp_v1")]
    #[strum(serialize = "webp_v1", serialize = "webp")]
    DefaultWebpV1,
}

impl Codec {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::DefaultOpusV1 => "opus_v1",
            Codec::DefaultWebpV1 => "webp_v1",
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an exported file is for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum MediaUsage {
    /// The captured original.
    #[default]
    Master,
    /// A derived, lighter export for scrubbing and previews.
    Preview,
}

impl MediaUsage {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaUsage::Master => "master",
            MediaUsage::Preview => "preview",
        }
    }
}

impl std::fmt::Display for MediaUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
