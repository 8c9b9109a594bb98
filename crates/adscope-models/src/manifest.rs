//! The extraction manifest: tier classification, limitations, and the
//! frozen per-request record handed to downstream consumers.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::asset::{AssetKind, ExtractedAsset};
use crate::source::RequestId;

/// Message shown when nothing could be extracted and the user must upload.
pub const UPLOAD_PROMPT: &str = "We couldn't extract anything from this link. \
Upload the video file directly to get a full analysis.";

/// Discrete classification of overall extraction quality.
///
/// Monotonic in asset quality: tier 1 is best, tier 4 means nothing was
/// validated and analysis must be blocked upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ExtractionTier {
    /// Frames and metadata both validated
    #[serde(rename = "tier_1_full")]
    Tier1Full,

    /// Thumbnail and metadata validated, frames not validated
    #[serde(rename = "tier_2_partial")]
    Tier2Partial,

    /// Only metadata (or transcript text) validated
    #[serde(rename = "tier_3_metadata_only")]
    Tier3MetadataOnly,

    /// No asset validated; user action required
    #[serde(rename = "tier_4_nothing")]
    Tier4Nothing,
}

impl ExtractionTier {
    /// All tiers, best first.
    pub const ALL: &'static [ExtractionTier] = &[
        ExtractionTier::Tier1Full,
        ExtractionTier::Tier2Partial,
        ExtractionTier::Tier3MetadataOnly,
        ExtractionTier::Tier4Nothing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionTier::Tier1Full => "tier_1_full",
            ExtractionTier::Tier2Partial => "tier_2_partial",
            ExtractionTier::Tier3MetadataOnly => "tier_3_metadata_only",
            ExtractionTier::Tier4Nothing => "tier_4_nothing",
        }
    }

    /// Quality rank, 1 = best.
    pub fn rank(&self) -> u8 {
        match self {
            ExtractionTier::Tier1Full => 1,
            ExtractionTier::Tier2Partial => 2,
            ExtractionTier::Tier3MetadataOnly => 3,
            ExtractionTier::Tier4Nothing => 4,
        }
    }

    /// Classify the settled asset set. Pure and synchronous; runs only
    /// after the join barrier.
    ///
    /// Two cases fall outside the literal tier definitions and are mapped
    /// to the closest one that keeps tier 4 meaning "nothing validated":
    /// visual assets without metadata classify as partial, and a
    /// transcript-only result classifies as text-only evidence.
    pub fn classify(validated: &[AssetKind]) -> Self {
        let has = |kind: AssetKind| validated.contains(&kind);

        if has(AssetKind::Frames) && has(AssetKind::Metadata) {
            ExtractionTier::Tier1Full
        } else if has(AssetKind::Thumbnail) && has(AssetKind::Metadata) {
            ExtractionTier::Tier2Partial
        } else if has(AssetKind::Metadata) {
            ExtractionTier::Tier3MetadataOnly
        } else if has(AssetKind::Frames) || has(AssetKind::Thumbnail) {
            ExtractionTier::Tier2Partial
        } else if has(AssetKind::Transcript) {
            ExtractionTier::Tier3MetadataOnly
        } else {
            ExtractionTier::Tier4Nothing
        }
    }

    /// Overall confidence implied by the tier.
    pub fn confidence(&self) -> ConfidenceLevel {
        match self {
            ExtractionTier::Tier1Full => ConfidenceLevel::High,
            ExtractionTier::Tier2Partial => ConfidenceLevel::Medium,
            ExtractionTier::Tier3MetadataOnly => ConfidenceLevel::Low,
            ExtractionTier::Tier4Nothing => ConfidenceLevel::None,
        }
    }
}

impl fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tier_1_full" => Ok(ExtractionTier::Tier1Full),
            "tier_2_partial" => Ok(ExtractionTier::Tier2Partial),
            "tier_3_metadata_only" => Ok(ExtractionTier::Tier3MetadataOnly),
            "tier_4_nothing" => Ok(ExtractionTier::Tier4Nothing),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown extraction tier: {0}")]
pub struct TierParseError(String);

/// Trust level derived from which asset kinds were validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    None,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::None => "none",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category of a non-fatal degradation recorded during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LimitationKind {
    DecodeFailed,
    CorsBlocked,
    LoadFailed,
    RemoteFetchBlocked,
    MetadataUnavailable,
    ValidationTimeout,
    FramesDegraded,
    TranscriptUnavailable,
}

impl LimitationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitationKind::DecodeFailed => "decode_failed",
            LimitationKind::CorsBlocked => "cors_blocked",
            LimitationKind::LoadFailed => "load_failed",
            LimitationKind::RemoteFetchBlocked => "remote_fetch_blocked",
            LimitationKind::MetadataUnavailable => "metadata_unavailable",
            LimitationKind::ValidationTimeout => "validation_timeout",
            LimitationKind::FramesDegraded => "frames_degraded",
            LimitationKind::TranscriptUnavailable => "transcript_unavailable",
        }
    }
}

impl fmt::Display for LimitationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured, human-readable degradation note.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Limitation {
    /// What degraded
    pub kind: LimitationKind,

    /// What the degradation means for analysis quality
    pub impact: String,

    /// What the user can do about it
    pub recommendation: String,

    /// True when uploading the source file directly would lift the limitation
    #[serde(default)]
    pub suggest_upload: bool,
}

impl Limitation {
    /// Create a limitation note.
    pub fn new(
        kind: LimitationKind,
        impact: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            impact: impact.into(),
            recommendation: recommendation.into(),
            suggest_upload: false,
        }
    }

    /// Mark that a direct upload would lift this limitation.
    pub fn with_upload_suggestion(mut self) -> Self {
        self.suggest_upload = true;
        self
    }
}

/// The finalized, immutable record of extraction outcomes for one request.
///
/// Built once after the join barrier and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionManifest {
    /// Extraction request this manifest belongs to
    pub request_id: RequestId,

    /// Overall extraction quality tier
    pub tier: ExtractionTier,

    /// Overall confidence implied by the tier
    pub confidence: ConfidenceLevel,

    /// Per-kind extraction outcomes. Empty at tier 4.
    pub assets: BTreeMap<AssetKind, ExtractedAsset>,

    /// Non-fatal degradations recorded along the way
    pub limitations: Vec<Limitation>,

    /// True only at tier 4: the user must supply new input
    pub user_action_required: bool,

    /// Upload prompt shown at tier 4
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,

    /// When the manifest was finalized
    pub created_at: DateTime<Utc>,
}

impl ExtractionManifest {
    /// Assemble the manifest from settled per-kind outcomes.
    ///
    /// Tier classification is a pure function of which kinds ended
    /// validated. At tier 4 the asset map is cleared and the upload prompt
    /// is set.
    pub fn build(
        request_id: RequestId,
        assets: BTreeMap<AssetKind, ExtractedAsset>,
        limitations: Vec<Limitation>,
    ) -> Self {
        debug_assert!(assets.values().all(ExtractedAsset::is_consistent));

        let validated: Vec<AssetKind> = assets
            .iter()
            .filter(|(_, asset)| asset.validated)
            .map(|(kind, _)| *kind)
            .collect();
        let tier = ExtractionTier::classify(&validated);

        let nothing = tier == ExtractionTier::Tier4Nothing;
        Self {
            request_id,
            tier,
            confidence: tier.confidence(),
            assets: if nothing { BTreeMap::new() } else { assets },
            limitations,
            user_action_required: nothing,
            user_message: nothing.then(|| UPLOAD_PROMPT.to_string()),
            created_at: Utc::now(),
        }
    }

    /// Whether the given kind ended with a validated asset.
    pub fn has_validated(&self, kind: AssetKind) -> bool {
        self.assets.get(&kind).is_some_and(|a| a.validated)
    }

    /// Kinds that ended with a validated asset.
    pub fn validated_kinds(&self) -> Vec<AssetKind> {
        self.assets
            .iter()
            .filter(|(_, asset)| asset.validated)
            .map(|(kind, _)| *kind)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetData, StrategyKind};

    fn validated(kind: AssetKind) -> ExtractedAsset {
        ExtractedAsset::validated(kind, StrategyKind::LocalFile, AssetData::Empty)
    }

    #[test]
    fn test_tier_classification() {
        use AssetKind::*;

        assert_eq!(
            ExtractionTier::classify(&[Frames, Metadata, Thumbnail]),
            ExtractionTier::Tier1Full
        );
        assert_eq!(
            ExtractionTier::classify(&[Thumbnail, Metadata]),
            ExtractionTier::Tier2Partial
        );
        assert_eq!(
            ExtractionTier::classify(&[Metadata]),
            ExtractionTier::Tier3MetadataOnly
        );
        assert_eq!(ExtractionTier::classify(&[]), ExtractionTier::Tier4Nothing);

        // Visual-only and transcript-only edge cases never land on tier 4
        assert_eq!(
            ExtractionTier::classify(&[Frames]),
            ExtractionTier::Tier2Partial
        );
        assert_eq!(
            ExtractionTier::classify(&[Transcript]),
            ExtractionTier::Tier3MetadataOnly
        );
    }

    #[test]
    fn test_tier_ordering() {
        let ranks: Vec<u8> = ExtractionTier::ALL.iter().map(|t| t.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_tier_parse_roundtrip() {
        for tier in ExtractionTier::ALL {
            assert_eq!(tier.as_str().parse::<ExtractionTier>().unwrap(), *tier);
        }
        assert!("tier_5".parse::<ExtractionTier>().is_err());
    }

    #[test]
    fn test_manifest_tier4_invariant() {
        let mut assets = BTreeMap::new();
        assets.insert(AssetKind::Frames, ExtractedAsset::missing(AssetKind::Frames));
        assets.insert(
            AssetKind::Metadata,
            ExtractedAsset::missing(AssetKind::Metadata),
        );

        let manifest = ExtractionManifest::build(RequestId::new(), assets, Vec::new());
        assert_eq!(manifest.tier, ExtractionTier::Tier4Nothing);
        assert!(manifest.user_action_required);
        assert!(manifest.assets.is_empty());
        assert!(manifest.user_message.as_deref().is_some_and(|m| !m.is_empty()));
        assert_eq!(manifest.confidence, ConfidenceLevel::None);
    }

    #[test]
    fn test_manifest_full_tier() {
        let mut assets = BTreeMap::new();
        assets.insert(AssetKind::Frames, validated(AssetKind::Frames));
        assets.insert(AssetKind::Metadata, validated(AssetKind::Metadata));

        let manifest = ExtractionManifest::build(RequestId::new(), assets, Vec::new());
        assert_eq!(manifest.tier, ExtractionTier::Tier1Full);
        assert!(!manifest.user_action_required);
        assert!(manifest.user_message.is_none());
        assert!(manifest.has_validated(AssetKind::Frames));
        assert!(!manifest.has_validated(AssetKind::Thumbnail));
    }

    #[test]
    fn test_tier_serde_names() {
        let json = serde_json::to_string(&ExtractionTier::Tier2Partial).unwrap();
        assert_eq!(json, "\"tier_2_partial\"");
    }
}
