//! Per-dimension confidence and evidence mapping.
//!
//! Each analysis dimension the downstream scorer produces is structurally
//! tied to the asset kinds it can actually be measured from. This module
//! derives a confidence level per dimension from the finalized manifest,
//! records which validated assets back it, and reads the scorer's output
//! against a strict schema (one canonical field name plus a fixed,
//! enumerated alias list) so a score is never silently fabricated.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::asset::{AssetData, AssetKind};
use crate::manifest::{ConfidenceLevel, ExtractionManifest};

/// An analysis dimension scored by the external content analyzer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDimension {
    /// Strength of the opening seconds
    Hook,
    /// Cut frequency and visual energy
    Pacing,
    /// Whether the ad works with sound off
    SoundOffEffectiveness,
    /// Clarity of the call to action
    CtaClarity,
    /// Brand visibility
    BrandPresence,
    /// Caption readability and coverage
    CaptionQuality,
}

impl AnalysisDimension {
    /// All dimensions, in report order.
    pub const ALL: &'static [AnalysisDimension] = &[
        AnalysisDimension::Hook,
        AnalysisDimension::Pacing,
        AnalysisDimension::SoundOffEffectiveness,
        AnalysisDimension::CtaClarity,
        AnalysisDimension::BrandPresence,
        AnalysisDimension::CaptionQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisDimension::Hook => "hook",
            AnalysisDimension::Pacing => "pacing",
            AnalysisDimension::SoundOffEffectiveness => "sound_off_effectiveness",
            AnalysisDimension::CtaClarity => "cta_clarity",
            AnalysisDimension::BrandPresence => "brand_presence",
            AnalysisDimension::CaptionQuality => "caption_quality",
        }
    }

    /// Asset kinds this dimension structurally depends on.
    pub fn required_assets(&self) -> &'static [AssetKind] {
        match self {
            AnalysisDimension::Hook => &[AssetKind::Frames],
            AnalysisDimension::Pacing => &[AssetKind::Frames],
            AnalysisDimension::SoundOffEffectiveness => {
                &[AssetKind::Frames, AssetKind::Transcript]
            }
            AnalysisDimension::CtaClarity => &[AssetKind::Frames, AssetKind::Metadata],
            AnalysisDimension::BrandPresence => &[AssetKind::Thumbnail],
            AnalysisDimension::CaptionQuality => &[AssetKind::Transcript],
        }
    }

    /// Score field names accepted when reading analyzer output: the
    /// canonical name first, then legacy aliases in fixed priority order.
    pub fn score_aliases(&self) -> &'static [&'static str] {
        match self {
            AnalysisDimension::Hook => &["hook", "hook_strength", "hookScore", "opening_hook"],
            AnalysisDimension::Pacing => &["pacing", "pace", "pacing_energy", "energy"],
            AnalysisDimension::SoundOffEffectiveness => &[
                "sound_off_effectiveness",
                "soundOffEffectiveness",
                "sound_off",
                "mute_effectiveness",
            ],
            AnalysisDimension::CtaClarity => {
                &["cta_clarity", "ctaClarity", "call_to_action", "cta"]
            }
            AnalysisDimension::BrandPresence => &["brand_presence", "brandPresence", "branding"],
            AnalysisDimension::CaptionQuality => {
                &["caption_quality", "captionQuality", "captions", "readability"]
            }
        }
    }

    /// Read this dimension's score from an analyzer output object.
    ///
    /// Aliases are tried in priority order; values may be numbers or
    /// numeric strings. Anything else reads as absent.
    pub fn read_score(&self, output: &serde_json::Value) -> Option<f64> {
        let object = output.as_object()?;
        for alias in self.score_aliases() {
            if let Some(value) = object.get(*alias) {
                if let Some(score) = coerce_score(value) {
                    return Some(score);
                }
            }
        }
        None
    }
}

impl fmt::Display for AnalysisDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnalysisDimension {
    type Err = DimensionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisDimension::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s.to_lowercase())
            .ok_or_else(|| DimensionParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown analysis dimension: {0}")]
pub struct DimensionParseError(String);

fn coerce_score(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A validated asset backing a dimension's score.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceSource {
    /// Asset kind that backs the score
    #[serde(rename = "type")]
    pub kind: AssetKind,

    /// Human-readable provenance detail
    pub detail: String,
}

/// Trust annotation for one analysis dimension.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScoreEvidence {
    /// Confidence derived from which required kinds were validated
    pub confidence: ConfidenceLevel,

    /// Validated assets the score rests on
    pub evidence_sources: Vec<EvidenceSource>,

    /// True when the score rests on no obtained data (or the analyzer
    /// returned none) and must be rendered as inferred, not measured
    pub is_inferred: bool,

    /// The score as read from analyzer output, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Derive per-dimension evidence from a finalized manifest and the
/// analyzer's raw output.
///
/// Confidence per dimension:
/// - `high` only if every required kind is validated
/// - `medium` if frames are covered only by a validated thumbnail
///   (degraded strategy) and everything else required is validated
/// - `low` otherwise
///
/// A dimension with no validated required kind, or with no readable score,
/// is `is_inferred = true`.
pub fn map_evidence(
    manifest: &ExtractionManifest,
    analyzer_output: &serde_json::Value,
) -> BTreeMap<AnalysisDimension, ScoreEvidence> {
    AnalysisDimension::ALL
        .iter()
        .map(|&dimension| {
            let evidence = evidence_for(manifest, dimension, analyzer_output);
            (dimension, evidence)
        })
        .collect()
}

fn evidence_for(
    manifest: &ExtractionManifest,
    dimension: AnalysisDimension,
    analyzer_output: &serde_json::Value,
) -> ScoreEvidence {
    let required = dimension.required_assets();
    let validated: Vec<AssetKind> = required
        .iter()
        .copied()
        .filter(|&kind| manifest.has_validated(kind))
        .collect();

    let frames_degraded = required.contains(&AssetKind::Frames)
        && !manifest.has_validated(AssetKind::Frames)
        && manifest.has_validated(AssetKind::Thumbnail);

    let covered = |kind: AssetKind| {
        manifest.has_validated(kind) || (kind == AssetKind::Frames && frames_degraded)
    };

    let confidence = if required.iter().all(|&k| manifest.has_validated(k)) {
        ConfidenceLevel::High
    } else if frames_degraded && required.iter().all(|&k| covered(k)) {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    let mut sources: Vec<EvidenceSource> = validated
        .iter()
        .map(|&kind| EvidenceSource {
            kind,
            detail: describe_asset(manifest, kind),
        })
        .collect();
    if frames_degraded {
        sources.push(EvidenceSource {
            kind: AssetKind::Thumbnail,
            detail: "thumbnail standing in for frame sampling".to_string(),
        });
    }

    let score = dimension.read_score(analyzer_output);
    let is_inferred = (validated.is_empty() && !frames_degraded) || score.is_none();

    ScoreEvidence {
        confidence,
        evidence_sources: sources,
        is_inferred,
        score,
    }
}

fn describe_asset(manifest: &ExtractionManifest, kind: AssetKind) -> String {
    let Some(asset) = manifest.assets.get(&kind) else {
        return kind.to_string();
    };
    let via = asset
        .source
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    match (&asset.data, asset.count) {
        (AssetData::Images(_), Some(count)) => format!("{} {} via {}", count, kind, via),
        _ => format!("{} via {}", kind, via),
    }
}
