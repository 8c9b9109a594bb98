//! Extracted asset records and provenance.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The kinds of assets the pipeline tries to extract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Thumbnail,
    Frames,
    Metadata,
    Transcript,
}

impl AssetKind {
    /// All asset kinds, in manifest order.
    pub const ALL: &'static [AssetKind] = &[
        AssetKind::Thumbnail,
        AssetKind::Frames,
        AssetKind::Metadata,
        AssetKind::Transcript,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Thumbnail => "thumbnail",
            AssetKind::Frames => "frames",
            AssetKind::Metadata => "metadata",
            AssetKind::Transcript => "transcript",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which strategy produced a validated asset (provenance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// In-process decode of a locally supplied binary
    LocalFile,
    /// In-process decode of a fetched remote file
    DirectUrl,
    /// External transformation service (per-timestamp frame fetch)
    TransformService,
    /// Platform thumbnail/storyboard URL template probe
    PlatformThumbnail,
    /// Platform embed-metadata endpoint (or its generic fallback)
    Oembed,
    /// Local duration/dimension probe
    LocalProbe,
    /// Embedded caption track extraction
    EmbeddedCaptions,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::LocalFile => "local_file",
            StrategyKind::DirectUrl => "direct_url",
            StrategyKind::TransformService => "transform_service",
            StrategyKind::PlatformThumbnail => "platform_thumbnail",
            StrategyKind::Oembed => "oembed",
            StrategyKind::LocalProbe => "local_probe",
            StrategyKind::EmbeddedCaptions => "embedded_captions",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single validated image (thumbnail, sampled frame, or storyboard still).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImageAsset {
    /// Remote URL the image was validated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local path for captured frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Validated width in pixels
    pub width: u32,

    /// Validated height in pixels
    pub height: u32,

    /// Source timestamp in seconds, for sampled frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,

    /// True for storyboard stills, which never count as true frame sampling
    #[serde(default)]
    pub storyboard: bool,
}

impl ImageAsset {
    /// Image validated from a remote URL.
    pub fn from_url(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: Some(url.into()),
            path: None,
            width,
            height,
            timestamp: None,
            storyboard: false,
        }
    }

    /// Image captured to a local path.
    pub fn from_path(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            url: None,
            path: Some(path.into()),
            width,
            height,
            timestamp: None,
            storyboard: false,
        }
    }

    /// Attach the source timestamp.
    pub fn at_timestamp(mut self, seconds: f64) -> Self {
        self.timestamp = Some(seconds);
        self
    }

    /// Mark as a storyboard still.
    pub fn as_storyboard(mut self) -> Self {
        self.storyboard = true;
        self
    }
}

/// Video metadata payload. Absence of any field is tolerated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MetadataDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl MetadataDoc {
    /// True when no field at all was obtained.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.thumbnail_url.is_none()
            && self.duration_secs.is_none()
            && self.width.is_none()
            && self.height.is_none()
    }
}

/// Extracted caption/transcript text.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptDoc {
    /// Caption text, in the stated format
    pub text: String,

    /// Declared language, when the container records one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Caption text format (e.g. "webvtt")
    pub format: String,
}

/// Typed payload of an extracted asset.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum AssetData {
    Images(Vec<ImageAsset>),
    Metadata(MetadataDoc),
    Transcript(TranscriptDoc),
    Empty,
}

impl AssetData {
    pub fn is_empty(&self) -> bool {
        match self {
            AssetData::Images(images) => images.is_empty(),
            AssetData::Metadata(doc) => doc.is_empty(),
            AssetData::Transcript(doc) => doc.text.is_empty(),
            AssetData::Empty => true,
        }
    }
}

/// The outcome of one asset-kind extraction task.
///
/// `extracted == true` always implies `validated == true`: the only
/// constructor that sets `extracted` is [`ExtractedAsset::validated`], whose
/// inputs have already passed the asset validator gate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedAsset {
    /// Which asset kind this record is for
    pub kind: AssetKind,

    /// Whether a usable asset was obtained
    pub extracted: bool,

    /// Whether the asset passed validation (always equal to `extracted`)
    pub validated: bool,

    /// Strategy that produced the asset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<StrategyKind>,

    /// The asset payload
    pub data: AssetData,

    /// Number of items, for image sets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Achieved sample timestamps in seconds, for frames
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timestamps: Vec<f64>,
}

impl ExtractedAsset {
    /// Record a validated asset. Both flags are set together; callers must
    /// only pass data that went through the asset validator.
    pub fn validated(kind: AssetKind, source: StrategyKind, data: AssetData) -> Self {
        let count = match &data {
            AssetData::Images(images) => Some(images.len() as u32),
            _ => None,
        };
        Self {
            kind,
            extracted: true,
            validated: true,
            source: Some(source),
            data,
            count,
            timestamps: Vec::new(),
        }
    }

    /// Record an asset kind for which every strategy failed or was skipped.
    pub fn missing(kind: AssetKind) -> Self {
        Self {
            kind,
            extracted: false,
            validated: false,
            source: None,
            data: AssetData::Empty,
            count: None,
            timestamps: Vec::new(),
        }
    }

    /// Attach the achieved sample timestamps.
    pub fn with_timestamps(mut self, timestamps: Vec<f64>) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Consistency check for the extraction invariant.
    pub fn is_consistent(&self) -> bool {
        !self.extracted || self.validated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_sets_both_flags() {
        let asset = ExtractedAsset::validated(
            AssetKind::Thumbnail,
            StrategyKind::PlatformThumbnail,
            AssetData::Images(vec![ImageAsset::from_url("https://x/img.jpg", 640, 360)]),
        );
        assert!(asset.extracted);
        assert!(asset.validated);
        assert_eq!(asset.count, Some(1));
        assert!(asset.is_consistent());
    }

    #[test]
    fn test_missing_asset() {
        let asset = ExtractedAsset::missing(AssetKind::Frames);
        assert!(!asset.extracted);
        assert!(!asset.validated);
        assert!(asset.source.is_none());
        assert!(asset.data.is_empty());
        assert!(asset.is_consistent());
    }

    #[test]
    fn test_metadata_doc_emptiness() {
        assert!(MetadataDoc::default().is_empty());
        let doc = MetadataDoc {
            title: Some("Spot".to_string()),
            ..Default::default()
        };
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_image_asset_builders() {
        let frame = ImageAsset::from_path("/tmp/frame_3.jpg", 640, 360).at_timestamp(3.0);
        assert_eq!(frame.timestamp, Some(3.0));
        assert!(!frame.storyboard);

        let still = ImageAsset::from_url("https://img/1.jpg", 320, 180).as_storyboard();
        assert!(still.storyboard);
    }

    #[test]
    fn test_asset_data_serialization_tag() {
        let data = AssetData::Metadata(MetadataDoc::default());
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "metadata");
    }
}
