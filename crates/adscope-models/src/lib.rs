//! Shared data models for the AdScope extraction pipeline.
//!
//! This crate holds everything that is pure data or pure logic:
//! - Source classification types ([`VideoSource`], [`Platform`])
//! - Asset records and provenance ([`ExtractedAsset`], [`StrategyKind`])
//! - The extraction manifest and tier classification ([`ExtractionManifest`])
//! - The frame sampling plan ([`sampling`])
//! - Per-dimension confidence and evidence mapping ([`evidence`])
//!
//! No I/O happens here; the extraction strategies live in `adscope-extract`.

pub mod asset;
pub mod evidence;
pub mod manifest;
pub mod platform;
pub mod sampling;
pub mod source;

pub use asset::{
    AssetData, AssetKind, ExtractedAsset, ImageAsset, MetadataDoc, StrategyKind, TranscriptDoc,
};
pub use evidence::{map_evidence, AnalysisDimension, EvidenceSource, ScoreEvidence};
pub use manifest::{
    ConfidenceLevel, ExtractionManifest, ExtractionTier, Limitation, LimitationKind,
};
pub use platform::Platform;
pub use sampling::{plan_sample_timestamps, FRAME_MAX_HEIGHT, FRAME_MAX_WIDTH, MIN_IMAGE_DIMENSION};
pub use source::{RequestId, SourceKind, VideoSource};
