//! In-process decode strategies: frame sampling, the local metadata probe,
//! and embedded caption extraction.
//!
//! These run against a locally supplied binary or the fetched copy of a
//! direct URL; the provenance passed in distinguishes the two.

use std::path::Path;

use tokio::sync::watch;
use tracing::{debug, warn};

use adscope_media::{
    extract_embedded_captions, probe_media, probe_remote, sample_frames, MediaError,
};
use adscope_models::sampling::plan_sample_timestamps;
use adscope_models::{
    AssetData, AssetKind, ExtractedAsset, ImageAsset, MetadataDoc, StrategyKind, TranscriptDoc,
};

use crate::error::{ExtractError, ExtractResult};
use crate::validator::AssetValidator;

fn map_media_error(err: MediaError) -> ExtractError {
    match err {
        MediaError::Cancelled => ExtractError::Cancelled,
        err if err.is_decode_failure() => ExtractError::decode_failed(err.to_string()),
        err => ExtractError::Media(err),
    }
}

/// Decode the input, sample frames at the planned timestamps, and validate
/// each capture.
///
/// Returns the frames asset plus the thumbnail derived from the first
/// validated frame. Individual failed seeks are skipped; zero validated
/// frames means the strategy failed.
pub async fn extract_frames_and_thumbnail(
    input: &Path,
    provenance: StrategyKind,
    work_dir: &Path,
    validator: &AssetValidator,
    seek_timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
) -> ExtractResult<(ExtractedAsset, ExtractedAsset)> {
    let info = probe_media(input).await.map_err(map_media_error)?;

    let mut plan = plan_sample_timestamps(info.duration_secs);
    if plan.is_empty() {
        // Unknown duration: still try the first frame
        plan.push(0.0);
    }

    let captured = sample_frames(input, &plan, work_dir, seek_timeout_secs, cancel_rx)
        .await
        .map_err(map_media_error)?;

    let mut images = Vec::with_capacity(captured.len());
    for frame in &captured {
        match validator.validate_file(&frame.path).await {
            Ok(dims) => images.push(
                ImageAsset::from_path(&frame.path, dims.width, dims.height)
                    .at_timestamp(frame.timestamp),
            ),
            Err(ExtractError::Cancelled) => return Err(ExtractError::Cancelled),
            Err(err) => {
                warn!(
                    "Dropping frame at {:.3}s, failed validation: {}",
                    frame.timestamp, err
                );
            }
        }
    }

    if images.is_empty() {
        return Err(ExtractError::decode_failed(
            "no sampled frame survived validation",
        ));
    }

    let timestamps: Vec<f64> = images.iter().filter_map(|i| i.timestamp).collect();
    debug!(
        "Sampled {} frames from {} via {}",
        images.len(),
        input.display(),
        provenance
    );

    let thumbnail = ExtractedAsset::validated(
        AssetKind::Thumbnail,
        provenance,
        AssetData::Images(vec![images[0].clone()]),
    );
    let frames = ExtractedAsset::validated(AssetKind::Frames, provenance, AssetData::Images(images))
        .with_timestamps(timestamps);

    Ok((frames, thumbnail))
}

fn doc_from_info(info: &adscope_media::MediaInfo) -> MetadataDoc {
    MetadataDoc {
        title: None,
        author: None,
        thumbnail_url: None,
        duration_secs: (info.duration_secs > 0.0).then_some(info.duration_secs),
        width: (info.width > 0).then_some(info.width),
        height: (info.height > 0).then_some(info.height),
    }
}

/// Probe duration and dimensions from a local copy.
pub async fn metadata_from_file(path: &Path) -> ExtractResult<MetadataDoc> {
    let info = probe_media(path).await.map_err(map_media_error)?;
    let doc = doc_from_info(&info);
    if doc.is_empty() {
        return Err(ExtractError::metadata_unavailable(
            "probe returned no usable fields",
        ));
    }
    Ok(doc)
}

/// Probe duration and dimensions directly over HTTP, bounded by a timeout.
pub async fn metadata_from_url(url: &str, timeout_secs: u64) -> ExtractResult<MetadataDoc> {
    let info = probe_remote(url, timeout_secs)
        .await
        .map_err(map_media_error)?;
    let doc = doc_from_info(&info);
    if doc.is_empty() {
        return Err(ExtractError::metadata_unavailable(
            "remote probe returned no usable fields",
        ));
    }
    Ok(doc)
}

/// Extract the embedded caption track as a transcript document.
pub async fn extract_transcript(
    input: &Path,
    timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
) -> ExtractResult<TranscriptDoc> {
    let info = probe_media(input).await.map_err(map_media_error)?;
    let text = extract_embedded_captions(input, &info, timeout_secs, cancel_rx)
        .await
        .map_err(map_media_error)?;

    Ok(TranscriptDoc {
        text,
        language: info.subtitle_language,
        format: "webvtt".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_error_mapping() {
        assert!(matches!(
            map_media_error(MediaError::Cancelled),
            ExtractError::Cancelled
        ));
        assert!(matches!(
            map_media_error(MediaError::decode_failed("bad")),
            ExtractError::DecodeFailed(_)
        ));
        assert!(matches!(
            map_media_error(MediaError::FfmpegNotFound),
            ExtractError::Media(_)
        ));
    }

    #[test]
    fn test_probe_doc_drops_zero_fields() {
        let info = adscope_media::MediaInfo {
            duration_secs: 0.0,
            width: 1920,
            height: 1080,
            codec: "h264".to_string(),
            size_bytes: 0,
            subtitle_tracks: 0,
            subtitle_language: None,
        };
        let doc = doc_from_info(&info);
        assert!(doc.duration_secs.is_none());
        assert_eq!(doc.width, Some(1920));
        assert!(!doc.is_empty());
    }
}
