//! Source classification and strategy routing.
//!
//! The classifier inspects the input reference once, builds the immutable
//! [`VideoSource`], and emits an ordered strategy list per asset kind. The
//! pipeline dispatches those lists without any inline routing of its own,
//! so the full fallback order for every source shape lives here.

use std::collections::BTreeMap;
use std::path::PathBuf;

use url::Url;

use adscope_models::platform::is_direct_file_url;
use adscope_models::{AssetKind, Platform, VideoSource};

use crate::error::{ExtractError, ExtractResult};

/// The raw input reference, before classification.
#[derive(Debug, Clone)]
pub enum SourceRef {
    /// A locally supplied video binary
    LocalFile { path: PathBuf },
    /// A URL string
    Url(String),
}

impl SourceRef {
    /// Convenience constructor for a local file.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        SourceRef::LocalFile { path: path.into() }
    }

    /// Convenience constructor for a URL.
    pub fn url(url: impl Into<String>) -> Self {
        SourceRef::Url(url.into())
    }
}

/// One extraction strategy in a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Decode a local binary in-process
    LocalFile,
    /// Fetch a remote file, then decode in-process
    DirectUrl,
    /// Per-timestamp frame fetch through the transformation service
    TransformService,
    /// Probe templated platform thumbnail URLs
    PlatformThumbnail,
    /// Platform embed-metadata endpoint with generic fallback
    Oembed,
    /// Duration/dimension probe of the local (or fetched) copy
    LocalProbe,
    /// Embedded caption track extraction
    EmbeddedCaptions,
}

/// The classified source plus the ordered strategy chains per asset kind.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    /// The immutable classified source
    pub source: VideoSource,

    /// Path of the local binary, for local sources
    pub local_path: Option<PathBuf>,

    /// Ordered fallback chain per asset kind
    pub chains: BTreeMap<AssetKind, Vec<Strategy>>,

    /// Thumbnail candidate URLs, highest resolution first
    pub thumbnail_candidates: Vec<String>,

    /// Storyboard still candidate URLs
    pub storyboard_candidates: Vec<String>,

    /// The platform's own oEmbed endpoint for this source
    pub oembed_primary: Option<String>,
}

impl ExtractionPlan {
    /// The strategy chain for a kind (empty when nothing applies).
    pub fn chain(&self, kind: AssetKind) -> &[Strategy] {
        self.chains.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Classify a reference and build its extraction plan.
///
/// Fails fast with [`ExtractError::InvalidReference`] when the reference is
/// neither an existing local file nor a well-formed http(s) URL; no
/// extraction is scheduled in that case.
pub fn classify(reference: &SourceRef, hint: Option<Platform>) -> ExtractResult<ExtractionPlan> {
    match reference {
        SourceRef::LocalFile { path } => {
            if !path.is_file() {
                return Err(ExtractError::invalid_reference(format!(
                    "local file does not exist: {}",
                    path.display()
                )));
            }
            Ok(local_plan(path.clone()))
        }
        SourceRef::Url(raw) => {
            let parsed = Url::parse(raw.trim())
                .map_err(|e| ExtractError::invalid_reference(format!("malformed URL: {}", e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ExtractError::invalid_reference(format!(
                    "unsupported URL scheme: {}",
                    parsed.scheme()
                )));
            }

            let platform = hint
                .filter(|p| p.matches_url(raw))
                .or_else(|| Platform::detect(raw));
            match platform {
                Some(platform) => Ok(platform_plan(raw.trim().to_string(), platform)),
                None => Ok(direct_plan(raw.trim().to_string())),
            }
        }
    }
}

fn local_plan(path: PathBuf) -> ExtractionPlan {
    let source = VideoSource::local_file(path.to_string_lossy());
    let chains = BTreeMap::from([
        (AssetKind::Frames, vec![Strategy::LocalFile]),
        // Thumbnail is derived from frame 0 at the join barrier
        (AssetKind::Thumbnail, Vec::new()),
        (AssetKind::Metadata, vec![Strategy::LocalProbe]),
        (AssetKind::Transcript, vec![Strategy::EmbeddedCaptions]),
    ]);
    ExtractionPlan {
        source,
        local_path: Some(path),
        chains,
        thumbnail_candidates: Vec::new(),
        storyboard_candidates: Vec::new(),
        oembed_primary: None,
    }
}

fn direct_plan(url: String) -> ExtractionPlan {
    // An in-process decode of a page-like URL is almost certain to fail;
    // lead with the transform service there and keep the direct decode as
    // the fallback. Raw file URLs decode first.
    let frames_chain = if is_direct_file_url(&url) {
        vec![Strategy::DirectUrl, Strategy::TransformService]
    } else {
        vec![Strategy::TransformService, Strategy::DirectUrl]
    };
    let source = VideoSource::direct_url(url);
    let chains = BTreeMap::from([
        (AssetKind::Frames, frames_chain),
        (AssetKind::Thumbnail, Vec::new()),
        (AssetKind::Metadata, vec![Strategy::LocalProbe]),
        (AssetKind::Transcript, vec![Strategy::EmbeddedCaptions]),
    ]);
    ExtractionPlan {
        source,
        local_path: None,
        chains,
        thumbnail_candidates: Vec::new(),
        storyboard_candidates: Vec::new(),
        oembed_primary: None,
    }
}

fn platform_plan(url: String, platform: Platform) -> ExtractionPlan {
    let video_id = platform.extract_video_id(&url);
    let thumbnail_candidates = video_id
        .as_deref()
        .map(|id| platform.thumbnail_candidates(id))
        .unwrap_or_default();
    let storyboard_candidates = video_id
        .as_deref()
        .map(|id| platform.storyboard_candidates(id))
        .unwrap_or_default();
    let oembed_primary = Some(platform.oembed_url(&url));

    let thumbnail_chain = if thumbnail_candidates.is_empty() {
        Vec::new()
    } else {
        vec![Strategy::PlatformThumbnail]
    };
    let chains = BTreeMap::from([
        (AssetKind::Frames, vec![Strategy::TransformService]),
        (AssetKind::Thumbnail, thumbnail_chain),
        (AssetKind::Metadata, vec![Strategy::Oembed]),
        // Captions behind platform access are out of reach by design
        (AssetKind::Transcript, Vec::new()),
    ]);

    ExtractionPlan {
        source: VideoSource::platform_url(url, platform, video_id),
        local_path: None,
        chains,
        thumbnail_candidates,
        storyboard_candidates,
        oembed_primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adscope_models::SourceKind;

    #[test]
    fn test_invalid_references_fail_fast() {
        let missing = SourceRef::local("/nonexistent/video.mp4");
        assert!(matches!(
            classify(&missing, None),
            Err(ExtractError::InvalidReference(_))
        ));

        let garbage = SourceRef::url("not a url at all");
        assert!(matches!(
            classify(&garbage, None),
            Err(ExtractError::InvalidReference(_))
        ));

        let scheme = SourceRef::url("ftp://example.com/video.mp4");
        assert!(matches!(
            classify(&scheme, None),
            Err(ExtractError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_local_file_routes_to_local_only() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let plan = classify(&SourceRef::local(file.path()), None).unwrap();

        assert_eq!(plan.source.kind, SourceKind::LocalFile);
        assert_eq!(plan.chain(AssetKind::Frames), &[Strategy::LocalFile]);
        assert_eq!(plan.chain(AssetKind::Metadata), &[Strategy::LocalProbe]);
        assert_eq!(
            plan.chain(AssetKind::Transcript),
            &[Strategy::EmbeddedCaptions]
        );
        assert!(plan.chain(AssetKind::Thumbnail).is_empty());
        assert!(plan.local_path.is_some());
    }

    #[test]
    fn test_unmatched_url_is_direct_with_transform_fallback() {
        let plan = classify(&SourceRef::url("https://cdn.example.com/spot.mp4"), None).unwrap();

        assert_eq!(plan.source.kind, SourceKind::DirectUrl);
        assert_eq!(
            plan.chain(AssetKind::Frames),
            &[Strategy::DirectUrl, Strategy::TransformService]
        );
        assert!(plan.oembed_primary.is_none());
        assert!(plan.thumbnail_candidates.is_empty());
    }

    #[test]
    fn test_page_like_url_leads_with_transform() {
        let plan = classify(&SourceRef::url("https://example.com/landing"), None).unwrap();

        assert_eq!(plan.source.kind, SourceKind::DirectUrl);
        assert_eq!(
            plan.chain(AssetKind::Frames),
            &[Strategy::TransformService, Strategy::DirectUrl]
        );
    }

    #[test]
    fn test_platform_url_plan() {
        let plan = classify(
            &SourceRef::url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            None,
        )
        .unwrap();

        assert_eq!(plan.source.kind, SourceKind::PlatformUrl);
        assert_eq!(plan.source.platform, Some(Platform::Youtube));
        assert_eq!(plan.source.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(plan.chain(AssetKind::Frames), &[Strategy::TransformService]);
        assert_eq!(
            plan.chain(AssetKind::Thumbnail),
            &[Strategy::PlatformThumbnail]
        );
        assert_eq!(plan.chain(AssetKind::Metadata), &[Strategy::Oembed]);
        assert!(plan.chain(AssetKind::Transcript).is_empty());
        assert_eq!(plan.thumbnail_candidates.len(), 5);
        assert!(plan.oembed_primary.as_deref().unwrap().contains("oembed"));
    }

    #[test]
    fn test_platform_hint_is_checked_against_url() {
        // A wrong hint must not override the URL's own signature
        let plan = classify(
            &SourceRef::url("https://vimeo.com/76979871"),
            Some(Platform::Youtube),
        )
        .unwrap();
        assert_eq!(plan.source.platform, Some(Platform::Vimeo));
    }

    #[test]
    fn test_platform_without_template_has_no_probe_chain() {
        let plan = classify(
            &SourceRef::url("https://www.tiktok.com/@brand/video/7106594312292453675"),
            None,
        )
        .unwrap();
        assert_eq!(plan.source.platform, Some(Platform::Tiktok));
        assert!(plan.chain(AssetKind::Thumbnail).is_empty());
        assert_eq!(plan.chain(AssetKind::Metadata), &[Strategy::Oembed]);
    }
}
