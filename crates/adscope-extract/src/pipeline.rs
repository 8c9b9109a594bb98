//! The extraction pipeline: concurrent asset-kind tasks, sequential
//! fallback chains, the join barrier, and manifest assembly.
//!
//! One task runs per asset kind against the same immutable source. Within
//! a task, strategies execute strictly in the classifier's order; a
//! strategy starts only after the previous one failed or was skipped.
//! Failures never cross the task boundary: they become limitation entries.
//! After all tasks settle, tier classification runs as a pure function of
//! the validated set.

use std::collections::BTreeMap;
use std::path::PathBuf;

use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, info};

use adscope_models::{
    AssetKind, ExtractedAsset, ExtractionManifest, Limitation, LimitationKind, RequestId,
    SourceKind, StrategyKind,
};

use crate::classifier::{classify, ExtractionPlan, SourceRef, Strategy};
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::fetch::SharedFetch;
use crate::strategies::transform::{TransformServiceAdapter, TRANSFORM_PROBE_OFFSETS};
use crate::strategies::{local, oembed, thumb_probe};
use crate::validator::AssetValidator;

const USER_AGENT: &str = concat!("adscope-extract/", env!("CARGO_PKG_VERSION"));

/// Settled outcome of one asset-kind task.
#[derive(Debug, Default)]
struct KindOutcome {
    asset: Option<ExtractedAsset>,
    /// Thumbnail derived as a by-product of a frames strategy
    derived_thumbnail: Option<ExtractedAsset>,
    limitations: Vec<Limitation>,
}

impl KindOutcome {
    fn succeeded(asset: ExtractedAsset, limitations: Vec<Limitation>) -> Self {
        Self {
            asset: Some(asset),
            derived_thumbnail: None,
            limitations,
        }
    }

    fn exhausted(limitations: Vec<Limitation>) -> Self {
        Self {
            asset: None,
            derived_thumbnail: None,
            limitations,
        }
    }
}

/// Shared read-only context for the kind tasks.
struct TaskCtx<'a> {
    plan: &'a ExtractionPlan,
    config: &'a ExtractorConfig,
    client: &'a Client,
    validator: &'a AssetValidator,
    fetch: Option<&'a SharedFetch>,
    work_dir: &'a PathBuf,
    cancel: Option<watch::Receiver<bool>>,
}

/// The extraction pipeline.
pub struct ExtractionPipeline {
    config: ExtractorConfig,
    client: Client,
}

impl ExtractionPipeline {
    /// Create a pipeline from explicit configuration.
    pub fn new(config: ExtractorConfig) -> ExtractResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { config, client })
    }

    /// Classify a reference and run the full extraction.
    pub async fn run(&self, reference: &SourceRef) -> ExtractResult<ExtractionManifest> {
        let plan = classify(reference, None)?;
        self.run_plan(plan, None).await
    }

    /// Like [`run`](Self::run), with caller-initiated cancellation. A
    /// cancelled extraction never yields a manifest.
    pub async fn run_with_cancel(
        &self,
        reference: &SourceRef,
        cancel: watch::Receiver<bool>,
    ) -> ExtractResult<ExtractionManifest> {
        let plan = classify(reference, None)?;
        self.run_plan(plan, Some(cancel)).await
    }

    /// Run extraction for an already-classified plan.
    pub async fn run_plan(
        &self,
        plan: ExtractionPlan,
        cancel: Option<watch::Receiver<bool>>,
    ) -> ExtractResult<ExtractionManifest> {
        let request_id = RequestId::new();
        let work_dir = self.config.work_dir.join(request_id.as_str());
        tokio::fs::create_dir_all(&work_dir).await?;

        info!(
            request_id = %request_id,
            source = %plan.source.kind,
            "Starting extraction for {}",
            plan.source.raw_reference
        );

        let validator = AssetValidator::new(self.client.clone(), self.config.validation_timeout);
        let fetch = (plan.source.kind == SourceKind::DirectUrl).then(|| {
            SharedFetch::new(
                plan.source.raw_reference.clone(),
                self.client.clone(),
                self.config.download_timeout,
                self.config.max_download_bytes,
                work_dir.join("source.bin"),
            )
        });

        let ctx = TaskCtx {
            plan: &plan,
            config: &self.config,
            client: &self.client,
            validator: &validator,
            fetch: fetch.as_ref(),
            work_dir: &work_dir,
            cancel: cancel.clone(),
        };

        // Join barrier: all four kind tasks settle before classification.
        let join = async {
            tokio::join!(
                run_frames_task(&ctx),
                run_thumbnail_task(&ctx),
                run_metadata_task(&ctx),
                run_transcript_task(&ctx),
            )
        };
        let (frames, thumbnail, metadata, transcript) = match cancel {
            Some(mut rx) => {
                tokio::select! {
                    outcome = join => outcome,
                    _ = cancelled(&mut rx) => {
                        info!(request_id = %request_id, "Extraction cancelled");
                        return Err(ExtractError::Cancelled);
                    }
                }
            }
            None => join.await,
        };

        let manifest = assemble(request_id, frames?, thumbnail?, metadata?, transcript?);
        info!(
            request_id = %manifest.request_id,
            tier = %manifest.tier,
            "Extraction settled with {} limitations",
            manifest.limitations.len()
        );
        Ok(manifest)
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            // Sender gone without cancelling; never resolves
            std::future::pending::<()>().await;
        }
    }
}

// ============================================================================
// Kind tasks
// ============================================================================

async fn run_frames_task(ctx: &TaskCtx<'_>) -> ExtractResult<KindOutcome> {
    let mut limitations = Vec::new();

    for strategy in ctx.plan.chain(AssetKind::Frames) {
        match strategy {
            Strategy::LocalFile => {
                let Some(path) = ctx.plan.local_path.as_deref() else {
                    continue;
                };
                match local::extract_frames_and_thumbnail(
                    path,
                    StrategyKind::LocalFile,
                    ctx.work_dir,
                    ctx.validator,
                    ctx.config.seek_timeout_secs,
                    ctx.cancel.clone(),
                )
                .await
                {
                    Ok((frames, thumbnail)) => {
                        return Ok(KindOutcome {
                            asset: Some(frames),
                            derived_thumbnail: Some(thumbnail),
                            limitations,
                        })
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => limitations.push(limitation_for(AssetKind::Frames, &err)),
                }
            }
            Strategy::DirectUrl => {
                let Some(fetch) = ctx.fetch else { continue };
                let fetched = match fetch.get().await {
                    Ok(path) => path.to_path_buf(),
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        limitations.push(limitation_for(AssetKind::Frames, &err));
                        continue;
                    }
                };
                match local::extract_frames_and_thumbnail(
                    &fetched,
                    StrategyKind::DirectUrl,
                    ctx.work_dir,
                    ctx.validator,
                    ctx.config.seek_timeout_secs,
                    ctx.cancel.clone(),
                )
                .await
                {
                    Ok((frames, thumbnail)) => {
                        return Ok(KindOutcome {
                            asset: Some(frames),
                            derived_thumbnail: Some(thumbnail),
                            limitations,
                        })
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => limitations.push(limitation_for(AssetKind::Frames, &err)),
                }
            }
            Strategy::TransformService => {
                let adapter = match TransformServiceAdapter::try_new(
                    ctx.config.transform.clone(),
                    ctx.client.clone(),
                    ctx.config.fetch_timeout,
                ) {
                    Ok(adapter) => adapter,
                    Err(err) => {
                        // Unconfigured means skipped entirely, not failed
                        debug!("Skipping transform service: {}", err);
                        continue;
                    }
                };
                match adapter
                    .extract_frames(
                        &ctx.plan.source.raw_reference,
                        TRANSFORM_PROBE_OFFSETS,
                        ctx.validator,
                    )
                    .await
                {
                    Ok((frames, thumbnail)) => {
                        return Ok(KindOutcome {
                            asset: Some(frames),
                            derived_thumbnail: Some(thumbnail),
                            limitations,
                        })
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => limitations.push(limitation_for(AssetKind::Frames, &err)),
                }
            }
            _ => {}
        }
    }

    Ok(KindOutcome::exhausted(limitations))
}

async fn run_thumbnail_task(ctx: &TaskCtx<'_>) -> ExtractResult<KindOutcome> {
    let mut limitations = Vec::new();

    for strategy in ctx.plan.chain(AssetKind::Thumbnail) {
        if *strategy != Strategy::PlatformThumbnail {
            continue;
        }
        match thumb_probe::probe_thumbnail(
            ctx.validator,
            &ctx.plan.thumbnail_candidates,
            &ctx.plan.storyboard_candidates,
        )
        .await
        {
            Ok(asset) => return Ok(KindOutcome::succeeded(asset, limitations)),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => limitations.push(limitation_for(AssetKind::Thumbnail, &err)),
        }
    }

    Ok(KindOutcome::exhausted(limitations))
}

async fn run_metadata_task(ctx: &TaskCtx<'_>) -> ExtractResult<KindOutcome> {
    let mut limitations = Vec::new();

    for strategy in ctx.plan.chain(AssetKind::Metadata) {
        match strategy {
            Strategy::LocalProbe => {
                match probe_metadata(ctx).await {
                    Ok(doc) => {
                        let asset = ExtractedAsset::validated(
                            AssetKind::Metadata,
                            StrategyKind::LocalProbe,
                            adscope_models::AssetData::Metadata(doc),
                        );
                        return Ok(KindOutcome::succeeded(asset, limitations));
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => limitations.push(limitation_for(AssetKind::Metadata, &err)),
                }
            }
            Strategy::Oembed => {
                let adapter =
                    oembed::MetadataAdapter::new(ctx.client.clone(), ctx.config.fetch_timeout);
                let fallback = oembed::fallback_url(
                    &ctx.config.oembed_fallback_base,
                    &ctx.plan.source.raw_reference,
                );
                match adapter
                    .extract(ctx.plan.oembed_primary.as_deref(), &fallback)
                    .await
                {
                    Ok(doc) => {
                        let asset = ExtractedAsset::validated(
                            AssetKind::Metadata,
                            StrategyKind::Oembed,
                            adscope_models::AssetData::Metadata(doc),
                        );
                        return Ok(KindOutcome::succeeded(asset, limitations));
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => limitations.push(limitation_for(AssetKind::Metadata, &err)),
                }
            }
            _ => {}
        }
    }

    Ok(KindOutcome::exhausted(limitations))
}

/// Metadata probe over the local copy when one exists, falling back to a
/// bounded remote probe for blocked direct URLs.
async fn probe_metadata(ctx: &TaskCtx<'_>) -> ExtractResult<adscope_models::MetadataDoc> {
    if let Some(path) = ctx.plan.local_path.as_deref() {
        return local::metadata_from_file(path).await;
    }

    if let Some(fetch) = ctx.fetch {
        match fetch.get().await {
            Ok(path) => return local::metadata_from_file(path).await,
            Err(err) if err.is_fatal() => return Err(err),
            Err(_) => {
                // Fetch blocked; the host may still answer a header probe
                return local::metadata_from_url(
                    &ctx.plan.source.raw_reference,
                    ctx.config.fetch_timeout.as_secs(),
                )
                .await;
            }
        }
    }

    Err(ExtractError::metadata_unavailable(
        "no local copy to probe",
    ))
}

async fn run_transcript_task(ctx: &TaskCtx<'_>) -> ExtractResult<KindOutcome> {
    let chain = ctx.plan.chain(AssetKind::Transcript);
    if chain.is_empty() {
        // Platform captions are out of reach by design
        if ctx.plan.source.kind == SourceKind::PlatformUrl {
            return Ok(KindOutcome::exhausted(vec![Limitation::new(
                LimitationKind::TranscriptUnavailable,
                "Captions on the platform are not accessible to automated extraction.",
                "Upload a captioned export to score caption quality.",
            )
            .with_upload_suggestion()]));
        }
        return Ok(KindOutcome::exhausted(Vec::new()));
    }

    let mut limitations = Vec::new();
    for strategy in chain {
        if *strategy != Strategy::EmbeddedCaptions {
            continue;
        }

        let input = match ctx.plan.local_path.as_deref() {
            Some(path) => Some(path.to_path_buf()),
            None => match ctx.fetch {
                Some(fetch) => match fetch.get().await {
                    Ok(path) => Some(path.to_path_buf()),
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(_) => None,
                },
                None => None,
            },
        };
        let Some(input) = input else {
            limitations.push(Limitation::new(
                LimitationKind::TranscriptUnavailable,
                "The source could not be fetched, so no caption track was read.",
                "Upload the video file to include captions in the analysis.",
            ));
            continue;
        };

        match local::extract_transcript(
            &input,
            ctx.config.seek_timeout_secs,
            ctx.cancel.clone(),
        )
        .await
        {
            Ok(doc) => {
                let asset = ExtractedAsset::validated(
                    AssetKind::Transcript,
                    StrategyKind::EmbeddedCaptions,
                    adscope_models::AssetData::Transcript(doc),
                );
                return Ok(KindOutcome::succeeded(asset, limitations));
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                debug!("Embedded caption extraction failed: {}", err);
                limitations.push(Limitation::new(
                    LimitationKind::TranscriptUnavailable,
                    "The video carries no readable caption track.",
                    "Provide a captioned export to score caption quality.",
                ));
            }
        }
    }

    Ok(KindOutcome::exhausted(limitations))
}

// ============================================================================
// Assembly
// ============================================================================

fn assemble(
    request_id: RequestId,
    mut frames: KindOutcome,
    thumbnail: KindOutcome,
    metadata: KindOutcome,
    transcript: KindOutcome,
) -> ExtractionManifest {
    let mut limitations = Vec::new();

    // The thumbnail slot prefers the prober's platform-native result and
    // falls back to the frame-0 derivation from the frames task.
    let thumbnail_asset = thumbnail.asset.or(frames.derived_thumbnail.take());

    let frames_validated = frames.asset.as_ref().is_some_and(|a| a.validated);
    let thumbnail_validated = thumbnail_asset.as_ref().is_some_and(|a| a.validated);
    if !frames_validated && thumbnail_validated {
        // Thumbnail-level evidence only; the tier ceiling for frames drops
        limitations.push(
            Limitation::new(
                LimitationKind::FramesDegraded,
                "Frame-by-frame analysis was not possible; only thumbnail-level \
                 visuals were obtained.",
                "Upload the video file directly for full frame-level analysis.",
            )
            .with_upload_suggestion(),
        );
    }

    let mut assets = BTreeMap::new();
    for (kind, asset) in [
        (AssetKind::Frames, frames.asset),
        (AssetKind::Thumbnail, thumbnail_asset),
        (AssetKind::Metadata, metadata.asset),
        (AssetKind::Transcript, transcript.asset),
    ] {
        assets.insert(kind, asset.unwrap_or_else(|| ExtractedAsset::missing(kind)));
    }

    limitations.extend(frames.limitations);
    limitations.extend(thumbnail.limitations);
    limitations.extend(metadata.limitations);
    limitations.extend(transcript.limitations);

    ExtractionManifest::build(request_id, assets, limitations)
}

/// Map an absorbed strategy failure to its limitation entry.
fn limitation_for(kind: AssetKind, err: &ExtractError) -> Limitation {
    // Metadata absence is its own note regardless of what failed underneath;
    // it never blocks the other kinds.
    if kind == AssetKind::Metadata {
        let limitation = Limitation::new(
            LimitationKind::MetadataUnavailable,
            "Title, author, and duration could not be obtained for this video.",
            "The analysis proceeds without source metadata.",
        );
        return if err.suggests_upload() {
            limitation.with_upload_suggestion()
        } else {
            limitation
        };
    }

    let limitation = match err {
        ExtractError::DecodeFailed(_) => Limitation::new(
            LimitationKind::DecodeFailed,
            "The video could not be decoded, so no frames were sampled.",
            "Re-export the video as a standard H.264 MP4 and upload it again.",
        ),
        ExtractError::CorsBlocked { .. } => Limitation::new(
            LimitationKind::CorsBlocked,
            "The video host blocks automated access, so the file could not be \
             read from the link.",
            "Upload the video file directly for full frame-level analysis.",
        ),
        ExtractError::LoadFailed(_) => Limitation::new(
            LimitationKind::LoadFailed,
            "The video could not be loaded from the link.",
            "Check that the link is live, or upload the file directly.",
        ),
        ExtractError::RemoteFetchBlocked(_) => match kind {
            AssetKind::Thumbnail => Limitation::new(
                LimitationKind::RemoteFetchBlocked,
                "No platform thumbnail could be validated for this video.",
                "Upload the video file to include visuals in the analysis.",
            ),
            _ => Limitation::new(
                LimitationKind::RemoteFetchBlocked,
                "The host blocks the transformation service, so frame-by-frame \
                 analysis was unavailable from the link.",
                "Upload the video file directly for full frame-level analysis.",
            ),
        },
        ExtractError::ValidationTimeout(_) => Limitation::new(
            LimitationKind::ValidationTimeout,
            "Asset validation timed out before the candidate loaded.",
            "Retry the analysis, or upload the file directly.",
        ),
        ExtractError::MetadataUnavailable(_) => Limitation::new(
            LimitationKind::MetadataUnavailable,
            "Title, author, and duration could not be obtained for this video.",
            "The analysis proceeds without source metadata.",
        ),
        _ => Limitation::new(
            LimitationKind::LoadFailed,
            "An extraction step failed unexpectedly for this source.",
            "Retry the analysis, or upload the file directly.",
        ),
    };

    if err.suggests_upload() {
        limitation.with_upload_suggestion()
    } else {
        limitation
    }
}
