//! Transform service adapter: per-timestamp frame fetches for arbitrary
//! remote URLs through an external transformation endpoint.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use adscope_models::sampling::{FRAME_MAX_HEIGHT, FRAME_MAX_WIDTH};
use adscope_models::{AssetData, AssetKind, ExtractedAsset, ImageAsset, StrategyKind};

use crate::config::TransformServiceConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::validator::AssetValidator;

/// Timestamps probed when the source duration is unknown. Offsets past the
/// end of the video fail per-timestamp and degrade silently.
pub const TRANSFORM_PROBE_OFFSETS: &[f64] = &[0.0, 1.0, 3.0, 5.0, 7.0, 10.0, 15.0, 20.0];

/// Adapter for a Cloudinary-style fetch transformation endpoint.
pub struct TransformServiceAdapter {
    config: TransformServiceConfig,
    client: Client,
    fetch_timeout: Duration,
}

impl TransformServiceAdapter {
    /// Create an adapter from explicit configuration.
    pub fn new(config: TransformServiceConfig, client: Client, fetch_timeout: Duration) -> Self {
        Self {
            config,
            client,
            fetch_timeout,
        }
    }

    /// Create an adapter only when the service is configured.
    ///
    /// An unconfigured service yields [`ExtractError::ServiceUnconfigured`],
    /// which callers treat as "skip this strategy", never as a failure.
    pub fn try_new(
        config: Option<TransformServiceConfig>,
        client: Client,
        fetch_timeout: Duration,
    ) -> ExtractResult<Self> {
        let config = config.ok_or(ExtractError::ServiceUnconfigured)?;
        Ok(Self::new(config, client, fetch_timeout))
    }

    /// Build the transformation URL for one frame.
    ///
    /// The path encodes the time offset, output bound, letterbox padding,
    /// quality, and output format, followed by the encoded source URL.
    pub fn frame_url(&self, source_url: &str, offset_secs: f64) -> String {
        format!(
            "{}/{}/video/fetch/so_{:.1},w_{},h_{},c_pad,b_black,q_auto:good,f_jpg/{}",
            self.config.base_url,
            self.config.cloud_name,
            offset_secs,
            FRAME_MAX_WIDTH,
            FRAME_MAX_HEIGHT,
            urlencoding::encode(source_url)
        )
    }

    /// Fetch one transformed frame and pass it through the validator gate.
    async fn fetch_frame(
        &self,
        source_url: &str,
        offset_secs: f64,
        validator: &AssetValidator,
    ) -> ExtractResult<ImageAsset> {
        let url = self.frame_url(source_url, offset_secs);
        let response = self
            .client
            .get(&url)
            .timeout(self.fetch_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ExtractError::candidate_rejected(format!(
                "HTTP {} at offset {:.1}s",
                response.status().as_u16(),
                offset_secs
            )));
        }

        let bytes = response.bytes().await?;
        let dims = validator.validate_bytes(&bytes)?;
        Ok(ImageAsset::from_url(url, dims.width, dims.height).at_timestamp(offset_secs))
    }

    /// Fetch frames at the given offsets.
    ///
    /// Per-timestamp failures degrade silently; zero validated frames means
    /// the remote host blocked the service and the strategy failed.
    pub async fn extract_frames(
        &self,
        source_url: &str,
        offsets: &[f64],
        validator: &AssetValidator,
    ) -> ExtractResult<(ExtractedAsset, ExtractedAsset)> {
        let mut images = Vec::with_capacity(offsets.len());
        for &offset in offsets {
            match self.fetch_frame(source_url, offset, validator).await {
                Ok(image) => images.push(image),
                Err(err) => {
                    debug!(
                        "Transform fetch failed at {:.1}s for {}: {}",
                        offset, source_url, err
                    );
                }
            }
        }

        if images.is_empty() {
            warn!("Transform service produced no validated frames for {}", source_url);
            return Err(ExtractError::remote_fetch_blocked(
                "no transformed frame validated",
            ));
        }

        let timestamps: Vec<f64> = images.iter().filter_map(|i| i.timestamp).collect();
        debug!(
            "Transform service produced {} frames for {}",
            images.len(),
            source_url
        );

        let thumbnail = ExtractedAsset::validated(
            AssetKind::Thumbnail,
            StrategyKind::TransformService,
            AssetData::Images(vec![images[0].clone()]),
        );
        let frames = ExtractedAsset::validated(
            AssetKind::Frames,
            StrategyKind::TransformService,
            AssetData::Images(images),
        )
        .with_timestamps(timestamps);

        Ok((frames, thumbnail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> TransformServiceAdapter {
        TransformServiceAdapter::new(
            TransformServiceConfig::new("demo-cloud"),
            Client::new(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_frame_url_encodes_parameters() {
        let url = adapter().frame_url("https://cdn.example.com/spot video.mp4", 7.0);

        assert!(url.starts_with(
            "https://res.cloudinary.com/demo-cloud/video/fetch/so_7.0,w_640,h_360,c_pad,b_black,q_auto:good,f_jpg/"
        ));
        // Source URL is fully percent-encoded into the final path segment
        assert!(url.ends_with("https%3A%2F%2Fcdn.example.com%2Fspot%20video.mp4"));
    }

    #[test]
    fn test_fractional_offsets_keep_one_decimal() {
        let url = adapter().frame_url("https://cdn.example.com/a.mp4", 9.5);
        assert!(url.contains("so_9.5,"));
    }

    #[test]
    fn test_unconfigured_service_is_skip_not_failure() {
        let err = TransformServiceAdapter::try_new(None, Client::new(), Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, ExtractError::ServiceUnconfigured));
        assert!(!err.suggests_upload());
    }
}
