//! Platform thumbnail prober.
//!
//! Probes a small, resolution-descending list of templated thumbnail URLs,
//! short-circuiting on the first candidate that passes the validator gate.
//! Storyboard stills are attached best-effort and always flagged; they are
//! never equivalent to true frame sampling.

use tracing::debug;

use adscope_models::{AssetData, AssetKind, ExtractedAsset, ImageAsset, StrategyKind};

use crate::error::{ExtractError, ExtractResult};
use crate::validator::AssetValidator;

/// Upper bound on storyboard stills attached to the thumbnail asset.
pub const MAX_STORYBOARD_STILLS: usize = 3;

/// Probe thumbnail candidates in order, then attach storyboard stills.
///
/// Fails with [`ExtractError::RemoteFetchBlocked`] when no candidate at
/// all validates.
pub async fn probe_thumbnail(
    validator: &AssetValidator,
    candidates: &[String],
    storyboards: &[String],
) -> ExtractResult<ExtractedAsset> {
    let mut primary = None;
    for candidate in candidates {
        match validator.validate_url(candidate).await {
            Ok(dims) => {
                debug!("Thumbnail candidate validated: {}", candidate);
                primary = Some(ImageAsset::from_url(candidate, dims.width, dims.height));
                break;
            }
            Err(ExtractError::Cancelled) => return Err(ExtractError::Cancelled),
            Err(err) => {
                debug!("Thumbnail candidate rejected ({}): {}", candidate, err);
            }
        }
    }

    let Some(primary) = primary else {
        return Err(ExtractError::remote_fetch_blocked(
            "no thumbnail candidate validated",
        ));
    };

    let mut images = vec![primary];
    for storyboard in storyboards.iter().take(MAX_STORYBOARD_STILLS) {
        match validator.validate_url(storyboard).await {
            Ok(dims) => images.push(
                ImageAsset::from_url(storyboard, dims.width, dims.height).as_storyboard(),
            ),
            Err(ExtractError::Cancelled) => return Err(ExtractError::Cancelled),
            Err(err) => {
                debug!("Storyboard candidate rejected ({}): {}", storyboard, err);
            }
        }
    }

    Ok(ExtractedAsset::validated(
        AssetKind::Thumbnail,
        StrategyKind::PlatformThumbnail,
        AssetData::Images(images),
    ))
}
