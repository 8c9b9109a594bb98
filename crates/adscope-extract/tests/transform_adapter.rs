//! Transform service adapter: per-timestamp fetches and silent degradation.

mod common;

use std::time::Duration;

use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adscope_extract::strategies::transform::{TransformServiceAdapter, TRANSFORM_PROBE_OFFSETS};
use adscope_extract::{AssetValidator, ExtractError, TransformServiceConfig};
use adscope_models::{AssetData, StrategyKind};

fn adapter(server_uri: &str) -> TransformServiceAdapter {
    TransformServiceAdapter::new(
        TransformServiceConfig::new("democloud").with_base_url(server_uri),
        reqwest::Client::new(),
        Duration::from_secs(2),
    )
}

fn validator() -> AssetValidator {
    AssetValidator::new(reqwest::Client::new(), Duration::from_secs(2))
}

#[tokio::test]
async fn per_timestamp_failures_degrade_silently() {
    let server = MockServer::start().await;
    // Only the first two offsets resolve; the rest are past the video's end
    Mock::given(method("GET"))
        .and(path_regex(r"^/democloud/video/fetch/so_0\.0,.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes(640, 360)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/democloud/video/fetch/so_1\.0,.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes(640, 360)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/democloud/video/fetch/.*$"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let (frames, thumbnail) = adapter(&server.uri())
        .extract_frames(
            "https://cdn.example.com/spot.mp4",
            TRANSFORM_PROBE_OFFSETS,
            &validator(),
        )
        .await
        .unwrap();

    assert!(frames.validated);
    assert_eq!(frames.source, Some(StrategyKind::TransformService));
    assert_eq!(frames.count, Some(2));
    assert_eq!(frames.timestamps, vec![0.0, 1.0]);

    assert!(thumbnail.validated);
    let AssetData::Images(images) = &thumbnail.data else {
        panic!("expected image data");
    };
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].timestamp, Some(0.0));
}

#[tokio::test]
async fn zero_validated_frames_is_strategy_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(423))
        .mount(&server)
        .await;

    let err = adapter(&server.uri())
        .extract_frames(
            "https://cdn.example.com/spot.mp4",
            TRANSFORM_PROBE_OFFSETS,
            &validator(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::RemoteFetchBlocked(_)));
}

#[tokio::test]
async fn non_image_bodies_never_validate() {
    let server = MockServer::start().await;
    // The host answers 200 with an HTML interstitial for every offset
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>denied</html>"))
        .mount(&server)
        .await;

    let err = adapter(&server.uri())
        .extract_frames(
            "https://cdn.example.com/spot.mp4",
            &[0.0, 1.0],
            &validator(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::RemoteFetchBlocked(_)));
}
