//! Platform thumbnail prober: ordering, short-circuit, storyboard stills.

mod common;

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adscope_extract::strategies::thumb_probe::probe_thumbnail;
use adscope_extract::{AssetValidator, ExtractError};
use adscope_models::{AssetData, AssetKind, StrategyKind};

fn validator() -> AssetValidator {
    AssetValidator::new(reqwest::Client::new(), Duration::from_secs(2))
}

#[tokio::test]
async fn short_circuits_on_first_validated_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maxres.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hq.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes(480, 360)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/low.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes(120, 90)))
        .expect(0)
        .mount(&server)
        .await;

    let candidates = vec![
        format!("{}/maxres.jpg", server.uri()),
        format!("{}/hq.jpg", server.uri()),
        format!("{}/low.jpg", server.uri()),
    ];
    let asset = probe_thumbnail(&validator(), &candidates, &[]).await.unwrap();

    assert!(asset.validated);
    assert_eq!(asset.kind, AssetKind::Thumbnail);
    assert_eq!(asset.source, Some(StrategyKind::PlatformThumbnail));
    let AssetData::Images(images) = &asset.data else {
        panic!("expected image data");
    };
    assert_eq!(images.len(), 1);
    assert!(images[0].url.as_deref().unwrap().ends_with("/hq.jpg"));
    assert_eq!((images[0].width, images[0].height), (480, 360));
}

#[tokio::test]
async fn attaches_storyboard_stills_best_effort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thumb.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes(640, 480)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sb1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes(320, 180)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sb2.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let candidates = vec![format!("{}/thumb.jpg", server.uri())];
    let storyboards = vec![
        format!("{}/sb1.jpg", server.uri()),
        format!("{}/sb2.jpg", server.uri()),
    ];
    let asset = probe_thumbnail(&validator(), &candidates, &storyboards)
        .await
        .unwrap();

    let AssetData::Images(images) = &asset.data else {
        panic!("expected image data");
    };
    assert_eq!(images.len(), 2);
    assert!(!images[0].storyboard);
    assert!(images[1].storyboard);
}

#[tokio::test]
async fn degenerate_candidates_are_rejected() {
    let server = MockServer::start().await;
    // A placeholder-sized image must not validate
    Mock::given(method("GET"))
        .and(path("/placeholder.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes(2, 2)))
        .mount(&server)
        .await;

    let candidates = vec![format!("{}/placeholder.jpg", server.uri())];
    let err = probe_thumbnail(&validator(), &candidates, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::RemoteFetchBlocked(_)));
}

#[tokio::test]
async fn validation_timeout_is_candidate_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(common::png_bytes(480, 360))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let validator = AssetValidator::new(reqwest::Client::new(), Duration::from_millis(200));
    let err = validator
        .validate_url(&format!("{}/slow.jpg", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::ValidationTimeout(_)));

    // The prober treats the expiry like any rejected candidate
    let candidates = vec![format!("{}/slow.jpg", server.uri())];
    let err = probe_thumbnail(&validator, &candidates, &[]).await.unwrap_err();
    assert!(matches!(err, ExtractError::RemoteFetchBlocked(_)));
}
