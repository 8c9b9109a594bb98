//! Platform embed-metadata adapter.
//!
//! Queries the platform's own oEmbed endpoint first and falls back once to
//! a generic embed-metadata aggregator. Absence of any individual response
//! field is tolerated; a response with no recognizable field at all counts
//! as a failure.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use adscope_models::MetadataDoc;

use crate::error::{ExtractError, ExtractResult};

/// oEmbed response shape; every field is optional on the wire.
#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
    duration: Option<f64>,
    width: Option<u32>,
    height: Option<u32>,
}

impl From<OEmbedResponse> for MetadataDoc {
    fn from(response: OEmbedResponse) -> Self {
        MetadataDoc {
            title: response.title,
            author: response.author_name,
            thumbnail_url: response.thumbnail_url,
            duration_secs: response.duration,
            width: response.width,
            height: response.height,
        }
    }
}

/// Build the generic-aggregator fallback URL for a source URL.
pub fn fallback_url(base: &str, source_url: &str) -> String {
    format!("{}?url={}&format=json", base, urlencoding::encode(source_url))
}

/// Embed-metadata adapter with a single generic fallback.
pub struct MetadataAdapter {
    client: Client,
    timeout: Duration,
}

impl MetadataAdapter {
    /// Create an adapter with the given per-request timeout.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch one embed-metadata endpoint.
    async fn fetch(&self, endpoint: &str) -> ExtractResult<MetadataDoc> {
        debug!("Fetching embed metadata from {}", endpoint);
        let response = self
            .client
            .get(endpoint)
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ExtractError::metadata_unavailable(format!(
                "HTTP {} from {}",
                response.status().as_u16(),
                endpoint
            )));
        }

        let parsed: OEmbedResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::metadata_unavailable(format!("bad payload: {}", e)))?;
        let doc = MetadataDoc::from(parsed);
        if doc.is_empty() {
            return Err(ExtractError::metadata_unavailable(
                "response carried no usable field",
            ));
        }
        Ok(doc)
    }

    /// Query the primary endpoint, falling back once on any failure.
    pub async fn extract(
        &self,
        primary: Option<&str>,
        fallback: &str,
    ) -> ExtractResult<MetadataDoc> {
        if let Some(primary) = primary {
            match self.fetch(primary).await {
                Ok(doc) => return Ok(doc),
                Err(err) => {
                    warn!("Primary embed-metadata endpoint failed: {}", err);
                }
            }
        }

        self.fetch(fallback).await.map_err(|err| {
            ExtractError::metadata_unavailable(format!(
                "both embed-metadata endpoints failed (last: {})",
                err
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_url_construction() {
        let url = fallback_url(
            "https://noembed.com/embed",
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
        );
        assert!(url.starts_with("https://noembed.com/embed?url="));
        assert!(url.contains("watch%3Fv%3DdQw4w9WgXcQ"));
        assert!(url.ends_with("&format=json"));
    }

    #[test]
    fn test_response_mapping_tolerates_missing_fields() {
        let parsed: OEmbedResponse =
            serde_json::from_str(r#"{"title": "Launch spot"}"#).unwrap();
        let doc = MetadataDoc::from(parsed);
        assert_eq!(doc.title.as_deref(), Some("Launch spot"));
        assert!(doc.author.is_none());
        assert!(!doc.is_empty());

        let empty: OEmbedResponse = serde_json::from_str("{}").unwrap();
        assert!(MetadataDoc::from(empty).is_empty());
    }
}
