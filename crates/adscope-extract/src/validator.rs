//! The asset validator gate.
//!
//! Every candidate image must pass through here before a strategy may mark
//! its asset extracted. The gate confirms the candidate actually loads and
//! has non-degenerate dimensions, bounded by a fixed timeout; expiry is a
//! candidate failure, never an indefinite wait.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use adscope_media::validate_image_bytes;

use crate::error::{ExtractError, ExtractResult};

/// A candidate image that passed the gate.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedDimensions {
    pub width: u32,
    pub height: u32,
}

/// The single validation gate for candidate assets.
#[derive(Debug, Clone)]
pub struct AssetValidator {
    client: Client,
    timeout: Duration,
}

impl AssetValidator {
    /// Create a validator with the given per-candidate timeout.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch a remote image and confirm it decodes with usable dimensions.
    pub async fn validate_url(&self, url: &str) -> ExtractResult<ValidatedDimensions> {
        let fetch = async {
            let response = self.client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(ExtractError::candidate_rejected(format!(
                    "HTTP {} for {}",
                    response.status().as_u16(),
                    url
                )));
            }
            let bytes = response.bytes().await?;
            self.validate_bytes(&bytes)
        };

        match tokio::time::timeout(self.timeout, fetch).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Validation timed out for {}", url);
                Err(ExtractError::ValidationTimeout(self.timeout.as_secs()))
            }
        }
    }

    /// Confirm in-memory image bytes decode with usable dimensions.
    pub fn validate_bytes(&self, bytes: &[u8]) -> ExtractResult<ValidatedDimensions> {
        let (width, height) = validate_image_bytes(bytes)
            .map_err(|e| ExtractError::candidate_rejected(e.to_string()))?;
        Ok(ValidatedDimensions { width, height })
    }

    /// Confirm an image file on disk decodes with usable dimensions.
    pub async fn validate_file(&self, path: impl AsRef<Path>) -> ExtractResult<ValidatedDimensions> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        self.validate_bytes(&bytes)
    }
}
