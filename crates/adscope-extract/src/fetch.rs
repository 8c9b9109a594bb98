//! Shared, once-only download of a direct-URL source.
//!
//! The frames, metadata, and transcript chains all need the fetched copy.
//! The download runs at most once per request through a `OnceCell`; the
//! stored outcome is read-only afterwards, so kind tasks share a value,
//! never a mutable slot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{ExtractError, ExtractResult};

/// HTTP statuses classified as access denial rather than plain failure.
fn is_access_denial(status: StatusCode) -> bool {
    matches!(status.as_u16(), 401 | 403 | 451)
}

/// Cloneable failure record stored in the cell.
#[derive(Debug, Clone)]
enum FetchFailure {
    AccessBlocked { status: u16 },
    LoadFailed(String),
}

impl From<&FetchFailure> for ExtractError {
    fn from(failure: &FetchFailure) -> Self {
        match failure {
            FetchFailure::AccessBlocked { status } => {
                ExtractError::CorsBlocked { status: *status }
            }
            FetchFailure::LoadFailed(message) => ExtractError::LoadFailed(message.clone()),
        }
    }
}

/// A direct-URL download shared across asset-kind tasks.
pub struct SharedFetch {
    url: String,
    client: Client,
    timeout: Duration,
    max_bytes: u64,
    destination: PathBuf,
    cell: OnceCell<Result<PathBuf, FetchFailure>>,
}

impl SharedFetch {
    /// Prepare a shared fetch; nothing is downloaded until first use.
    pub fn new(
        url: impl Into<String>,
        client: Client,
        timeout: Duration,
        max_bytes: u64,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            client,
            timeout,
            max_bytes,
            destination: destination.into(),
            cell: OnceCell::new(),
        }
    }

    /// Get the fetched copy, downloading on first call.
    ///
    /// Subsequent calls return the same outcome without touching the
    /// network again, including after failure.
    pub async fn get(&self) -> ExtractResult<&Path> {
        let outcome = self
            .cell
            .get_or_init(|| async { self.download().await })
            .await;
        match outcome {
            Ok(path) => Ok(path.as_path()),
            Err(failure) => Err(failure.into()),
        }
    }

    async fn download(&self) -> Result<PathBuf, FetchFailure> {
        debug!("Fetching direct URL {}", self.url);

        let transfer = async {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| FetchFailure::LoadFailed(format!("request failed: {}", e)))?;

            let status = response.status();
            if is_access_denial(status) {
                return Err(FetchFailure::AccessBlocked {
                    status: status.as_u16(),
                });
            }
            if !status.is_success() {
                return Err(FetchFailure::LoadFailed(format!("HTTP {}", status.as_u16())));
            }

            if let Some(length) = response.content_length() {
                if length > self.max_bytes {
                    return Err(FetchFailure::LoadFailed(format!(
                        "source too large: {} bytes",
                        length
                    )));
                }
            }

            let mut file = tokio::fs::File::create(&self.destination)
                .await
                .map_err(|e| FetchFailure::LoadFailed(format!("cannot write copy: {}", e)))?;
            let mut written: u64 = 0;
            let mut response = response;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| FetchFailure::LoadFailed(format!("transfer failed: {}", e)))?
            {
                written += chunk.len() as u64;
                if written > self.max_bytes {
                    return Err(FetchFailure::LoadFailed(format!(
                        "source exceeded {} bytes",
                        self.max_bytes
                    )));
                }
                file.write_all(&chunk)
                    .await
                    .map_err(|e| FetchFailure::LoadFailed(format!("cannot write copy: {}", e)))?;
            }
            file.flush()
                .await
                .map_err(|e| FetchFailure::LoadFailed(format!("cannot write copy: {}", e)))?;

            debug!("Fetched {} bytes from {}", written, self.url);
            Ok(self.destination.clone())
        };

        let outcome = match tokio::time::timeout(self.timeout, transfer).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchFailure::LoadFailed(format!(
                "download timed out after {}s",
                self.timeout.as_secs()
            ))),
        };

        if let Err(failure) = &outcome {
            warn!("Direct fetch of {} failed: {:?}", self.url, failure);
            let _ = tokio::fs::remove_file(&self.destination).await;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denial_statuses() {
        assert!(is_access_denial(StatusCode::FORBIDDEN));
        assert!(is_access_denial(StatusCode::UNAUTHORIZED));
        assert!(is_access_denial(StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS));
        assert!(!is_access_denial(StatusCode::NOT_FOUND));
        assert!(!is_access_denial(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
