//! Extraction error taxonomy.
//!
//! Only [`ExtractError::InvalidReference`] and [`ExtractError::Cancelled`]
//! reach the caller of the pipeline. Every other variant is absorbed inside
//! an asset-kind task and converted into a fallback attempt or a
//! [`Limitation`](adscope_models::Limitation) entry.

use thiserror::Error;

use adscope_media::MediaError;

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that can occur during extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Cannot decode source: {0}")]
    DecodeFailed(String),

    #[error("Cross-origin access blocked (HTTP {status})")]
    CorsBlocked { status: u16 },

    #[error("Remote load failed: {0}")]
    LoadFailed(String),

    #[error("Transform service not configured")]
    ServiceUnconfigured,

    #[error("Remote host blocked transformation fetches: {0}")]
    RemoteFetchBlocked(String),

    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Validation timed out after {0} seconds")]
    ValidationTimeout(u64),

    #[error("Candidate rejected: {0}")]
    CandidateRejected(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Create an invalid-reference error.
    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::InvalidReference(message.into())
    }

    /// Create a decode failure.
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    /// Create a remote load failure.
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed(message.into())
    }

    /// Create a metadata-unavailable error.
    pub fn metadata_unavailable(message: impl Into<String>) -> Self {
        Self::MetadataUnavailable(message.into())
    }

    /// Create a remote-fetch-blocked error.
    pub fn remote_fetch_blocked(message: impl Into<String>) -> Self {
        Self::RemoteFetchBlocked(message.into())
    }

    /// Create a candidate-rejected error.
    pub fn candidate_rejected(message: impl Into<String>) -> Self {
        Self::CandidateRejected(message.into())
    }

    /// True when uploading the source file directly would likely succeed
    /// where this failure occurred.
    pub fn suggests_upload(&self) -> bool {
        matches!(
            self,
            ExtractError::CorsBlocked { .. }
                | ExtractError::LoadFailed(_)
                | ExtractError::RemoteFetchBlocked(_)
        )
    }

    /// True when this failure is fatal to the whole request rather than to
    /// a single strategy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractError::InvalidReference(_) | ExtractError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_suggestion() {
        assert!(ExtractError::CorsBlocked { status: 403 }.suggests_upload());
        assert!(ExtractError::load_failed("404").suggests_upload());
        assert!(!ExtractError::ServiceUnconfigured.suggests_upload());
        assert!(!ExtractError::metadata_unavailable("x").suggests_upload());
    }

    #[test]
    fn test_fatality() {
        assert!(ExtractError::invalid_reference("not a url").is_fatal());
        assert!(ExtractError::Cancelled.is_fatal());
        assert!(!ExtractError::decode_failed("bad mp4").is_fatal());
        assert!(!ExtractError::ValidationTimeout(5).is_fatal());
    }
}
