//! Extraction pipeline configuration.
//!
//! All configuration is passed explicitly at construction time; no
//! component reads ambient global state. `from_env` exists as a
//! convenience constructor for the invoking application.

use std::path::PathBuf;
use std::time::Duration;

/// Default generic embed-metadata aggregator (fallback after the
/// platform's own oEmbed endpoint).
pub const DEFAULT_OEMBED_FALLBACK: &str = "https://noembed.com/embed";

/// Default transformation service root.
pub const DEFAULT_TRANSFORM_BASE: &str = "https://res.cloudinary.com";

/// External image/video transformation service credentials.
#[derive(Debug, Clone)]
pub struct TransformServiceConfig {
    /// Account identifier encoded into the transformation URL path
    pub cloud_name: String,
    /// Service root URL
    pub base_url: String,
}

impl TransformServiceConfig {
    /// Create a config against the default service root.
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            base_url: DEFAULT_TRANSFORM_BASE.to_string(),
        }
    }

    /// Override the service root (used by tests and self-hosted proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Extraction pipeline configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Transformation service; `None` skips that strategy entirely
    pub transform: Option<TransformServiceConfig>,

    /// Generic embed-metadata fallback endpoint
    pub oembed_fallback_base: String,

    /// Timeout for remote metadata and image fetches
    pub fetch_timeout: Duration,

    /// Timeout for the direct-URL file download
    pub download_timeout: Duration,

    /// Per-seek timeout for frame capture, in seconds
    pub seek_timeout_secs: u64,

    /// Timeout for a single asset validation (fetch + decode)
    pub validation_timeout: Duration,

    /// Maximum accepted size for a direct-URL download
    pub max_download_bytes: u64,

    /// Directory extraction artifacts are written under (one subdirectory
    /// per request; the caller owns cleanup)
    pub work_dir: PathBuf,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            transform: None,
            oembed_fallback_base: DEFAULT_OEMBED_FALLBACK.to_string(),
            fetch_timeout: Duration::from_secs(8),
            download_timeout: Duration::from_secs(60),
            seek_timeout_secs: 8,
            validation_timeout: Duration::from_secs(5),
            max_download_bytes: 200 * 1024 * 1024, // 200MB
            work_dir: std::env::temp_dir().join("adscope"),
        }
    }
}

impl ExtractorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            transform: std::env::var("ADSCOPE_TRANSFORM_CLOUD_NAME")
                .ok()
                .filter(|name| !name.is_empty())
                .map(TransformServiceConfig::new),
            oembed_fallback_base: std::env::var("ADSCOPE_OEMBED_FALLBACK")
                .unwrap_or(defaults.oembed_fallback_base),
            fetch_timeout: env_secs("ADSCOPE_FETCH_TIMEOUT").unwrap_or(defaults.fetch_timeout),
            download_timeout: env_secs("ADSCOPE_DOWNLOAD_TIMEOUT")
                .unwrap_or(defaults.download_timeout),
            seek_timeout_secs: std::env::var("ADSCOPE_SEEK_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.seek_timeout_secs),
            validation_timeout: env_secs("ADSCOPE_VALIDATION_TIMEOUT")
                .unwrap_or(defaults.validation_timeout),
            max_download_bytes: std::env::var("ADSCOPE_MAX_DOWNLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_download_bytes),
            work_dir: std::env::var("ADSCOPE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
        }
    }

    /// Set the transformation service.
    pub fn with_transform(mut self, transform: TransformServiceConfig) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the work directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::default();
        assert!(config.transform.is_none());
        assert_eq!(config.oembed_fallback_base, DEFAULT_OEMBED_FALLBACK);
        assert!(config.seek_timeout_secs > 0);
    }

    #[test]
    fn test_transform_builder() {
        let config = ExtractorConfig::default()
            .with_transform(TransformServiceConfig::new("demo-cloud"));
        let transform = config.transform.unwrap();
        assert_eq!(transform.cloud_name, "demo-cloud");
        assert_eq!(transform.base_url, DEFAULT_TRANSFORM_BASE);

        let local = TransformServiceConfig::new("demo").with_base_url("http://127.0.0.1:9000");
        assert_eq!(local.base_url, "http://127.0.0.1:9000");
    }
}
