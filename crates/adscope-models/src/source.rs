//! Video source classification types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::platform::Platform;

/// Unique identifier for one extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the input reference was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A locally supplied video binary
    LocalFile,
    /// A URL pointing at a raw video file (or an unrecognized host)
    DirectUrl,
    /// A URL on a recognized video platform
    PlatformUrl,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::LocalFile => "local_file",
            SourceKind::DirectUrl => "direct_url",
            SourceKind::PlatformUrl => "platform_url",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified video source. Created once per extraction request and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoSource {
    /// Source classification
    pub kind: SourceKind,

    /// Recognized platform, when `kind` is `platform_url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// The raw reference as supplied (file path or URL)
    pub raw_reference: String,

    /// Platform-specific video identifier, when one could be extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl VideoSource {
    /// Create a local-file source.
    pub fn local_file(path: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::LocalFile,
            platform: None,
            raw_reference: path.into(),
            video_id: None,
        }
    }

    /// Create a direct-URL source.
    pub fn direct_url(url: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::DirectUrl,
            platform: None,
            raw_reference: url.into(),
            video_id: None,
        }
    }

    /// Create a platform-URL source.
    pub fn platform_url(
        url: impl Into<String>,
        platform: Platform,
        video_id: Option<String>,
    ) -> Self {
        Self {
            kind: SourceKind::PlatformUrl,
            platform: Some(platform),
            raw_reference: url.into(),
            video_id,
        }
    }

    /// Returns true if this source can be decoded in-process without a
    /// network fetch.
    pub fn is_local(&self) -> bool {
        self.kind == SourceKind::LocalFile
    }
}
