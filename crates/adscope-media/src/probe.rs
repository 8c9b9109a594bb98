//! FFprobe media inspection.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Probed media information.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration_secs: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Video codec name
    pub codec: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Number of embedded subtitle tracks
    pub subtitle_tracks: u32,
    /// Language tag of the first subtitle track, when recorded
    pub subtitle_language: Option<String>,
}

impl MediaInfo {
    /// True when at least one embedded caption track is present.
    pub fn has_captions(&self) -> bool {
        self.subtitle_tracks > 0
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    tags: Option<FfprobeStreamTags>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStreamTags {
    language: Option<String>,
}

/// Probe a media file for duration, dimensions, and caption tracks.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    run_ffprobe(&path.to_string_lossy(), path).await
}

/// Probe a remote URL directly, bounded by a timeout.
///
/// FFprobe reads http(s) inputs natively; hosts that block automated
/// access surface here as a probe failure, not a hang.
pub async fn probe_remote(url: &str, timeout_secs: u64) -> MediaResult<MediaInfo> {
    let probe = run_ffprobe(url, Path::new(url));
    match tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), probe).await {
        Ok(result) => result,
        Err(_) => Err(MediaError::Timeout(timeout_secs)),
    }
}

async fn run_ffprobe(input: &str, display: &Path) -> MediaResult<MediaInfo> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    parse_probe(display, probe)
}

fn parse_probe(path: &Path, probe: FfprobeOutput) -> MediaResult<MediaInfo> {
    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::NoVideoStream(path.to_path_buf()))?;

    let duration_secs = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size_bytes = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let subtitles: Vec<&FfprobeStream> = probe
        .streams
        .iter()
        .filter(|s| s.codec_type == "subtitle")
        .collect();
    let subtitle_language = subtitles
        .first()
        .and_then(|s| s.tags.as_ref())
        .and_then(|t| t.language.clone());

    let info = MediaInfo {
        duration_secs,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        codec: video_stream.codec_name.clone().unwrap_or_default(),
        size_bytes,
        subtitle_tracks: subtitles.len() as u32,
        subtitle_language,
    };
    debug!(
        "Probed {}: {:.1}s {}x{} {} ({} subtitle tracks)",
        path.display(),
        info.duration_secs,
        info.width,
        info.height,
        info.codec,
        info.subtitle_tracks
    );

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output(json: &str) -> FfprobeOutput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_probe_output() {
        let probe = sample_output(
            r#"{
                "format": {"duration": "10.050000", "size": "1048576"},
                "streams": [
                    {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080},
                    {"codec_type": "audio", "codec_name": "aac"},
                    {"codec_type": "subtitle", "codec_name": "mov_text", "tags": {"language": "eng"}}
                ]
            }"#,
        );

        let info = parse_probe(Path::new("ad.mp4"), probe).unwrap();
        assert!((info.duration_secs - 10.05).abs() < 1e-9);
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.codec, "h264");
        assert_eq!(info.subtitle_tracks, 1);
        assert_eq!(info.subtitle_language.as_deref(), Some("eng"));
        assert!(info.has_captions());
    }

    #[test]
    fn test_missing_video_stream() {
        let probe = sample_output(
            r#"{"format": {}, "streams": [{"codec_type": "audio", "codec_name": "mp3"}]}"#,
        );
        let err = parse_probe(Path::new("audio.mp3"), probe).unwrap_err();
        assert!(matches!(err, MediaError::NoVideoStream(_)));
    }

    #[test]
    fn test_tolerates_missing_fields() {
        let probe =
            sample_output(r#"{"format": {}, "streams": [{"codec_type": "video"}]}"#);
        let info = parse_probe(Path::new("odd.webm"), probe).unwrap();
        assert_eq!(info.duration_secs, 0.0);
        assert_eq!(info.width, 0);
        assert!(!info.has_captions());
    }
}
