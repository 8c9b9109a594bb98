//! Embedded caption track extraction.

use std::path::Path;
use tokio::sync::watch;
use tracing::debug;

use crate::command::{path_arg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::MediaInfo;

/// Extract the first embedded subtitle track as WebVTT text.
///
/// Callers should probe first; this returns [`MediaError::NoCaptionTrack`]
/// when the container has no subtitle stream, and treats an empty
/// conversion result the same way.
pub async fn extract_embedded_captions(
    input: impl AsRef<Path>,
    info: &MediaInfo,
    timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
) -> MediaResult<String> {
    if !info.has_captions() {
        return Err(MediaError::NoCaptionTrack);
    }

    let input = input.as_ref();
    let cmd = FfmpegCommand::new(path_arg(input), "-")
        .map_stream("0:s:0")
        .format("webvtt")
        .log_level("error");

    let mut runner = FfmpegRunner::new().with_timeout(timeout_secs);
    if let Some(rx) = cancel_rx {
        runner = runner.with_cancel(rx);
    }
    let stdout = runner.run_capturing(&cmd).await?;

    let text = String::from_utf8_lossy(&stdout).trim().to_string();
    if text.is_empty() || !has_cue_content(&text) {
        return Err(MediaError::NoCaptionTrack);
    }

    debug!(
        "Extracted {} bytes of WebVTT captions from {}",
        text.len(),
        input.display()
    );
    Ok(text)
}

/// A WebVTT document with only the header carries no usable captions.
fn has_cue_content(webvtt: &str) -> bool {
    webvtt.lines().any(|line| line.contains("-->"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_detection() {
        assert!(has_cue_content(
            "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nBig sale this week"
        ));
        assert!(!has_cue_content("WEBVTT\n\n"));
        assert!(!has_cue_content(""));
    }
}
