//! Letterboxed frame capture at planned timestamps.

use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, warn};

use adscope_models::sampling::{FRAME_MAX_HEIGHT, FRAME_MAX_WIDTH};

use crate::command::{path_arg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// One frame captured from a video.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Timestamp the frame was seeked to, in seconds
    pub timestamp: f64,
    /// Where the JPEG was written
    pub path: PathBuf,
}

/// Scale filter: downscale into the frame bound preserving aspect ratio,
/// letterboxed on black.
fn letterbox_filter(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black",
        w = width,
        h = height
    )
}

/// Capture a single letterboxed frame at the given timestamp.
///
/// The seek is bounded by `seek_timeout_secs`; expiry or a decode error at
/// this timestamp returns an error and leaves no output file behind.
pub async fn capture_frame(
    input: impl AsRef<Path>,
    timestamp: f64,
    output: impl AsRef<Path>,
    seek_timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
) -> MediaResult<CapturedFrame> {
    let input = input.as_ref();
    let output = output.as_ref();

    let cmd = FfmpegCommand::new(path_arg(input), path_arg(output))
        .seek(timestamp)
        .single_frame()
        .video_filter(letterbox_filter(FRAME_MAX_WIDTH, FRAME_MAX_HEIGHT))
        .log_level("error");

    let mut runner = FfmpegRunner::new().with_timeout(seek_timeout_secs);
    if let Some(rx) = cancel_rx {
        runner = runner.with_cancel(rx);
    }
    runner.run(&cmd).await?;

    // FFmpeg can exit zero without producing output when the seek lands
    // past the last decodable frame.
    let produced = tokio::fs::metadata(output)
        .await
        .map(|m| m.len() > 0)
        .unwrap_or(false);
    if !produced {
        return Err(MediaError::decode_failed(format!(
            "no frame produced at {:.3}s",
            timestamp
        )));
    }

    Ok(CapturedFrame {
        timestamp,
        path: output.to_path_buf(),
    })
}

/// Capture frames at each planned timestamp into `output_dir`.
///
/// Seeks run strictly sequentially. A failed or timed-out seek is skipped,
/// not fatal; the returned list holds only the frames actually captured.
/// Cancellation aborts the remaining seeks with [`MediaError::Cancelled`].
pub async fn sample_frames(
    input: impl AsRef<Path>,
    timestamps: &[f64],
    output_dir: impl AsRef<Path>,
    seek_timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
) -> MediaResult<Vec<CapturedFrame>> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let mut frames = Vec::with_capacity(timestamps.len());
    for (index, &timestamp) in timestamps.iter().enumerate() {
        let output = output_dir.join(format!("frame_{:02}.jpg", index));
        match capture_frame(
            input,
            timestamp,
            &output,
            seek_timeout_secs,
            cancel_rx.clone(),
        )
        .await
        {
            Ok(frame) => {
                debug!("Captured frame at {:.3}s: {}", timestamp, output.display());
                frames.push(frame);
            }
            Err(MediaError::Cancelled) => return Err(MediaError::Cancelled),
            Err(err) => {
                warn!("Skipping frame at {:.3}s: {}", timestamp, err);
            }
        }
    }

    Ok(frames)
}
