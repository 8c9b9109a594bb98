//! FFmpeg CLI wrapper for in-process video decoding.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner with bounded timeouts and cancellation via tokio
//! - FFprobe media inspection
//! - Letterboxed frame capture at planned timestamps
//! - Embedded caption track extraction
//! - Image header decoding for asset validation

pub mod captions;
pub mod command;
pub mod error;
pub mod frames;
pub mod probe;
pub mod validate;

pub use captions::extract_embedded_captions;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frames::{capture_frame, sample_frames, CapturedFrame};
pub use probe::{probe_media, probe_remote, MediaInfo};
pub use validate::{image_dimensions, validate_image_bytes};
