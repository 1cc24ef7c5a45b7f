//! FFmpeg CLI wrapper for assembling narrated videos.
//!
//! This crate provides:
//! - A multi-input FFmpeg command builder
//! - An async runner with timeout and progress parsing
//! - The intro + main clip compositor and its pacing rule

pub mod command;
pub mod compositor;
pub mod error;
pub mod progress;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use compositor::{CompositionRequest, FfmpegCompositor, Pacing, VideoCompositor};
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
