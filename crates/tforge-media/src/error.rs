//! Error types for video assembly.

use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    /// FFmpeg ran and exited unsuccessfully. `stderr` holds the tail of its log.
    #[error("FFmpeg exited with {}: {}", exit_label(.exit_code), last_line(.stderr))]
    FfmpegFailed { exit_code: Option<i32>, stderr: String },

    #[error("Composition input missing: {0}")]
    MissingInput(PathBuf),

    #[error("FFmpeg timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("status {}", c))
}

fn last_line(stderr: &str) -> &str {
    stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("no output")
}
