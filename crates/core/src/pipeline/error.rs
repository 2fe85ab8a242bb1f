use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline failures.
///
/// Anything not listed here is treated as a per-frame condition: the
/// pipeline logs it and carries on with no boxes for that frame.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot open input video {path}: {reason}")]
    SourceOpen { path: PathBuf, reason: String },

    #[error("cannot open output video {path}: {reason}")]
    SinkOpen { path: PathBuf, reason: String },

    #[error("cannot encode output video {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}
