pub mod error;
pub mod pipeline_logger;
pub mod redact_video_use_case;
pub mod transcribe_video_use_case;
