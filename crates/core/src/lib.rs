//! Core library for automatic person redaction in video.
//!
//! Detects people with a YOLOv8 ONNX model, blurs their head regions,
//! and re-encodes the video with the original audio. A separate path
//! transcribes the audio track with whisper.cpp.

pub mod audio;
pub mod blurring;
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod video;
