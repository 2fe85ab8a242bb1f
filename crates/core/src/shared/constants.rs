pub const YOLO_MODEL_NAME: &str = "yolov8n.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/personguard/personguard/releases/download/v0.1.0/yolov8n.onnx";

/// COCO class index for "person".
pub const PERSON_CLASS_ID: usize = 0;

/// Minimum detector confidence for a box to be redacted (inclusive).
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Max consecutive detection-free frames the last known boxes are held.
pub const MAX_HELD_FRAMES: usize = 5;

/// Fraction of the body box height treated as the head.
pub const HEAD_HEIGHT_RATIO: f64 = 0.5;

/// Margin added around the head rectangle, as a fraction of its extent.
pub const HEAD_PADDING_RATIO: f64 = 0.15;

pub const BLUR_KERNEL_SIZE: usize = 51;
pub const BLUR_SIGMA: f64 = 30.0;

/// Emit a progress line every this many processed frames.
pub const PROGRESS_INTERVAL: usize = 30;

pub const WHISPER_MODEL_NAME: &str = "ggml-small.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin";
pub const WHISPER_SAMPLE_RATE: u32 = 16000;
