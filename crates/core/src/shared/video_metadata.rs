use std::path::PathBuf;

/// Stream properties discovered when a source is opened.
///
/// The sink inherits `width`, `height`, and `fps` unchanged so the output
/// matches the input geometry exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// 0 when the container does not declare a frame count.
    pub total_frames: usize,
    pub codec: String,
    /// Where the frames came from, so the sink can remux the original audio.
    pub source_path: Option<PathBuf>,
}
