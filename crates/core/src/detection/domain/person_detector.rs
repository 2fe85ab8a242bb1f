use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for object detection on a single frame.
///
/// Implementations keep no frame-to-frame state; `&mut self` only
/// accommodates inference sessions that want exclusive access.
pub trait PersonDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
