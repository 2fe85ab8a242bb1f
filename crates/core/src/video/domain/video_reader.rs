use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sequential frame source.
///
/// `open` discovers the stream geometry and frame rate; `frames` then
/// yields decoded frames in stream order until end-of-stream. The
/// pipeline never seeks.
pub trait VideoReader: Send {
    /// Opens the input and returns its metadata. Failing here is one of
    /// the pipeline's two fatal open errors.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Iterator over decoded frames, in order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases decoder and file handles.
    fn close(&mut self);
}
