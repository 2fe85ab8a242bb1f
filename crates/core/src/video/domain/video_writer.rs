use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sequential frame sink.
///
/// Opened with the source metadata so the output inherits its geometry
/// and frame rate; every written frame must match that geometry. The
/// file is not valid until `close` has flushed the encoder and written
/// the container trailer.
pub trait VideoWriter: Send {
    /// Failing here is one of the pipeline's two fatal open errors.
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Finalizes the file; source audio is remuxed in here as well.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
