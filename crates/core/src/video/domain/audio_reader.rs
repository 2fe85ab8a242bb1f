use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;

/// Domain interface for decoding a file's audio track.
pub trait AudioReader: Send {
    /// Decodes the audio track to mono PCM at `sample_rate`.
    /// Returns `None` when the file has no audio track.
    fn read_audio(
        &self,
        path: &Path,
        sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>>;
}
