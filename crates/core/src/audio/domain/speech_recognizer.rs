use super::audio_segment::AudioSegment;
use super::transcript::TranscriptSegment;

/// Domain interface for turning decoded audio into text.
///
/// Implementations run inference on the whole segment and return
/// timestamped transcript entries in playback order.
pub trait SpeechRecognizer: Send {
    fn transcribe(
        &self,
        audio: &AudioSegment,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>>;
}
