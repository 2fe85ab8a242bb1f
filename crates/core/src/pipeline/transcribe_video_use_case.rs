use std::path::Path;

use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::domain::transcript::TranscriptSegment;
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::video::domain::audio_reader::AudioReader;

/// Extracts the audio track of a video and transcribes it.
pub struct TranscribeVideoUseCase {
    audio_reader: Box<dyn AudioReader>,
    recognizer: Box<dyn SpeechRecognizer>,
}

impl TranscribeVideoUseCase {
    pub fn new(audio_reader: Box<dyn AudioReader>, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self {
            audio_reader,
            recognizer,
        }
    }

    pub fn execute(
        &self,
        input: &Path,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
        let audio = self
            .audio_reader
            .read_audio(input, WHISPER_SAMPLE_RATE)?
            .ok_or("input has no audio track")?;

        log::info!("transcribing {:.1}s of audio", audio.duration());
        self.recognizer.transcribe(&audio)
    }
}
