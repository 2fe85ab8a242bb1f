use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::domain::transcript::TranscriptSegment;

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// Produces timestamped segments. The source language is auto-detected;
/// with translation enabled the output text is English.
#[derive(Debug)]
pub struct WhisperRecognizer {
    model_path: PathBuf,
    translate: bool,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !model_path.is_file() {
            return Err(format!("whisper model not found: {}", model_path.display()).into());
        }
        Ok(Self {
            model_path: model_path.to_path_buf(),
            translate: false,
        })
    }

    /// Translate recognized speech to English instead of transcribing it.
    pub fn with_translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn inference_params(&self) -> FullParams<'_, '_> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 0 });
        params.set_language(Some("auto"));
        params.set_translate(self.translate);
        params.set_token_timestamps(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(inference_threads());
        params
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(
        &self,
        audio: &AudioSegment,
    ) -> Result<Vec<TranscriptSegment>, Box<dyn std::error::Error>> {
        let model_str = self
            .model_path
            .to_str()
            .ok_or("whisper model path is not valid UTF-8")?;

        let ctx = WhisperContext::new_with_params(model_str, WhisperContextParameters::default())
            .map_err(|e| format!("loading whisper model: {e}"))?;
        let mut state = ctx
            .create_state()
            .map_err(|e| format!("creating whisper state: {e}"))?;

        state
            .full(self.inference_params(), audio.samples())
            .map_err(|e| format!("whisper inference: {e}"))?;

        let mut segments = Vec::new();
        for seg_idx in 0..state.full_n_segments() {
            let Some(segment) = state.get_segment(seg_idx) else {
                continue;
            };

            // Assemble the segment text from its raw token pieces so
            // inter-token spacing survives, tracking the first and last
            // kept token's timestamps (whisper reports centiseconds).
            let mut text = String::new();
            let mut start: Option<f64> = None;
            let mut end = 0.0f64;

            for tok_idx in 0..segment.n_tokens() {
                let Some(token) = segment.get_token(tok_idx) else {
                    continue;
                };
                let Ok(piece) = token.to_str() else {
                    continue;
                };

                // Special tokens render as [_BEG_], <|endoftext|> and so on.
                let trimmed = piece.trim();
                if trimmed.is_empty() || trimmed.starts_with('[') || trimmed.starts_with('<') {
                    continue;
                }

                let token_data = token.token_data();
                text.push_str(piece);
                if start.is_none() {
                    start = Some(token_data.t0 as f64 / 100.0);
                }
                end = end.max(token_data.t1 as f64 / 100.0);
            }

            let text = text.trim();
            if let (Some(start), false) = (start, text.is_empty()) {
                segments.push(TranscriptSegment {
                    start,
                    end: end.max(start),
                    text: text.to_string(),
                });
            }
        }
        Ok(segments)
    }
}

fn inference_threads() -> i32 {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores.min(4) as i32
}
