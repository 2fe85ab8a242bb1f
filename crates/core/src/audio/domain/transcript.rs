use serde::Serialize;

/// A stretch of recognized speech with start/end times in seconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}
