pub mod audio_segment;
pub mod speech_recognizer;
pub mod transcript;
