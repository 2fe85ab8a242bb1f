use std::path::PathBuf;
use std::process;

use clap::Parser;

use personguard_core::audio::infrastructure::whisper_recognizer::WhisperRecognizer;
use personguard_core::detection::infrastructure::model_resolver;
use personguard_core::pipeline::transcribe_video_use_case::TranscribeVideoUseCase;
use personguard_core::shared::constants::{WHISPER_MODEL_NAME, WHISPER_MODEL_URL};
use personguard_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;

/// Speech transcription for video files, printed as JSON.
#[derive(Parser)]
#[command(name = "personguard-transcribe")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Target language; "en" translates the speech to English.
    target_lang: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }

    let translate = cli
        .target_lang
        .as_deref()
        .is_some_and(|lang| matches!(lang.to_lowercase().as_str(), "en" | "eng" | "english"));
    if let Some(lang) = cli.target_lang.as_deref() {
        if !translate {
            log::warn!("only English translation is supported, ignoring target language '{lang}'");
        }
    }

    log::info!("resolving {WHISPER_MODEL_NAME}");
    let progress: model_resolver::ProgressFn = Box::new(download_progress);
    let model_path =
        model_resolver::resolve(WHISPER_MODEL_NAME, WHISPER_MODEL_URL, None, Some(progress))?;
    eprintln!();

    let recognizer = WhisperRecognizer::new(&model_path)?.with_translate(translate);

    let use_case = TranscribeVideoUseCase::new(Box::new(FfmpegAudioReader), Box::new(recognizer));
    let segments = use_case.execute(&cli.input)?;

    let doc = serde_json::json!({ "segments": segments });
    println!("{}", serde_json::to_string_pretty(&doc)?);

    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading speech model... {pct}%");
    } else {
        eprint!("\rDownloading speech model... {downloaded} bytes");
    }
}
