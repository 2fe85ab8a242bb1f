use std::path::PathBuf;
use std::process;

use clap::Parser;

use personguard_core::blurring::infrastructure::gaussian_redactor::GaussianRedactor;
use personguard_core::detection::domain::box_smoother::BoxSmoother;
use personguard_core::detection::infrastructure::model_resolver;
use personguard_core::detection::infrastructure::onnx_person_detector::OnnxPersonDetector;
use personguard_core::pipeline::pipeline_logger::LogPipelineLogger;
use personguard_core::pipeline::redact_video_use_case::RedactVideoUseCase;
use personguard_core::shared::constants::{YOLO_MODEL_NAME, YOLO_MODEL_URL};
use personguard_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use personguard_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Automatic person blurring for videos.
#[derive(Parser)]
#[command(name = "personguard")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Output video file.
    output: PathBuf,
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

    log::info!("resolving {YOLO_MODEL_NAME}");
    let progress: model_resolver::ProgressFn = Box::new(download_progress);
    let model_path =
        model_resolver::resolve(YOLO_MODEL_NAME, YOLO_MODEL_URL, None, Some(progress))?;
    eprintln!();

    let detector = OnnxPersonDetector::new(&model_path)?;

    let use_case = RedactVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        Box::new(detector),
        Box::new(GaussianRedactor::default()),
        BoxSmoother::default(),
        Box::new(LogPipelineLogger::default()),
    );

    let frames = use_case.execute(&cli.input, &cli.output)?;
    log::info!("redacted {frames} frames to {}", cli.output.display());

    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading person detection model... {pct}%");
    } else {
        eprint!("\rDownloading person detection model... {downloaded} bytes");
    }
}
