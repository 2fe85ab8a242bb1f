use std::time::Instant;

use crate::shared::constants::PROGRESS_INTERVAL;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples the use case from a specific output mechanism so callers
/// can observe pipeline behavior without changing the orchestration
/// code.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is 0 when the container
    /// does not declare a frame count.
    fn progress(&mut self, current: usize, total: usize);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by tests where logger
/// output is irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger backed by the `log` crate.
///
/// Progress output is throttled to every `marker_interval` frames to
/// avoid excessive I/O on large videos.
pub struct LogPipelineLogger {
    marker_interval: usize,
    start_time: Instant,
    frames_seen: usize,
    total_frames: usize,
}

impl LogPipelineLogger {
    pub fn new(marker_interval: usize) -> Self {
        Self {
            marker_interval: marker_interval.max(1),
            start_time: Instant::now(),
            frames_seen: 0,
            total_frames: 0,
        }
    }

    fn at_marker(&self, current: usize) -> bool {
        current % self.marker_interval == 0
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(PROGRESS_INTERVAL)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        self.total_frames = total;

        if self.at_marker(current) {
            if total > 0 {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("processed {current}/{total} frames ({pct:.1}%)");
            } else {
                log::info!("processed {current} frames");
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let frames = self.frames_seen;
        if elapsed > 0.0 && frames > 0 {
            let fps = frames as f64 / elapsed;
            log::info!("done: {frames} frames in {elapsed:.1}s ({fps:.1} fps)");
        } else {
            log::info!("done: {frames} frames");
        }
    }
}
