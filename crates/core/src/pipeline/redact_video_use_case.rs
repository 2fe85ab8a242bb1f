use std::path::Path;

use crate::blurring::domain::frame_redactor::FrameRedactor;
use crate::detection::domain::box_smoother::BoxSmoother;
use crate::detection::domain::detection_filter::filter_detections;
use crate::detection::domain::person_detector::PersonDetector;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::error::PipelineError;
use super::pipeline_logger::PipelineLogger;

/// Orchestrates the full person redaction pipeline.
///
/// Frames flow strictly one at a time: decode, detect, filter, smooth,
/// redact, encode. `execute` consumes the use case, so a second run
/// needs a fresh one.
///
/// Only a source or sink that cannot be opened, or an encode failure,
/// aborts the run. Per-frame detection failures degrade to "no boxes"
/// and a mid-stream decode failure is treated as end of stream.
pub struct RedactVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    detector: Box<dyn PersonDetector>,
    redactor: Box<dyn FrameRedactor>,
    smoother: BoxSmoother,
    logger: Box<dyn PipelineLogger>,
}

impl RedactVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn PersonDetector>,
        redactor: Box<dyn FrameRedactor>,
        smoother: BoxSmoother,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            detector,
            redactor,
            smoother,
            logger,
        }
    }

    /// Runs the pipeline from `input` to `output` and returns the
    /// number of frames written.
    pub fn execute(mut self, input: &Path, output: &Path) -> Result<usize, PipelineError> {
        let metadata = match self.reader.open(input) {
            Ok(m) => m,
            Err(e) => {
                return Err(PipelineError::SourceOpen {
                    path: input.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        let declared = if metadata.total_frames > 0 {
            format!("{} frames", metadata.total_frames)
        } else {
            "unknown length".to_string()
        };
        self.logger.info(&format!(
            "input {}: {}x{}, {:.1} fps, {declared}",
            input.display(),
            metadata.width,
            metadata.height,
            metadata.fps
        ));

        if let Err(e) = self.writer.open(output, &metadata) {
            self.reader.close();
            return Err(PipelineError::SinkOpen {
                path: output.to_path_buf(),
                reason: e.to_string(),
            });
        }

        let total = metadata.total_frames;
        let mut processed = 0usize;
        let mut failure: Option<PipelineError> = None;

        {
            let frames = self.reader.frames();
            for result in frames {
                let mut frame = match result {
                    Ok(f) => f,
                    Err(e) => {
                        log::warn!("decode failed after {processed} frames: {e}, stopping early");
                        break;
                    }
                };

                let detections = match self.detector.detect(&frame) {
                    Ok(d) => d,
                    Err(e) => {
                        log::warn!("detection failed on frame {}: {e}", frame.index());
                        Vec::new()
                    }
                };

                let boxes = filter_detections(&detections, frame.width(), frame.height());
                let boxes = self.smoother.smooth(boxes);
                self.redactor.redact(&mut frame, &boxes);

                if let Err(e) = self.writer.write(&frame) {
                    failure = Some(PipelineError::Encode {
                        path: output.to_path_buf(),
                        reason: e.to_string(),
                    });
                    break;
                }

                processed += 1;
                self.logger.progress(processed, total);
            }
        }

        self.reader.close();

        if let Some(err) = failure {
            if let Err(close_err) = self.writer.close() {
                log::warn!("closing output after failure also failed: {close_err}");
            }
            return Err(err);
        }

        if let Err(e) = self.writer.close() {
            return Err(PipelineError::Encode {
                path: output.to_path_buf(),
                reason: e.to_string(),
            });
        }

        self.logger.summary();
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection::Detection;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::frame::Frame;
    use crate::shared::person_box::PersonBox;
    use crate::shared::video_metadata::VideoMetadata;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubReader {
        outcomes: Vec<Result<Frame, String>>,
        total_frames: usize,
        fail_open: bool,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn with_frames(count: usize) -> Self {
            Self {
                outcomes: (0..count).map(|i| Ok(make_frame(i))).collect(),
                total_frames: count,
                fail_open: false,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("container not readable".into());
            }
            Ok(VideoMetadata {
                width: 64,
                height: 48,
                fps: 30.0,
                total_frames: self.total_frames,
                codec: "stub".to_string(),
                source_path: None,
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.outcomes.drain(..).map(|r| r.map_err(Into::into)))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<Frame>>>,
        closed: Arc<Mutex<bool>>,
        open_called: Arc<Mutex<bool>>,
        fail_open: bool,
        fail_write_at: Option<usize>,
        fail_close: bool,
    }

    impl StubWriter {
        fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(false)),
                open_called: Arc::new(Mutex::new(false)),
                fail_open: false,
                fail_write_at: None,
                fail_close: false,
            }
        }
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            _path: &Path,
            _metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            *self.open_called.lock().unwrap() = true;
            if self.fail_open {
                return Err("sink open refused".into());
            }
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            let written_so_far = self.written.lock().unwrap().len();
            if self.fail_write_at == Some(written_so_far) {
                return Err("encode failed".into());
            }
            self.written.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            *self.closed.lock().unwrap() = true;
            if self.fail_close {
                return Err("trailer failed".into());
            }
            Ok(())
        }
    }

    struct StubDetector {
        results: HashMap<usize, Vec<Detection>>,
    }

    impl StubDetector {
        fn empty() -> Self {
            Self {
                results: HashMap::new(),
            }
        }
    }

    impl PersonDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            Ok(self
                .results
                .get(&frame.index())
                .cloned()
                .unwrap_or_default())
        }
    }

    struct FailingDetector;

    impl PersonDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            Err("inference exploded".into())
        }
    }

    #[allow(clippy::type_complexity)]
    struct RecordingRedactor {
        calls: Arc<Mutex<Vec<(usize, Vec<PersonBox>)>>>,
    }

    impl RecordingRedactor {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FrameRedactor for RecordingRedactor {
        fn redact(&self, frame: &mut Frame, boxes: &[PersonBox]) {
            self.calls
                .lock()
                .unwrap()
                .push((frame.index(), boxes.to_vec()));
        }
    }

    #[allow(clippy::type_complexity)]
    struct RecordingLogger {
        progress_calls: Arc<Mutex<Vec<(usize, usize)>>>,
        summaries: Arc<Mutex<usize>>,
    }

    impl RecordingLogger {
        fn new() -> Self {
            Self {
                progress_calls: Arc::new(Mutex::new(Vec::new())),
                summaries: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, current: usize, total: usize) {
            self.progress_calls.lock().unwrap().push((current, total));
        }

        fn info(&mut self, _message: &str) {}

        fn summary(&self) {
            *self.summaries.lock().unwrap() += 1;
        }
    }

    // --- Helpers ---

    fn make_frame(index: usize) -> Frame {
        let data = vec![(index * 7 % 256) as u8; 64 * 48 * 3];
        Frame::new(data, 64, 48, 3, index)
    }

    fn person(confidence: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Detection {
        Detection {
            class_id: 0,
            confidence,
            x1,
            y1,
            x2,
            y2,
        }
    }

    fn use_case(
        reader: StubReader,
        writer: StubWriter,
        detector: Box<dyn PersonDetector>,
    ) -> RedactVideoUseCase {
        RedactVideoUseCase::new(
            Box::new(reader),
            Box::new(writer),
            detector,
            Box::new(RecordingRedactor::new()),
            BoxSmoother::default(),
            Box::new(NullPipelineLogger),
        )
    }

    // --- Tests ---

    #[test]
    fn test_processes_all_frames() {
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let uc = use_case(
            StubReader::with_frames(5),
            writer,
            Box::new(StubDetector::empty()),
        );
        let count = uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        assert_eq!(count, 5);
        assert_eq!(written.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_frames_written_in_order() {
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let uc = use_case(
            StubReader::with_frames(10),
            writer,
            Box::new(StubDetector::empty()),
        );
        uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 10);
        for (i, frame) in written.iter().enumerate() {
            assert_eq!(frame.index(), i);
        }
    }

    #[test]
    fn test_no_detections_leaves_pixels_untouched() {
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let uc = use_case(
            StubReader::with_frames(3),
            writer,
            Box::new(StubDetector::empty()),
        );
        uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        let written = written.lock().unwrap();
        for (i, frame) in written.iter().enumerate() {
            assert_eq!(frame.data(), make_frame(i).data());
        }
    }

    #[test]
    fn test_empty_video_completes_with_zero_frames() {
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let writer_closed = writer.closed.clone();

        let uc = use_case(
            StubReader::with_frames(0),
            writer,
            Box::new(StubDetector::empty()),
        );
        let count = uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        assert_eq!(count, 0);
        assert!(written.lock().unwrap().is_empty());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_source_open_failure_is_fatal_before_sink_opens() {
        let mut reader = StubReader::with_frames(3);
        reader.fail_open = true;
        let writer = StubWriter::new();
        let open_called = writer.open_called.clone();

        let uc = use_case(reader, writer, Box::new(StubDetector::empty()));
        let err = uc
            .execute(Path::new("in.mp4"), Path::new("out.mp4"))
            .unwrap_err();

        assert!(matches!(err, PipelineError::SourceOpen { .. }));
        assert!(!*open_called.lock().unwrap());
    }

    #[test]
    fn test_sink_open_failure_is_fatal_and_releases_reader() {
        let reader = StubReader::with_frames(3);
        let reader_closed = reader.closed.clone();
        let mut writer = StubWriter::new();
        writer.fail_open = true;

        let uc = use_case(reader, writer, Box::new(StubDetector::empty()));
        let err = uc
            .execute(Path::new("in.mp4"), Path::new("out.mp4"))
            .unwrap_err();

        assert!(matches!(err, PipelineError::SinkOpen { .. }));
        assert!(*reader_closed.lock().unwrap());
    }

    #[test]
    fn test_detector_failure_degrades_to_no_boxes() {
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let redactor = RecordingRedactor::new();
        let calls = redactor.calls.clone();

        let uc = RedactVideoUseCase::new(
            Box::new(StubReader::with_frames(4)),
            Box::new(writer),
            Box::new(FailingDetector),
            Box::new(redactor),
            BoxSmoother::default(),
            Box::new(NullPipelineLogger),
        );
        let count = uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        assert_eq!(count, 4);
        assert_eq!(written.lock().unwrap().len(), 4);
        for (_, boxes) in calls.lock().unwrap().iter() {
            assert!(boxes.is_empty());
        }
    }

    #[test]
    fn test_decode_failure_mid_stream_ends_run_cleanly() {
        let mut reader = StubReader::with_frames(0);
        reader.outcomes = vec![
            Ok(make_frame(0)),
            Ok(make_frame(1)),
            Err("bitstream corrupt".to_string()),
            Ok(make_frame(3)),
        ];
        reader.total_frames = 4;
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let writer_closed = writer.closed.clone();

        let uc = use_case(reader, writer, Box::new(StubDetector::empty()));
        let count = uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        assert_eq!(count, 2);
        assert_eq!(written.lock().unwrap().len(), 2);
        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_write_failure_is_fatal_and_releases_both_ends() {
        let reader = StubReader::with_frames(5);
        let reader_closed = reader.closed.clone();
        let mut writer = StubWriter::new();
        writer.fail_write_at = Some(2);
        let written = writer.written.clone();
        let writer_closed = writer.closed.clone();

        let uc = use_case(reader, writer, Box::new(StubDetector::empty()));
        let err = uc
            .execute(Path::new("in.mp4"), Path::new("out.mp4"))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Encode { .. }));
        assert_eq!(written.lock().unwrap().len(), 2);
        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_close_failure_is_fatal() {
        let mut writer = StubWriter::new();
        writer.fail_close = true;

        let uc = use_case(
            StubReader::with_frames(2),
            writer,
            Box::new(StubDetector::empty()),
        );
        let err = uc
            .execute(Path::new("in.mp4"), Path::new("out.mp4"))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Encode { .. }));
    }

    #[test]
    fn test_non_person_detections_never_reach_redactor() {
        let mut results = HashMap::new();
        results.insert(
            0,
            vec![Detection {
                class_id: 56,
                confidence: 0.9,
                x1: 10.0,
                y1: 10.0,
                x2: 40.0,
                y2: 40.0,
            }],
        );
        let redactor = RecordingRedactor::new();
        let calls = redactor.calls.clone();

        let uc = RedactVideoUseCase::new(
            Box::new(StubReader::with_frames(1)),
            Box::new(StubWriter::new()),
            Box::new(StubDetector { results }),
            Box::new(redactor),
            BoxSmoother::default(),
            Box::new(NullPipelineLogger),
        );
        uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        assert!(calls.lock().unwrap()[0].1.is_empty());
    }

    #[test]
    fn test_held_boxes_bridge_detection_gaps() {
        // Person in frame 0 only; the smoother holds it for five more
        // frames, then frame 6 gets nothing.
        let mut results = HashMap::new();
        results.insert(0, vec![person(0.9, 10.0, 10.0, 50.0, 40.0)]);
        let redactor = RecordingRedactor::new();
        let calls = redactor.calls.clone();

        let uc = RedactVideoUseCase::new(
            Box::new(StubReader::with_frames(7)),
            Box::new(StubWriter::new()),
            Box::new(StubDetector { results }),
            Box::new(redactor),
            BoxSmoother::default(),
            Box::new(NullPipelineLogger),
        );
        uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 7);
        let expected = PersonBox {
            x: 10,
            y: 10,
            width: 40,
            height: 30,
        };
        for (index, boxes) in calls.iter().take(6) {
            assert_eq!(boxes.as_slice(), &[expected.clone()], "frame {index}");
        }
        assert!(calls[6].1.is_empty());
    }

    #[test]
    fn test_progress_reported_for_every_frame() {
        let logger = RecordingLogger::new();
        let progress = logger.progress_calls.clone();
        let summaries = logger.summaries.clone();

        let uc = RedactVideoUseCase::new(
            Box::new(StubReader::with_frames(3)),
            Box::new(StubWriter::new()),
            Box::new(StubDetector::empty()),
            Box::new(RecordingRedactor::new()),
            BoxSmoother::default(),
            Box::new(logger),
        );
        uc.execute(Path::new("in.mp4"), Path::new("out.mp4")).unwrap();

        assert_eq!(
            progress.lock().unwrap().as_slice(),
            &[(1, 3), (2, 3), (3, 3)]
        );
        assert_eq!(*summaries.lock().unwrap(), 1);
    }

    #[test]
    fn test_summary_skipped_when_run_fails() {
        let logger = RecordingLogger::new();
        let summaries = logger.summaries.clone();
        let mut writer = StubWriter::new();
        writer.fail_write_at = Some(0);

        let uc = RedactVideoUseCase::new(
            Box::new(StubReader::with_frames(3)),
            Box::new(writer),
            Box::new(StubDetector::empty()),
            Box::new(RecordingRedactor::new()),
            BoxSmoother::default(),
            Box::new(logger),
        );
        let _ = uc.execute(Path::new("in.mp4"), Path::new("out.mp4"));

        assert_eq!(*summaries.lock().unwrap(), 0);
    }
}
