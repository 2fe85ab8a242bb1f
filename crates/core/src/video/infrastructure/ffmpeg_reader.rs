use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Frame rate assumed when the container does not declare one.
const FALLBACK_FPS: f64 = 25.0;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Every decoded frame is converted to packed RGB24 before it leaves
/// this module.
pub struct FfmpegReader {
    input: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time. The
// raw pointers inside ffmpeg types are never shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input: None,
            video_stream_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let input = ffmpeg_next::format::input(path)?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("no video stream found")?;
        let stream_index = stream.index();

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;

        let fps = declared_fps(&stream).unwrap_or_else(|| {
            log::warn!(
                "{} declares no frame rate, assuming {FALLBACK_FPS}",
                path.display()
            );
            FALLBACK_FPS
        });

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder.codec().map(|c| c.name().to_string()).unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        self.video_stream_index = stream_index;
        self.input = Some(input);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(input) = self.input.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        match FfmpegFrameIter::build(input, self.video_stream_index) {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input = None;
    }
}

/// Frame rate the stream declares, if it declares a valid one.
fn declared_fps(stream: &ffmpeg_next::format::stream::Stream) -> Option<f64> {
    let rate = stream.rate();
    if rate.denominator() != 0 && rate.numerator() > 0 {
        Some(f64::from(rate.numerator()) / f64::from(rate.denominator()))
    } else {
        None
    }
}

/// Lazy decode iterator: one frame is held in memory at a time.
struct FfmpegFrameIter<'a> {
    input: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    next_index: usize,
    flushing: bool,
    done: bool,
}

impl<'a> FfmpegFrameIter<'a> {
    fn build(
        input: &'a mut ffmpeg_next::format::context::Input,
        video_stream_index: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = input
            .stream(video_stream_index)
            .ok_or("video stream disappeared after open")?;
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
            .decoder()
            .video()?;
        let (width, height) = (decoder.width(), decoder.height());

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            input,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            next_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut raw = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut raw).is_err() {
            return None;
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&raw, &mut rgb) {
            return Some(Err(Box::new(e)));
        }

        let index = self.next_index;
        self.next_index += 1;
        let pixels = strip_stride(&rgb, self.width, self.height);
        Some(Ok(Frame::new(pixels, self.width, self.height, 3, index)))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    /// Pumps packets into the decoder until a frame comes out. After the
    /// input is exhausted the decoder is flushed and drained.
    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.try_receive() {
                Some(result) => return Some(result),
                None if self.flushing => {
                    self.done = true;
                    return None;
                }
                None => {}
            }

            let next_packet = self.input.packets().next();
            match next_packet {
                Some((stream, packet)) if stream.index() == self.video_stream_index => {
                    // A corrupt packet is skipped, not fatal.
                    let _ = self.decoder.send_packet(&packet);
                }
                Some(_) => {}
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
        None
    }
}

/// Copies an RGB24 ffmpeg frame into a tightly packed buffer.
///
/// ffmpeg rows can carry trailing padding (stride > width * 3); the rest
/// of the crate assumes none.
fn strip_stride(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
