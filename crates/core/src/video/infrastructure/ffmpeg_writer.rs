use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Encodes video frames via ffmpeg-next with built-in audio muxing.
///
/// Prefers H.264 and falls back to MPEG-4 when the build has no H.264
/// encoder. When the source video has an audio stream, it is copied
/// into the output on close — no separate ffmpeg binary or temp dir.
pub struct FfmpegWriter {
    pipeline: Option<EncodePipeline>,
    output_path: Option<PathBuf>,
    source_path: Option<PathBuf>,
    frames_written: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            pipeline: None,
            output_path: None,
            source_path: None,
            frames_written: 0,
        }
    }

    /// Number of frames written since open.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        self.pipeline = Some(EncodePipeline::build(path, metadata)?);
        self.output_path = Some(path.to_path_buf());
        self.source_path = metadata.source_path.clone();
        self.frames_written = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Err("FfmpegWriter: not opened".into());
        };
        pipeline.encode(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.finish()?;
        }

        // Audio passthrough: remux the source audio into the finished output.
        if let (Some(source), Some(output)) = (self.source_path.take(), self.output_path.take()) {
            if let Err(e) = mux_audio(&source, &output) {
                log::warn!("audio muxing failed: {e}");
            }
        }
        Ok(())
    }
}

/// Live encoder state between open and close: muxer, encoder and the
/// RGB-to-YUV scaler, plus the pts counter.
struct EncodePipeline {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    fps_i: i32,
    frame_count: usize,
}

impl EncodePipeline {
    fn build(path: &Path, metadata: &VideoMetadata) -> Result<Self, Box<dyn std::error::Error>> {
        let (width, height) = (metadata.width, metadata.height);
        let fps_i = fps_int(metadata.fps);

        let mut octx = ffmpeg_next::format::output(path)?;
        let needs_global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = select_encoder()?;
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps_i));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps_i, 1)));
        if needs_global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut opts = ffmpeg_next::Dictionary::new();
        if codec.id() == ffmpeg_next::codec::Id::H264 {
            opts.set("preset", "medium");
        }
        let encoder = encoder_ctx.open_with(opts)?;

        let mut ost = octx.add_stream(Some(codec))?;
        ost.set_parameters(&encoder);
        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            octx,
            encoder,
            scaler,
            width,
            height,
            fps_i,
            frame_count: 0,
        })
    }

    fn encode(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        // ffmpeg rows may be padded; copy row by row into the stride.
        let stride = rgb.stride(0);
        let row_bytes = self.width as usize * 3;
        let src = frame.data();
        let dst = rgb.data_mut(0);
        for row in 0..self.height as usize {
            dst[row * stride..row * stride + row_bytes]
                .copy_from_slice(&src[row * row_bytes..(row + 1) * row_bytes]);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(self.frame_count as i64));

        self.encoder.send_frame(&yuv)?;
        self.frame_count += 1;
        self.drain()
    }

    /// Writes every packet the encoder is ready to hand out, rescaling
    /// timestamps from encoder to stream time base.
    fn drain(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let ost_time_base = self
            .octx
            .stream(0)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();

        let mut packet = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(ffmpeg_next::Rational(1, self.fps_i), ost_time_base);
            packet.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.encoder.send_eof()?;
        self.drain()?;
        self.octx.write_trailer()?;
        Ok(())
    }
}

fn fps_int(fps: f64) -> i32 {
    let rounded = fps.round() as i32;
    if rounded <= 0 {
        30
    } else {
        rounded
    }
}

fn select_encoder() -> Result<ffmpeg_next::Codec, Box<dyn std::error::Error>> {
    if let Some(codec) = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::H264) {
        return Ok(codec);
    }
    log::warn!("H.264 encoder unavailable, falling back to MPEG-4");
    ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
        .ok_or_else(|| "no usable video encoder (tried H.264, MPEG-4)".into())
}

/// Copies audio from `source` into `video_output` by remuxing.
///
/// Writes a sibling temp file with both streams, then replaces the
/// video-only output. A source without audio is a no-op.
fn mux_audio(source: &Path, video_output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let probe = ffmpeg_next::format::input(source)?;
    let has_audio = probe
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .is_some();
    drop(probe);

    if !has_audio {
        return Ok(());
    }

    let mut video_input = ffmpeg_next::format::input(video_output)?;
    let mut source_input = ffmpeg_next::format::input(source)?;

    let ext = video_output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let temp_path = video_output.with_extension(format!("_mux.{ext}"));

    let mut output = ffmpeg_next::format::output(&temp_path)?;

    let mut next_ost = 0usize;
    let video_map = map_streams(
        &video_input,
        ffmpeg_next::media::Type::Video,
        &mut output,
        &mut next_ost,
    )?;
    let audio_map = map_streams(
        &source_input,
        ffmpeg_next::media::Type::Audio,
        &mut output,
        &mut next_ost,
    )?;

    output.write_header()?;

    copy_packets(&mut video_input, &video_map, &mut output)?;
    copy_packets(&mut source_input, &audio_map, &mut output)?;

    output.write_trailer()?;

    std::fs::rename(&temp_path, video_output)?;

    Ok(())
}

/// Adds an output stream for each input stream of `medium`, codec
/// parameters copied as-is. Returns input index -> output index, -1 for
/// streams left behind.
fn map_streams(
    input: &ffmpeg_next::format::context::Input,
    medium: ffmpeg_next::media::Type,
    output: &mut ffmpeg_next::format::context::Output,
    next_ost: &mut usize,
) -> Result<Vec<isize>, Box<dyn std::error::Error>> {
    let mut map = vec![-1isize; input.nb_streams() as usize];

    for (idx, stream) in input.streams().enumerate() {
        if stream.parameters().medium() != medium {
            continue;
        }
        let mut ost = output.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost.set_parameters(stream.parameters());
        unsafe {
            (*ost.parameters().as_mut_ptr()).codec_tag = 0;
        }
        map[idx] = *next_ost as isize;
        *next_ost += 1;
    }
    Ok(map)
}

/// Remuxes every mapped packet of `input` into `output` untouched
/// except for timestamp rescaling.
fn copy_packets(
    input: &mut ffmpeg_next::format::context::Input,
    map: &[isize],
    output: &mut ffmpeg_next::format::context::Output,
) -> Result<(), Box<dyn std::error::Error>> {
    let input_time_bases: Vec<_> = input.streams().map(|s| s.time_base()).collect();

    for (stream, mut packet) in input.packets() {
        let ist_idx = stream.index();
        let ost_idx = map[ist_idx];
        if ost_idx < 0 {
            continue;
        }
        let ost_time_base = output
            .stream(ost_idx as usize)
            .ok_or("mux output stream missing")?
            .time_base();
        packet.rescale_ts(input_time_bases[ist_idx], ost_time_base);
        packet.set_position(-1);
        packet.set_stream(ost_idx as usize);
        packet.write_interleaved(output)?;
    }
    Ok(())
}
