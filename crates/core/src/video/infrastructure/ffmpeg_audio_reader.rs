use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::video::domain::audio_reader::AudioReader;

/// Decodes the audio track of a video file using ffmpeg-next.
///
/// Output is always mono f32 at the requested sample rate, which is
/// what the speech recognizer consumes.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let mut input = ffmpeg_next::format::input(path)?;

        let Some(stream) = input.streams().best(ffmpeg_next::media::Type::Audio) else {
            return Ok(None);
        };
        let stream_index = stream.index();

        let mut decoder =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
                .decoder()
                .audio()?;

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            ffmpeg_next::ChannelLayout::MONO,
            sample_rate,
        )?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler.run(&decoded, &mut resampled)?;
                extend_from_plane(&resampled, &mut samples);
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled)?;
            extend_from_plane(&resampled, &mut samples);
        }

        // Drain the resampler until it reports no remaining delay.
        loop {
            let delay = resampler.flush(&mut resampled)?;
            extend_from_plane(&resampled, &mut samples);
            if delay.is_none() {
                break;
            }
        }

        Ok(Some(AudioSegment::new(samples, sample_rate)))
    }
}

fn extend_from_plane(frame: &ffmpeg_next::util::frame::audio::Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    out.extend_from_slice(&frame.plane::<f32>(0)[..num_samples]);
}
