use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::Rational;

use crate::shared::frame::Frame;
use crate::shared::frame_geometry::FrameGeometry;
use crate::video::domain::video_encoder::{EncoderSettings, VideoEncoder};

/// Streams frames into a container through libavcodec/libavformat.
///
/// The container comes from the output path's extension and the codec from
/// the encoder name in [`EncoderSettings`]. Input frames may be gray, RGB or
/// RGBA; they are converted to the codec's preferred pixel format.
pub struct FfmpegEncoder {
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<scaling::Context>,
    geometry: FrameGeometry,
    source_format: Pixel,
    time_base: Rational,
    stream_index: usize,
    frame_count: i64,
}

// Safety: FfmpegEncoder is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegEncoder {}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self {
            octx: None,
            encoder: None,
            scaler: None,
            geometry: FrameGeometry::new(0, 0, 0),
            source_format: Pixel::RGB24,
            time_base: Rational(1, 30),
            stream_index: 0,
            frame_count: 0,
        }
    }

    /// Frames handed to the encoder since it was opened.
    pub fn frame_count(&self) -> u64 {
        self.frame_count as u64
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn source_pixel_format(channels: u8) -> Result<Pixel, Box<dyn std::error::Error>> {
    match channels {
        1 => Ok(Pixel::GRAY8),
        3 => Ok(Pixel::RGB24),
        4 => Ok(Pixel::RGBA),
        other => Err(format!("Unsupported channel count for video input: {other}").into()),
    }
}

/// YUV420P when the codec takes it, else whatever it lists first.
fn target_pixel_format(codec: &ffmpeg_next::Codec) -> Pixel {
    let supported: Vec<Pixel> = codec
        .video()
        .ok()
        .and_then(|v| v.formats())
        .map(|formats| formats.collect())
        .unwrap_or_default();
    if supported.is_empty() || supported.contains(&Pixel::YUV420P) {
        Pixel::YUV420P
    } else {
        supported[0]
    }
}

fn drain_packets(
    encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    time_base: Rational,
) -> Result<(), Box<dyn std::error::Error>> {
    let ost_time_base = octx
        .stream(stream_index)
        .ok_or("FfmpegEncoder: output stream missing")?
        .time_base();
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_index);
        encoded.rescale_ts(time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}

impl VideoEncoder for FfmpegEncoder {
    fn open(
        &mut self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let geometry = settings.geometry;
        let source_format = source_pixel_format(geometry.channels)?;
        if !(settings.fps.is_finite() && settings.fps > 0.0) {
            return Err(format!("Invalid frame rate: {}", settings.fps).into());
        }

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find_by_name(&settings.codec)
            .ok_or_else(|| format!("Encoder '{}' not available", settings.codec))?;
        let target_format = target_pixel_format(&codec);

        let mut ost = octx.add_stream(Some(codec))?;
        let stream_index = ost.index();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let frame_rate = Rational::from(settings.fps);
        let time_base = frame_rate.invert();

        encoder_ctx.set_width(geometry.width);
        encoder_ctx.set_height(geometry.height);
        encoder_ctx.set_format(target_format);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(frame_rate));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        ost.set_time_base(time_base);

        octx.write_header()?;

        let scaler = scaling::Context::get(
            source_format,
            geometry.width,
            geometry.height,
            target_format,
            geometry.width,
            geometry.height,
            scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Opened {} encoder for {} at {} fps ({geometry})",
            settings.codec,
            path.display(),
            settings.fps
        );

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.geometry = geometry;
        self.source_format = source_format;
        self.time_base = time_base;
        self.stream_index = stream_index;
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(scaler), Some(octx)) = (
            self.encoder.as_mut(),
            self.scaler.as_mut(),
            self.octx.as_mut(),
        ) else {
            return Err("FfmpegEncoder: not opened".into());
        };

        let actual = FrameGeometry::of(frame);
        if actual != self.geometry {
            return Err(format!(
                "FfmpegEncoder: frame is {actual}, encoder was opened for {}",
                self.geometry
            )
            .into());
        }

        let mut source = ffmpeg_next::util::frame::video::Video::new(
            self.source_format,
            self.geometry.width,
            self.geometry.height,
        );
        let stride = source.stride(0);
        let row_len = frame.row_len();
        let plane = source.data_mut(0);
        for (row, src_row) in frame.data().chunks_exact(row_len).enumerate() {
            let start = row * stride;
            plane[start..start + row_len].copy_from_slice(src_row);
        }

        let mut converted = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&source, &mut converted)?;
        converted.set_pts(Some(self.frame_count));

        encoder.send_frame(&converted)?;
        drain_packets(encoder, octx, self.stream_index, self.time_base)?;

        self.frame_count += 1;
        Ok(())
    }

    fn is_opened(&self) -> bool {
        self.encoder.is_some()
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.scaler = None;
        let (Some(mut encoder), Some(mut octx)) = (self.encoder.take(), self.octx.take()) else {
            return Ok(());
        };

        encoder.send_eof()?;
        drain_packets(&mut encoder, &mut octx, self.stream_index, self.time_base)?;
        octx.write_trailer()?;
        Ok(())
    }
}
