use std::path::Path;

use crate::shared::video_metadata::VideoMetadata;

/// Inspects a finished video by decoding every frame of its best video
/// stream.
///
/// Slower than trusting the container header, but container frame counts
/// are often missing or estimated.
pub fn probe(path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;

    let mut ictx = ffmpeg_next::format::input(path)?;
    let has_audio = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .is_some();

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| format!("No video stream in {}", path.display()))?;
    let stream_index = stream.index();

    let rate = stream.avg_frame_rate();
    let rate = if rate.denominator() != 0 && rate.numerator() != 0 {
        rate
    } else {
        stream.rate()
    };
    let fps = if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    };

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let mut decoder = codec_ctx.decoder().video()?;
    let (width, height) = (decoder.width(), decoder.height());
    let codec = decoder
        .codec()
        .map(|c| c.name().to_string())
        .unwrap_or_default();

    let mut total_frames = 0;
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            total_frames += 1;
        }
    }
    decoder.send_eof()?;
    while decoder.receive_frame(&mut decoded).is_ok() {
        total_frames += 1;
    }

    Ok(VideoMetadata {
        width,
        height,
        fps,
        total_frames,
        codec,
        has_audio,
        source_path: Some(path.to_path_buf()),
    })
}
