use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;

/// Decodes image files into RGB frames with ffmpeg.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies the visible part of each row, dropping ffmpeg's stride padding.
fn packed_rgb(rgb: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let plane = rgb.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&plane[start..start + row_len]);
    }
    pixels
}

fn receive_rgb(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut scaling::Context,
) -> Result<Option<Video>, Box<dyn std::error::Error>> {
    let mut decoded = Video::empty();
    if decoder.receive_frame(&mut decoded).is_err() {
        return Ok(None);
    }
    let mut rgb = Video::empty();
    scaler.run(&decoded, &mut rgb)?;
    Ok(Some(rgb))
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("No image data in {}", path.display()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().video()?;
        let (width, height) = (decoder.width(), decoder.height());

        let mut scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        let mut rgb = None;
        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            rgb = receive_rgb(&mut decoder, &mut scaler)?;
            if rgb.is_some() {
                break;
            }
        }
        if rgb.is_none() {
            // Some decoders hold the only frame until flushed
            let _ = decoder.send_eof();
            rgb = receive_rgb(&mut decoder, &mut scaler)?;
        }

        let rgb = rgb.ok_or_else(|| format!("Failed to decode image {}", path.display()))?;
        Ok(Frame::new(
            packed_rgb(&rgb, width, height),
            width,
            height,
            3,
            index,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("test.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_read_returns_rgb_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 100, 80);
        let frame = ImageFileReader::new().read(&path, 4).unwrap();
        assert_eq!(frame.width(), 100);
        assert_eq!(frame.height(), 80);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 4);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_odd_width_has_no_stride_padding() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 33, 7);
        let frame = ImageFileReader::new().read(&path, 0).unwrap();
        assert_eq!(frame.data().len(), 33 * 7 * 3);
    }

    #[test]
    fn test_read_nonexistent_is_error() {
        assert!(ImageFileReader::new()
            .read(Path::new("/nonexistent/test.png"), 0)
            .is_err());
    }
}
