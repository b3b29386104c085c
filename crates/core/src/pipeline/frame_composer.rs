use std::borrow::Cow;

use ndarray::{concatenate, ArrayView3, Axis};

use crate::pipeline::session_error::SessionError;
use crate::shared::frame::Frame;
use crate::shared::frame_geometry::FrameGeometry;

/// Checks that a batch can be composed: non-empty, no empty frames, pixel
/// buffers matching their dimensions, and a shared height and channel count.
pub fn validate_batch(frames: &[Frame]) -> Result<(), SessionError> {
    let first = frames.first().ok_or(SessionError::EmptyFrameList)?;
    if let Some(index) = frames.iter().position(Frame::is_empty) {
        return Err(SessionError::EmptyFrame { index });
    }
    if let Some(index) = frames.iter().position(|f| !f.is_well_formed()) {
        let frame = &frames[index];
        return Err(SessionError::MalformedFrame {
            index,
            geometry: FrameGeometry::of(frame),
            expected: frame.row_len() * frame.height() as usize,
            actual: frame.data().len(),
        });
    }
    for (index, frame) in frames.iter().enumerate().skip(1) {
        if frame.height() != first.height() || frame.channels() != first.channels() {
            return Err(SessionError::IncompatibleFrames {
                index,
                first: FrameGeometry::of(first),
                other: FrameGeometry::of(frame),
            });
        }
    }
    Ok(())
}

/// Places a batch of frames side by side, left to right.
///
/// A single frame is returned as-is without copying. The composed frame
/// takes the index of the first frame.
pub fn compose_horizontal(frames: &[Frame]) -> Result<Cow<'_, Frame>, SessionError> {
    validate_batch(frames)?;
    if let [single] = frames {
        return Ok(Cow::Borrowed(single));
    }

    let views: Vec<ArrayView3<'_, u8>> = frames.iter().map(Frame::as_ndarray).collect();
    let composed = concatenate(Axis(1), &views).map_err(|_| SessionError::IncompatibleFrames {
        index: 0,
        first: FrameGeometry::of(&frames[0]),
        other: FrameGeometry::of(&frames[0]),
    })?;

    let (height, width, channels) = composed.dim();
    Ok(Cow::Owned(Frame::new(
        composed.iter().copied().collect(),
        width as u32,
        height as u32,
        channels as u8,
        frames[0].index(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::session_error::ErrorKind;

    /// Frame whose every pixel of row `r` is `[value, r, 0, ...]`.
    fn tagged(width: u32, height: u32, channels: u8, value: u8) -> Frame {
        let mut data = Vec::new();
        for row in 0..height {
            for _ in 0..width {
                data.push(value);
                for c in 1..channels {
                    data.push(if c == 1 { row as u8 } else { 0 });
                }
            }
        }
        Frame::new(data, width, height, channels, 0)
    }

    #[test]
    fn test_single_frame_is_borrowed() {
        let frame = tagged(4, 3, 3, 9);
        let composed = compose_horizontal(std::slice::from_ref(&frame)).unwrap();
        assert!(matches!(composed, Cow::Borrowed(_)));
        assert_eq!(*composed, frame);
    }

    #[test]
    fn test_width_is_sum_and_height_is_shared() {
        let frames = [tagged(4, 3, 3, 1), tagged(6, 3, 3, 2), tagged(2, 3, 3, 3)];
        let composed = compose_horizontal(&frames).unwrap();
        assert_eq!(FrameGeometry::of(&composed), FrameGeometry::new(12, 3, 3));
    }

    #[test]
    fn test_pixels_are_laid_out_left_to_right() {
        let frames = [tagged(2, 2, 3, 10), tagged(3, 2, 3, 20)];
        let composed = compose_horizontal(&frames).unwrap();
        let arr = composed.as_ndarray();
        for row in 0..2 {
            for col in 0..5 {
                let expected = if col < 2 { 10 } else { 20 };
                assert_eq!(arr[[row, col, 0]], expected);
                assert_eq!(arr[[row, col, 1]], row as u8);
            }
        }
    }

    #[test]
    fn test_gray_frames_compose() {
        let frames = [tagged(2, 2, 1, 5), tagged(2, 2, 1, 6)];
        let composed = compose_horizontal(&frames).unwrap();
        assert_eq!(composed.data(), &[5, 5, 6, 6, 5, 5, 6, 6]);
    }

    #[test]
    fn test_empty_batch_is_input_error() {
        let err = compose_horizontal(&[]).unwrap_err();
        assert!(matches!(err, SessionError::EmptyFrameList));
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_empty_frame_is_reported_by_position() {
        let frames = [tagged(2, 2, 3, 1), Frame::new(Vec::new(), 0, 0, 3, 0)];
        let err = compose_horizontal(&frames).unwrap_err();
        assert!(matches!(err, SessionError::EmptyFrame { index: 1 }));
    }

    #[test]
    fn test_short_pixel_buffer_is_an_input_error() {
        let frames = [tagged(2, 2, 3, 1), Frame::unchecked(vec![0; 6], 2, 2, 3, 0)];
        let err = compose_horizontal(&frames).unwrap_err();
        assert!(matches!(
            err,
            SessionError::MalformedFrame { index: 1, expected: 12, actual: 6, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_differing_heights_are_rejected() {
        let frames = [tagged(2, 2, 3, 1), tagged(2, 3, 3, 1)];
        let err = compose_horizontal(&frames).unwrap_err();
        assert!(matches!(err, SessionError::IncompatibleFrames { index: 1, .. }));
    }

    #[test]
    fn test_differing_channels_are_rejected() {
        let frames = [tagged(2, 2, 3, 1), tagged(2, 2, 4, 1)];
        assert!(compose_horizontal(&frames).is_err());
    }
}
