use std::fmt;

use crate::shared::frame::Frame;

/// Width, height and channel count shared by every frame of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    pub fn of(frame: &Frame) -> Self {
        Self::new(frame.width(), frame.height(), frame.channels())
    }

    /// Geometry of the image produced by placing `frames` side by side.
    ///
    /// Height and channels are taken from the first frame; callers are
    /// expected to have checked that the rest agree.
    pub fn side_by_side(frames: &[Frame]) -> Option<Self> {
        let first = frames.first()?;
        let width = frames.iter().map(|f| f.width()).sum();
        Some(Self::new(width, first.height(), first.channels()))
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}
