use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes an image file into a frame.
pub trait ImageReader: Send {
    /// `index` becomes the frame's source index.
    fn read(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>>;
}
