use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a single frame to an image file.
///
/// Resolution and channel count must survive the round trip; pixel values
/// may be lossy depending on the format.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
