use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::frame_geometry::FrameGeometry;

/// Parameters fixed when a streaming encoder is opened.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderSettings {
    /// Encoder name as known to the codec library (e.g. `mpeg4`, `ffv1`).
    pub codec: String,
    pub fps: f64,
    pub geometry: FrameGeometry,
}

/// Streaming video encoder: frames go in one at a time and the container
/// format is fixed at open time.
///
/// Abstracts the codec library so the session can write output without
/// depending on it.
pub trait VideoEncoder: Send {
    fn open(
        &mut self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    fn is_opened(&self) -> bool;

    /// Flushes pending packets and finalizes the container.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
