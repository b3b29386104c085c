/// Appended to the destination stem to name the private frame buffer
/// directory and the temporary audio-merge output.
pub const BUFFER_DIR_SUFFIX: &str = "_frbuf_q7k2x9m4v8w3n6t1";

/// Zero-padded width of buffered frame numbers. Keeps lexicographic order
/// equal to submission order.
pub const FRAME_NUMBER_WIDTH: usize = 12;

pub const BUFFERED_IMAGE_EXTENSION: &str = "png";

/// Destinations with this extension go through the external ffmpeg pipeline.
pub const BUFFERED_PIPELINE_EXTENSION: &str = "mp4";

pub const DEFAULT_CODEC: &str = "mpeg4";
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";

/// Highest CRF value libx264 accepts.
pub const MAX_CRF: u32 = 51;

/// Frames between progress log lines.
pub const PROGRESS_THROTTLE_FRAMES: u64 = 100;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
