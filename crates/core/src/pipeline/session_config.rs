use std::path::{Path, PathBuf};

use crate::shared::constants::{DEFAULT_CODEC, DEFAULT_FFMPEG_BINARY};

/// Everything a [`VideoWriterSession`] needs to know before the first frame.
///
/// Immutable once the session is built; validated by the session
/// constructor, not here.
///
/// [`VideoWriterSession`]: crate::pipeline::video_writer_session::VideoWriterSession
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    destination: PathBuf,
    codec: String,
    fps: f64,
    audio_source: Option<PathBuf>,
    crf: Option<u32>,
    ffmpeg_binary: PathBuf,
}

impl SessionConfig {
    pub fn new(destination: impl Into<PathBuf>, fps: f64) -> Self {
        Self {
            destination: destination.into(),
            codec: DEFAULT_CODEC.to_string(),
            fps,
            audio_source: None,
            crf: None,
            ffmpeg_binary: PathBuf::from(DEFAULT_FFMPEG_BINARY),
        }
    }

    /// Encoder name for the direct strategy (ignored for `.mp4` output).
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    /// File whose audio stream is merged into the finished `.mp4`.
    pub fn with_audio_source(mut self, audio: impl Into<PathBuf>) -> Self {
        self.audio_source = Some(audio.into());
        self
    }

    /// H.264 constant rate factor for `.mp4` output.
    pub fn with_crf(mut self, crf: u32) -> Self {
        self.crf = Some(crf);
        self
    }

    pub fn with_ffmpeg_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.ffmpeg_binary = binary.into();
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn audio_source(&self) -> Option<&Path> {
        self.audio_source.as_deref()
    }

    pub fn crf(&self) -> Option<u32> {
        self.crf
    }

    pub fn ffmpeg_binary(&self) -> &Path {
        &self.ffmpeg_binary
    }
}
