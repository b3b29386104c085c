use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame_geometry::FrameGeometry;

/// Broad class of a [`SessionError`], for callers that only care whether to
/// fix their setup, fix their input, or give up on the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected at construction; no session exists.
    Configuration,
    /// Rejected frame(s); the session is unchanged and still usable.
    Input,
    /// The backend could not be set up on the first frame; the session is
    /// closed.
    BackendOpen,
    /// The backend failed while accepting a frame.
    Backend,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("frame rate must be a positive number, got {fps}")]
    InvalidFrameRate { fps: f64 },

    #[error("H.264 quality (CRF) must be between 0 and {max}, got {crf}")]
    InvalidQuality { crf: u32, max: u32 },

    #[error(
        "writing {destination} requires the external `{binary}` tool, which could not be run. \
         Install FFmpeg (e.g. `sudo apt-get install ffmpeg` or `brew install ffmpeg`), point \
         the session at it explicitly, or choose a non-mp4 output such as `.avi`."
    )]
    ExternalToolMissing {
        binary: PathBuf,
        destination: PathBuf,
    },

    #[error(
        "adding audio from {audio} requires an .mp4 destination, got {destination}. \
         Either drop the audio source or write to a path ending in `.mp4`."
    )]
    AudioRequiresMp4 {
        audio: PathBuf,
        destination: PathBuf,
    },

    #[error("no frames were given to write")]
    EmptyFrameList,

    #[error("frame {index} of the batch is empty (zero width, height or channels)")]
    EmptyFrame { index: usize },

    #[error(
        "frames in one batch must share height and channel count: frame 0 is {first}, \
         frame {index} is {other}"
    )]
    IncompatibleFrames {
        index: usize,
        first: FrameGeometry,
        other: FrameGeometry,
    },

    #[error(
        "frame geometry changed mid-stream: session was started at {expected}, got {actual}. \
         All frames written to one video must have the same resolution and channel count."
    )]
    GeometryMismatch {
        expected: FrameGeometry,
        actual: FrameGeometry,
    },

    #[error(
        "video {path} could not be opened for writing with codec `{codec}`. Check that:\n\
         \t1. the extension names a container the codec can go into (e.g. `.avi`);\n\
         \t2. the parent folder exists;\n\
         \t3. the linked FFmpeg libraries include the `{codec}` encoder;\n\
         \t4. you have write permission for that folder."
    )]
    BackendOpen {
        path: PathBuf,
        codec: String,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    #[error("failed to create frame buffer directory {path}: {source}")]
    BufferDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "frame buffer directory {path} already exists, probably left by an earlier run \
         whose mux failed. Recover its frames or delete it, then write again."
    )]
    BufferDirectoryExists { path: PathBuf },

    #[error(
        "frame {index} of the batch holds {actual} bytes, but {geometry} needs {expected}"
    )]
    MalformedFrame {
        index: usize,
        geometry: FrameGeometry,
        expected: usize,
        actual: usize,
    },

    #[error("failed to encode frame into {path}")]
    EncodeFrame {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    #[error("failed to buffer frame as {path}")]
    PersistFrame {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    #[error("the session is closed; start a new session to write another video")]
    Closed,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFrameRate { .. }
            | Self::InvalidQuality { .. }
            | Self::ExternalToolMissing { .. }
            | Self::AudioRequiresMp4 { .. } => ErrorKind::Configuration,
            Self::EmptyFrameList
            | Self::EmptyFrame { .. }
            | Self::IncompatibleFrames { .. }
            | Self::MalformedFrame { .. }
            | Self::GeometryMismatch { .. } => ErrorKind::Input,
            Self::BackendOpen { .. }
            | Self::BufferDirectory { .. }
            | Self::BufferDirectoryExists { .. } => ErrorKind::BackendOpen,
            Self::EncodeFrame { .. } | Self::PersistFrame { .. } | Self::Closed => {
                ErrorKind::Backend
            }
        }
    }
}
