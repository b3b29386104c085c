use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::shared::constants::{BUFFERED_PIPELINE_EXTENSION, BUFFER_DIR_SUFFIX};

/// How a session turns frames into a file. Chosen once, from the
/// destination extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodingStrategy {
    /// Frames stream straight into the linked encoder.
    DirectEncode,
    /// Frames are buffered as numbered images in `buffer_dir`, then muxed by
    /// the external ffmpeg binary at teardown.
    BufferedPipeline { buffer_dir: PathBuf },
}

impl EncodingStrategy {
    pub fn for_destination(destination: &Path) -> Self {
        let buffered = destination
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(BUFFERED_PIPELINE_EXTENSION));
        if buffered {
            Self::BufferedPipeline {
                buffer_dir: buffer_dir_for(destination),
            }
        } else {
            Self::DirectEncode
        }
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::BufferedPipeline { .. })
    }

    pub fn buffer_dir(&self) -> Option<&Path> {
        match self {
            Self::BufferedPipeline { buffer_dir } => Some(buffer_dir),
            Self::DirectEncode => None,
        }
    }
}

/// `<destination without extension><suffix>`, next to the destination.
pub fn buffer_dir_for(destination: &Path) -> PathBuf {
    let mut name = destination.with_extension("").into_os_string();
    name.push(BUFFER_DIR_SUFFIX);
    PathBuf::from(name)
}

/// Where the audio merge writes before replacing the destination.
pub fn merge_output_for(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(BUFFER_DIR_SUFFIX);
    name.push(".");
    name.push(BUFFERED_PIPELINE_EXTENSION);
    PathBuf::from(name)
}
