use std::path::{Path, PathBuf};

use crate::pipeline::session_error::SessionError;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::infrastructure::ffmpeg_cli::frame_file_name;

/// Private directory of numbered frame images awaiting the external mux.
///
/// Numbers start at zero and grow by one per persisted frame, so file
/// order matches submission order.
pub struct FrameBuffer {
    dir: PathBuf,
    writer: Box<dyn ImageWriter>,
    count: u64,
}

impl FrameBuffer {
    /// Creates `dir` (and any missing parents) and binds the writer to it.
    ///
    /// `dir` itself must not exist yet: a leftover buffer from an earlier run
    /// fails with `ErrorKind::AlreadyExists` and is left untouched.
    pub fn create(dir: &Path, writer: Box<dyn ImageWriter>) -> Result<Self, std::io::Error> {
        if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            writer,
            count: 0,
        })
    }

    /// Writes the frame under the next number; the counter only advances on
    /// success.
    pub fn persist(&mut self, frame: &Frame) -> Result<PathBuf, SessionError> {
        let path = self.dir.join(frame_file_name(self.count));
        self.writer
            .write(&path, frame)
            .map_err(|source| SessionError::PersistFrame {
                path: path.clone(),
                source,
            })?;
        self.count += 1;
        Ok(path)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
