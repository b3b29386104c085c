//! Argument lists for the external ffmpeg binary.
//!
//! Kept separate from the runner so the exact command text can be tested
//! and shown to operators.

use std::path::{Path, PathBuf};

use crate::shared::constants::{BUFFERED_IMAGE_EXTENSION, FRAME_NUMBER_WIDTH};
use crate::video::domain::process_runner::{ExternalCommand, ProcessRunner};

/// File name of the buffered frame with the given number.
pub fn frame_file_name(number: u64) -> String {
    format!(
        "{number:0width$}.{BUFFERED_IMAGE_EXTENSION}",
        width = FRAME_NUMBER_WIDTH
    )
}

/// The image2 demuxer pattern matching [`frame_file_name`].
pub fn frame_file_pattern() -> String {
    format!("%0{FRAME_NUMBER_WIDTH}d.{BUFFERED_IMAGE_EXTENSION}")
}

/// True when `<binary> -version` runs and exits cleanly.
pub fn is_available(runner: &dyn ProcessRunner, binary: &Path) -> bool {
    let probe = ExternalCommand::new(binary).arg("-version");
    match runner.run(&probe) {
        Ok(outcome) => outcome.success(),
        Err(e) => {
            log::debug!("{} could not be started: {e}", binary.display());
            false
        }
    }
}

/// Muxes the numbered image sequence in `frame_dir` into an H.264 MP4,
/// overwriting `destination`.
///
/// Odd dimensions are padded by one pixel because yuv420p needs even ones.
pub fn image_sequence_command(
    binary: &Path,
    frame_dir: &Path,
    fps: f64,
    crf: Option<u32>,
    destination: &Path,
) -> ExternalCommand {
    let rate = fps.to_string();
    let mut cmd = ExternalCommand::new(binary)
        .args(["-y", "-loglevel", "error"])
        .args(["-framerate", rate.as_str()])
        .arg("-i")
        .arg(escape_pattern_dir(frame_dir).join(frame_file_pattern()))
        .args(["-c:v", "libx264"]);
    if let Some(crf) = crf {
        cmd = cmd.args(["-crf".to_string(), crf.to_string()]);
    }
    cmd.args(["-pix_fmt", "yuv420p"])
        .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
        .args(["-r", rate.as_str()])
        .arg(destination)
}

/// Copies the video stream of `video` and the audio stream of `audio` into
/// `output` without re-encoding, stopping at the shorter stream.
pub fn audio_merge_command(
    binary: &Path,
    video: &Path,
    audio: &Path,
    output: &Path,
) -> ExternalCommand {
    ExternalCommand::new(binary)
        .args(["-y", "-loglevel", "error"])
        .arg("-i")
        .arg(video)
        .arg("-i")
        .arg(audio)
        .args(["-map", "0:v:0", "-map", "1:a:0", "-c", "copy", "-shortest"])
        .arg(output)
}

/// The image2 demuxer treats `%` in the input as a pattern directive, so
/// literal ones in the directory part must be doubled.
fn escape_pattern_dir(dir: &Path) -> PathBuf {
    match dir.to_str() {
        Some(text) if text.contains('%') => PathBuf::from(text.replace('%', "%%")),
        _ => dir.to_path_buf(),
    }
}
