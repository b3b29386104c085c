use std::path::Path;
use std::process::Command;

use approx::assert_relative_eq;

use framereel_core::pipeline::encoding_strategy::{buffer_dir_for, merge_output_for};
use framereel_core::pipeline::session_config::SessionConfig;
use framereel_core::pipeline::teardown::{StepOutcome, TeardownStep};
use framereel_core::pipeline::video_writer_session::VideoWriterSession;
use framereel_core::shared::frame::Frame;
use framereel_core::video::infrastructure::ffmpeg_probe;

fn ffmpeg_installed() -> bool {
    let found = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !found {
        eprintln!("ffmpeg binary not found, skipping");
    }
    found
}

/// Gradient whose red channel encodes the frame number.
fn gradient(width: u32, height: u32, n: usize) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((n * 20 % 256) as u8);
            data.push((x * 255 / width.max(1)) as u8);
            data.push((y * 255 / height.max(1)) as u8);
        }
    }
    Frame::new(data, width, height, 3, n)
}

fn write_frames(session: &mut VideoWriterSession, count: usize, width: u32, height: u32) {
    for n in 0..count {
        session.write_frame(&gradient(width, height, n)).unwrap();
    }
}

fn make_tone(path: &Path, seconds: u32) {
    let status = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-f", "lavfi", "-i"])
        .arg(format!("sine=frequency=440:duration={seconds}"))
        .args(["-c:a", "aac"])
        .arg(path)
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn test_direct_encode_writes_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.avi");

    let mut session = VideoWriterSession::new(SessionConfig::new(&destination, 25.0)).unwrap();
    write_frames(&mut session, 12, 64, 48);
    assert!(session.is_opened());
    let report = session.close();

    assert!(report.is_success());
    let metadata = ffmpeg_probe::probe(&destination).unwrap();
    assert_eq!(metadata.total_frames, 12);
    assert_eq!((metadata.width, metadata.height), (64, 48));
    assert_relative_eq!(metadata.fps, 25.0, epsilon = 0.01);
    assert!(!metadata.has_audio);
}

#[test]
fn test_direct_encode_composes_side_by_side() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("wide.avi");

    let mut session = VideoWriterSession::new(SessionConfig::new(&destination, 30.0)).unwrap();
    for n in 0..3 {
        session
            .write(&[gradient(32, 48, n), gradient(32, 48, n + 1)])
            .unwrap();
    }
    assert!(session.close().is_success());

    let metadata = ffmpeg_probe::probe(&destination).unwrap();
    assert_eq!((metadata.width, metadata.height), (64, 48));
    assert_eq!(metadata.total_frames, 3);
}

#[test]
fn test_buffered_pipeline_produces_mp4_and_cleans_up() {
    if !ffmpeg_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("clip.mp4");

    let mut session = VideoWriterSession::new(SessionConfig::new(&destination, 30.0)).unwrap();
    write_frames(&mut session, 5, 64, 48);
    assert!(buffer_dir_for(&destination).is_dir());
    let report = session.close();

    assert!(report.is_success(), "{:?}", report.failures().collect::<Vec<_>>());
    assert!(!buffer_dir_for(&destination).exists());
    let metadata = ffmpeg_probe::probe(&destination).unwrap();
    assert_eq!(metadata.total_frames, 5);
    assert_eq!((metadata.width, metadata.height), (64, 48));
    assert_eq!(metadata.codec, "h264");
    assert_relative_eq!(metadata.fps, 30.0, epsilon = 0.01);
}

#[test]
fn test_buffered_pipeline_pads_odd_dimensions() {
    if !ffmpeg_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("odd.mp4");

    let mut session =
        VideoWriterSession::new(SessionConfig::new(&destination, 24.0).with_crf(30)).unwrap();
    write_frames(&mut session, 3, 63, 47);
    assert!(session.close().is_success());

    let metadata = ffmpeg_probe::probe(&destination).unwrap();
    assert_eq!((metadata.width, metadata.height), (64, 48));
    assert_eq!(metadata.total_frames, 3);
}

#[test]
fn test_buffered_pipeline_merges_audio() {
    if !ffmpeg_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("talk.mp4");
    let audio = dir.path().join("tone.m4a");
    make_tone(&audio, 2);

    let config = SessionConfig::new(&destination, 10.0).with_audio_source(&audio);
    let mut session = VideoWriterSession::new(config).unwrap();
    write_frames(&mut session, 10, 32, 32);
    let report = session.close();

    assert!(report.is_success(), "{:?}", report.failures().collect::<Vec<_>>());
    assert!(report
        .outcome(TeardownStep::ReplaceDestination)
        .unwrap()
        .is_completed());
    assert!(!merge_output_for(&destination).exists());
    let metadata = ffmpeg_probe::probe(&destination).unwrap();
    assert!(metadata.has_audio);
    assert_eq!(metadata.total_frames, 10);
}

#[cfg(unix)]
#[test]
fn test_failing_mux_keeps_buffered_frames() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    // Answers the availability probe, fails everything else.
    let fake = dir.path().join("fake-ffmpeg");
    std::fs::write(
        &fake,
        "#!/bin/sh\n[ \"$1\" = \"-version\" ] && exit 0\necho 'Unknown encoder' >&2\nexit 1\n",
    )
    .unwrap();
    std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

    let destination = dir.path().join("lost.mp4");
    let config = SessionConfig::new(&destination, 30.0)
        .with_ffmpeg_binary(&fake)
        .with_audio_source(dir.path().join("missing.m4a"));
    let mut session = VideoWriterSession::new(config).unwrap();
    write_frames(&mut session, 5, 16, 16);
    let report = session.close();

    let failure = report.failures().next().unwrap();
    assert_eq!(failure.step(), TeardownStep::MuxSequence);
    assert!(failure.command().unwrap().contains("fake-ffmpeg"));
    assert!(failure.to_string().contains("Unknown encoder"));
    assert!(matches!(
        report.outcome(TeardownStep::MergeAudio),
        Some(StepOutcome::Skipped(_))
    ));
    assert_eq!(
        std::fs::read_dir(buffer_dir_for(&destination))
            .unwrap()
            .count(),
        5
    );
    assert!(!destination.exists());
}
