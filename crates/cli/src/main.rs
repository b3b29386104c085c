use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use framereel_core::pipeline::session_config::SessionConfig;
use framereel_core::pipeline::teardown::StepOutcome;
use framereel_core::pipeline::video_writer_session::VideoWriterSession;
use framereel_core::shared::constants::{
    DEFAULT_CODEC, DEFAULT_FFMPEG_BINARY, IMAGE_EXTENSIONS, MAX_CRF,
};
use framereel_core::shared::frame::Frame;
use framereel_core::video::domain::image_reader::ImageReader;
use framereel_core::video::infrastructure::ffmpeg_probe;
use framereel_core::video::infrastructure::image_file_reader::ImageFileReader;

/// Stitch image files into a video.
///
/// `.mp4` outputs are built by the external ffmpeg binary (H.264, optional
/// audio track); any other extension is encoded in-process.
#[derive(Parser)]
#[command(name = "framereel")]
struct Cli {
    /// Image files or directories of images, in playback order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output video file.
    #[arg(short, long)]
    output: PathBuf,

    /// Frames per second.
    #[arg(long, default_value = "30")]
    fps: f64,

    /// FFmpeg encoder name for non-mp4 outputs.
    #[arg(long, default_value = DEFAULT_CODEC)]
    codec: String,

    /// Audio file to merge into an mp4 output.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// H.264 CRF quality for mp4 outputs (0=lossless, 51=worst).
    #[arg(long)]
    quality: Option<u32>,

    /// Place this many consecutive images side by side in each video frame.
    #[arg(long, default_value = "1")]
    tile: usize,

    /// ffmpeg binary used for mp4 outputs.
    #[arg(long, default_value = DEFAULT_FFMPEG_BINARY)]
    ffmpeg: PathBuf,

    /// Decode the finished video and report what it contains.
    #[arg(long)]
    verify: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let images = collect_images(&cli.inputs)?;
    if images.is_empty() {
        return Err("No image files found in the given inputs".into());
    }
    log::info!("Found {} images", images.len());

    let mut config = SessionConfig::new(&cli.output, cli.fps)
        .with_codec(cli.codec.as_str())
        .with_ffmpeg_binary(&cli.ffmpeg);
    if let Some(audio) = &cli.audio {
        config = config.with_audio_source(audio);
    }
    if let Some(crf) = cli.quality {
        config = config.with_crf(crf);
    }

    let mut session = VideoWriterSession::new(config)?;
    let reader = ImageFileReader::new();
    let total = images.len();
    let mut index = 0;
    for chunk in images.chunks(cli.tile) {
        let frames = chunk
            .iter()
            .map(|path| {
                let frame = reader.read(path, index);
                index += 1;
                frame.map_err(|e| format!("Failed to read {}: {e}", path.display()))
            })
            .collect::<Result<Vec<Frame>, _>>()?;
        session.write(&frames)?;
        eprint!("\rWriting image {index}/{total}");
    }
    eprintln!();

    let report = session.close();
    for (step, outcome) in report.steps() {
        match outcome {
            StepOutcome::Completed => log::debug!("{step}: done"),
            StepOutcome::Skipped(reason) => log::info!("{step}: skipped ({reason})"),
            StepOutcome::Failed(e) => log::error!("{e}"),
        }
    }
    if let Some(failure) = report.failures().next() {
        return Err(format!("Video was not fully written: {failure}").into());
    }
    log::info!("Output written to {}", cli.output.display());

    if cli.verify {
        let metadata = ffmpeg_probe::probe(&cli.output)?;
        log::info!(
            "{}: {}x{} {} at {} fps, {} frames ({:.2}s), audio: {}",
            cli.output.display(),
            metadata.width,
            metadata.height,
            metadata.codec,
            metadata.fps,
            metadata.total_frames,
            metadata.duration_secs(),
            if metadata.has_audio { "yes" } else { "no" }
        );
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    if !(cli.fps.is_finite() && cli.fps > 0.0) {
        return Err(format!("FPS must be a positive number, got {}", cli.fps).into());
    }
    if cli.tile == 0 {
        return Err("Tile must be at least 1".into());
    }
    if let Some(q) = cli.quality {
        if q > MAX_CRF {
            return Err(format!("Quality must be between 0 and {MAX_CRF}, got {q}").into());
        }
    }
    if let Some(audio) = &cli.audio {
        if !audio.exists() {
            return Err(format!("Audio file not found: {}", audio.display()).into());
        }
    }
    Ok(())
}

/// Expands directories into their image files, sorted by name. Files given
/// directly are kept in argument order.
fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut images = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_image(path))
                .collect();
            entries.sort();
            images.extend(entries);
        } else if is_image(input) {
            images.push(input.clone());
        } else {
            log::warn!("Skipping {}: not an image file", input.display());
        }
    }
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
