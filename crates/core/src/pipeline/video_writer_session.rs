use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::encoding_strategy::{merge_output_for, EncodingStrategy};
use crate::pipeline::frame_buffer::FrameBuffer;
use crate::pipeline::frame_composer::{compose_horizontal, validate_batch};
use crate::pipeline::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use crate::pipeline::session_config::SessionConfig;
use crate::pipeline::session_error::SessionError;
use crate::pipeline::teardown::{PipelineError, StepOutcome, TeardownReport, TeardownStep};
use crate::shared::constants::MAX_CRF;
use crate::shared::frame::Frame;
use crate::shared::frame_geometry::FrameGeometry;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::process_runner::{ExternalCommand, ProcessRunner};
use crate::video::domain::video_encoder::{EncoderSettings, VideoEncoder};
use crate::video::infrastructure::ffmpeg_cli;
use crate::video::infrastructure::ffmpeg_encoder::FfmpegEncoder;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;
use crate::video::infrastructure::system_process_runner::SystemProcessRunner;

/// Collaborators a session drives. Only the ones its strategy needs are
/// ever used.
pub struct SessionBackends {
    pub encoder: Box<dyn VideoEncoder>,
    pub image_writer: Box<dyn ImageWriter>,
    pub process_runner: Box<dyn ProcessRunner>,
    pub logger: Box<dyn PipelineLogger>,
}

impl Default for SessionBackends {
    fn default() -> Self {
        Self {
            encoder: Box::new(FfmpegEncoder::new()),
            image_writer: Box::new(ImageFileWriter::new()),
            process_runner: Box::new(SystemProcessRunner::new()),
            logger: Box::new(LogPipelineLogger::default()),
        }
    }
}

enum Backend {
    Direct(Box<dyn VideoEncoder>),
    Buffered(FrameBuffer),
}

/// Geometry is unknown until the first frame, so backend setup waits for it.
enum SessionState {
    Unstarted {
        encoder: Box<dyn VideoEncoder>,
        image_writer: Box<dyn ImageWriter>,
    },
    Started {
        geometry: FrameGeometry,
        backend: Backend,
    },
    Closed,
}

/// Writes a stream of frames to one video file.
///
/// `.mp4` destinations are buffered as numbered PNGs and muxed by the
/// external ffmpeg binary when the session closes, optionally with an audio
/// track merged in. Every other destination streams through the linked
/// encoder.
///
/// Call [`close`](Self::close) to get the [`TeardownReport`]; dropping an
/// open session runs the same teardown and only logs the outcome.
pub struct VideoWriterSession {
    config: SessionConfig,
    strategy: EncodingStrategy,
    runner: Box<dyn ProcessRunner>,
    logger: Box<dyn PipelineLogger>,
    state: SessionState,
    frames_written: u64,
}

impl VideoWriterSession {
    /// Builds a session on the ffmpeg-backed infrastructure.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_backends(config, SessionBackends::default())
    }

    pub fn with_backends(
        config: SessionConfig,
        backends: SessionBackends,
    ) -> Result<Self, SessionError> {
        let fps = config.fps();
        if !(fps.is_finite() && fps > 0.0) {
            return Err(SessionError::InvalidFrameRate { fps });
        }
        if let Some(crf) = config.crf() {
            if crf > MAX_CRF {
                return Err(SessionError::InvalidQuality { crf, max: MAX_CRF });
            }
        }

        let strategy = EncodingStrategy::for_destination(config.destination());
        if let Some(audio) = config.audio_source() {
            if !strategy.is_buffered() {
                return Err(SessionError::AudioRequiresMp4 {
                    audio: audio.to_path_buf(),
                    destination: config.destination().to_path_buf(),
                });
            }
        }
        if strategy.is_buffered()
            && !ffmpeg_cli::is_available(backends.process_runner.as_ref(), config.ffmpeg_binary())
        {
            return Err(SessionError::ExternalToolMissing {
                binary: config.ffmpeg_binary().to_path_buf(),
                destination: config.destination().to_path_buf(),
            });
        }

        Ok(Self {
            config,
            strategy,
            runner: backends.process_runner,
            logger: backends.logger,
            state: SessionState::Unstarted {
                encoder: backends.encoder,
                image_writer: backends.image_writer,
            },
            frames_written: 0,
        })
    }

    /// Writes one composed frame: the given frames placed side by side.
    ///
    /// The first accepted call fixes the session geometry and sets up the
    /// backend. Input errors leave the session as it was.
    pub fn write(&mut self, frames: &[Frame]) -> Result<(), SessionError> {
        if matches!(self.state, SessionState::Closed) {
            return Err(SessionError::Closed);
        }
        validate_batch(frames)?;
        let actual = FrameGeometry::side_by_side(frames).ok_or(SessionError::EmptyFrameList)?;
        if matches!(self.state, SessionState::Unstarted { .. }) {
            self.start(actual)?;
        }

        let started = Instant::now();
        let SessionState::Started { geometry, backend } = &mut self.state else {
            return Err(SessionError::Closed);
        };
        // Checked before composing so a rejected batch is never copied.
        if actual != *geometry {
            return Err(SessionError::GeometryMismatch {
                expected: *geometry,
                actual,
            });
        }
        let composed = compose_horizontal(frames)?;

        match backend {
            Backend::Direct(encoder) => {
                encoder
                    .write(&composed)
                    .map_err(|source| SessionError::EncodeFrame {
                        path: self.config.destination().to_path_buf(),
                        source,
                    })?;
            }
            Backend::Buffered(buffer) => {
                buffer.persist(&composed)?;
            }
        }

        self.frames_written += 1;
        self.logger
            .timing("write", started.elapsed().as_secs_f64() * 1000.0);
        self.logger.frame_written(self.frames_written);
        Ok(())
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), SessionError> {
        self.write(std::slice::from_ref(frame))
    }

    /// True when the backend can take frames: the encoder is open (direct),
    /// or the frame buffer exists (buffered).
    pub fn is_opened(&self) -> bool {
        match &self.state {
            SessionState::Started {
                backend: Backend::Direct(encoder),
                ..
            } => encoder.is_opened(),
            SessionState::Started {
                backend: Backend::Buffered(_),
                ..
            } => true,
            SessionState::Unstarted { .. } | SessionState::Closed => false,
        }
    }

    pub fn geometry(&self) -> Option<FrameGeometry> {
        match &self.state {
            SessionState::Started { geometry, .. } => Some(*geometry),
            _ => None,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn strategy(&self) -> &EncodingStrategy {
        &self.strategy
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs the deferred teardown steps and reports each one's outcome.
    pub fn close(mut self) -> TeardownReport {
        self.teardown()
    }

    fn start(&mut self, geometry: FrameGeometry) -> Result<(), SessionError> {
        // Any failure below is fatal to the session, so it stays closed.
        let (mut encoder, image_writer) =
            match std::mem::replace(&mut self.state, SessionState::Closed) {
                SessionState::Unstarted {
                    encoder,
                    image_writer,
                } => (encoder, image_writer),
                other => {
                    self.state = other;
                    return Ok(());
                }
            };

        let backend = match &self.strategy {
            EncodingStrategy::DirectEncode => {
                let settings = EncoderSettings {
                    codec: self.config.codec().to_string(),
                    fps: self.config.fps(),
                    geometry,
                };
                encoder
                    .open(self.config.destination(), &settings)
                    .map_err(|source| SessionError::BackendOpen {
                        path: self.config.destination().to_path_buf(),
                        codec: self.config.codec().to_string(),
                        source,
                    })?;
                self.logger.info(&format!(
                    "Writing {geometry} frames to {} with {} at {} fps",
                    self.config.destination().display(),
                    self.config.codec(),
                    self.config.fps()
                ));
                Backend::Direct(encoder)
            }
            EncodingStrategy::BufferedPipeline { buffer_dir } => {
                let buffer = FrameBuffer::create(buffer_dir, image_writer).map_err(|source| {
                    if source.kind() == std::io::ErrorKind::AlreadyExists {
                        SessionError::BufferDirectoryExists {
                            path: buffer_dir.clone(),
                        }
                    } else {
                        SessionError::BufferDirectory {
                            path: buffer_dir.clone(),
                            source,
                        }
                    }
                })?;
                self.logger.info(&format!(
                    "Temporarily saving {geometry} frames as images in {}",
                    buffer_dir.display()
                ));
                Backend::Buffered(buffer)
            }
        };

        self.state = SessionState::Started { geometry, backend };
        Ok(())
    }

    fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::new();
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Started {
                backend: Backend::Direct(encoder),
                ..
            } => self.finish_stream(encoder, &mut report),
            SessionState::Started {
                backend: Backend::Buffered(buffer),
                ..
            } => self.finish_pipeline(buffer, &mut report),
            SessionState::Unstarted { .. } | SessionState::Closed => return report,
        }
        self.logger.summary();
        report
    }

    fn finish_stream(&mut self, mut encoder: Box<dyn VideoEncoder>, report: &mut TeardownReport) {
        match encoder.close() {
            Ok(()) => {
                self.logger.info(&format!(
                    "Video saved to {} ({} frames)",
                    self.config.destination().display(),
                    self.frames_written
                ));
                report.record(TeardownStep::FinishStream, StepOutcome::Completed);
            }
            Err(e) => {
                let failure = PipelineError::Backend {
                    step: TeardownStep::FinishStream,
                    message: e.to_string(),
                };
                self.logger.warning(&failure.to_string());
                report.record(TeardownStep::FinishStream, StepOutcome::Failed(failure));
            }
        }
    }

    fn finish_pipeline(&mut self, buffer: FrameBuffer, report: &mut TeardownReport) {
        let buffer_dir = buffer.dir().to_path_buf();
        if buffer.count() == 0 {
            if let Err(e) = std::fs::remove_dir_all(&buffer_dir) {
                log::debug!("Could not remove empty frame buffer {}: {e}", buffer_dir.display());
            }
            return;
        }

        let mux = ffmpeg_cli::image_sequence_command(
            self.config.ffmpeg_binary(),
            &buffer_dir,
            self.config.fps(),
            self.config.crf(),
            self.config.destination(),
        );
        self.logger.info(&format!(
            "Creating {} from {} buffered images by running:\n{mux}",
            self.config.destination().display(),
            buffer.count()
        ));
        let muxed = self.run_step(TeardownStep::MuxSequence, &mux, report);
        drop(buffer);

        if muxed {
            self.remove_buffer(&buffer_dir, report);
        } else {
            self.logger.warning(&format!(
                "Buffered frames were kept in {} so no frames are lost",
                buffer_dir.display()
            ));
            report.record(
                TeardownStep::RemoveBuffer,
                StepOutcome::Skipped("mux failed; buffered frames kept"),
            );
        }

        if let Some(audio) = self.config.audio_source().map(Path::to_path_buf) {
            if muxed {
                self.merge_audio(&audio, report);
            } else {
                report.record(
                    TeardownStep::MergeAudio,
                    StepOutcome::Skipped("no video to merge audio into"),
                );
            }
        }
    }

    fn remove_buffer(&mut self, buffer_dir: &Path, report: &mut TeardownReport) {
        match std::fs::remove_dir_all(buffer_dir) {
            Ok(()) => {
                self.logger
                    .info("Video saved and temporary image folder removed.");
                report.record(TeardownStep::RemoveBuffer, StepOutcome::Completed);
            }
            Err(source) => {
                let failure = PipelineError::Filesystem {
                    step: TeardownStep::RemoveBuffer,
                    path: buffer_dir.to_path_buf(),
                    source,
                };
                self.logger.warning(&failure.to_string());
                report.record(TeardownStep::RemoveBuffer, StepOutcome::Failed(failure));
            }
        }
    }

    fn merge_audio(&mut self, audio: &Path, report: &mut TeardownReport) {
        let destination = self.config.destination().to_path_buf();
        let merged: PathBuf = merge_output_for(&destination);
        let command = ffmpeg_cli::audio_merge_command(
            self.config.ffmpeg_binary(),
            &destination,
            audio,
            &merged,
        );
        self.logger.info(&format!(
            "Adding audio from {} by running:\n{command}",
            audio.display()
        ));

        if !self.run_step(TeardownStep::MergeAudio, &command, report) {
            if merged.exists() {
                if let Err(e) = std::fs::remove_file(&merged) {
                    log::debug!("Could not remove partial output {}: {e}", merged.display());
                }
            }
            self.logger.warning(&format!(
                "{} was kept without audio",
                destination.display()
            ));
            report.record(
                TeardownStep::ReplaceDestination,
                StepOutcome::Skipped("audio merge failed; silent video kept"),
            );
            return;
        }

        match std::fs::rename(&merged, &destination) {
            Ok(()) => {
                self.logger
                    .info(&format!("Audio added to {}", destination.display()));
                report.record(TeardownStep::ReplaceDestination, StepOutcome::Completed);
            }
            Err(source) => {
                let failure = PipelineError::Filesystem {
                    step: TeardownStep::ReplaceDestination,
                    path: merged,
                    source,
                };
                self.logger.warning(&failure.to_string());
                report.record(
                    TeardownStep::ReplaceDestination,
                    StepOutcome::Failed(failure),
                );
            }
        }
    }

    /// Runs one external command, records its outcome, and returns whether
    /// it exited with status zero.
    fn run_step(
        &mut self,
        step: TeardownStep,
        command: &ExternalCommand,
        report: &mut TeardownReport,
    ) -> bool {
        let started = Instant::now();
        let result = self.runner.run(command);
        self.logger
            .timing(&step.to_string(), started.elapsed().as_secs_f64() * 1000.0);

        let failure = match result {
            Ok(outcome) if outcome.success() => {
                report.record(step, StepOutcome::Completed);
                return true;
            }
            Ok(outcome) => PipelineError::Command {
                step,
                command: command.to_string(),
                exit_code: outcome.exit_code,
                diagnostics: outcome.stderr,
            },
            Err(source) => PipelineError::Spawn {
                step,
                command: command.to_string(),
                source,
            },
        };
        self.logger.warning(&format!(
            "Video {} could not be completed: {failure}",
            self.config.destination().display()
        ));
        report.record(step, StepOutcome::Failed(failure));
        false
    }
}

impl Drop for VideoWriterSession {
    fn drop(&mut self) {
        if matches!(self.state, SessionState::Started { .. }) {
            let report = self.teardown();
            if !report.is_success() {
                log::warn!(
                    "Session for {} was dropped without close(); teardown had {} failure(s)",
                    self.config.destination().display(),
                    report.failures().count()
                );
            }
        }
    }
}
