use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Deferred work done when a session closes, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TeardownStep {
    /// Direct strategy: flush the encoder and finalize the container.
    FinishStream,
    /// Buffered pipeline: image sequence to video.
    MuxSequence,
    /// Buffered pipeline: delete the frame buffer directory.
    RemoveBuffer,
    /// Buffered pipeline: copy an audio stream into the muxed video.
    MergeAudio,
    /// Buffered pipeline: move the merged file over the destination.
    ReplaceDestination,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FinishStream => "finish stream",
            Self::MuxSequence => "mux image sequence",
            Self::RemoveBuffer => "remove frame buffer",
            Self::MergeAudio => "merge audio",
            Self::ReplaceDestination => "replace destination",
        };
        f.write_str(name)
    }
}

/// A failed teardown step. Reported, never raised.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(
        "{step} failed (exit code {}). {}Make sure you can run the following command \
         without errors from a terminal:\n{command}",
        .exit_code.map_or_else(|| "none, killed by signal".to_string(), |c| c.to_string()),
        diagnostics_line(.diagnostics)
    )]
    Command {
        step: TeardownStep,
        command: String,
        exit_code: Option<i32>,
        diagnostics: String,
    },

    #[error("{step} failed: could not start `{command}`: {source}")]
    Spawn {
        step: TeardownStep,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} failed for {path}: {source}")]
    Filesystem {
        step: TeardownStep,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} failed: {message}")]
    Backend { step: TeardownStep, message: String },
}

fn diagnostics_line(diagnostics: &str) -> String {
    let last = diagnostics.lines().rev().find(|l| !l.trim().is_empty());
    match last {
        Some(line) => format!("Last output: {}. ", line.trim()),
        None => String::new(),
    }
}

impl PipelineError {
    pub fn step(&self) -> TeardownStep {
        match self {
            Self::Command { step, .. }
            | Self::Spawn { step, .. }
            | Self::Filesystem { step, .. }
            | Self::Backend { step, .. } => *step,
        }
    }

    /// The literal command that failed, if the step ran one.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Command { command, .. } | Self::Spawn { command, .. } => Some(command),
            Self::Filesystem { .. } | Self::Backend { .. } => None,
        }
    }
}

#[derive(Debug)]
pub enum StepOutcome {
    Completed,
    Skipped(&'static str),
    Failed(PipelineError),
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// What happened at teardown, step by step.
#[derive(Debug, Default)]
pub struct TeardownReport {
    steps: Vec<(TeardownStep, StepOutcome)>,
}

impl TeardownReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: TeardownStep, outcome: StepOutcome) {
        self.steps.push((step, outcome));
    }

    pub fn steps(&self) -> &[(TeardownStep, StepOutcome)] {
        &self.steps
    }

    pub fn outcome(&self, step: TeardownStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PipelineError> {
        self.steps.iter().filter_map(|(_, outcome)| match outcome {
            StepOutcome::Failed(e) => Some(e),
            _ => None,
        })
    }

    /// True when no step failed. Skipped steps do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_failure(step: TeardownStep, stderr: &str) -> PipelineError {
        PipelineError::Command {
            step,
            command: "ffmpeg -y -i in out.mp4".to_string(),
            exit_code: Some(1),
            diagnostics: stderr.to_string(),
        }
    }

    #[test]
    fn test_command_failure_message() {
        let text =
            command_failure(TeardownStep::MuxSequence, "line one\nNo such file\n\n").to_string();
        assert!(text.starts_with("mux image sequence failed (exit code 1)"));
        assert!(text.contains("Last output: No such file."));
        assert!(text.ends_with("ffmpeg -y -i in out.mp4"));
    }

    #[test]
    fn test_signal_exit_is_described() {
        let err = PipelineError::Command {
            step: TeardownStep::MergeAudio,
            command: "ffmpeg".to_string(),
            exit_code: None,
            diagnostics: String::new(),
        };
        assert!(err.to_string().contains("killed by signal"));
        assert_eq!(err.command(), Some("ffmpeg"));
        assert_eq!(err.step(), TeardownStep::MergeAudio);
    }

    #[test]
    fn test_report_queries() {
        let mut report = TeardownReport::new();
        assert!(report.is_empty());
        assert!(report.is_success());

        report.record(
            TeardownStep::MuxSequence,
            StepOutcome::Failed(command_failure(TeardownStep::MuxSequence, "")),
        );
        report.record(TeardownStep::RemoveBuffer, StepOutcome::Skipped("mux failed"));

        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert!(matches!(
            report.outcome(TeardownStep::RemoveBuffer),
            Some(StepOutcome::Skipped(_))
        ));
        assert!(report.outcome(TeardownStep::MergeAudio).is_none());
    }
}
