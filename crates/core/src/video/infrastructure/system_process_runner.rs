use std::process::{Command, Stdio};

use crate::video::domain::process_runner::{ExternalCommand, ProcessOutcome, ProcessRunner};

/// Runs commands as child processes of the current one.
///
/// Stdout is discarded; stderr is captured so failures can be reported.
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &ExternalCommand) -> Result<ProcessOutcome, std::io::Error> {
        log::debug!("Running: {command}");
        let output = Command::new(command.program())
            .args(command.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ProcessOutcome {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
