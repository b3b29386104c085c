use std::ffi::{OsStr, OsString};
use std::fmt;

/// An external program invocation as a structured argument list.
///
/// Never passed through a shell. `Display` renders a copy-pasteable command
/// line for operators reproducing a failure by hand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// POSIX single-quoting, applied only when the word needs it.
fn shell_quote(word: &OsStr) -> String {
    let text = word.to_string_lossy();
    let safe = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=%+,@".contains(c));
    if safe {
        text.into_owned()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}

/// Result of a finished external process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured stderr, kept for diagnostics.
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external programs to completion, blocking the caller.
///
/// There is no timeout: a hung process hangs the caller.
pub trait ProcessRunner: Send {
    /// `Err` means the process could not be started at all.
    fn run(&self, command: &ExternalCommand) -> Result<ProcessOutcome, std::io::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_builder_collects_args() {
        let cmd = ExternalCommand::new("ffmpeg").arg("-y").args(["-i", "in.png"]);
        assert_eq!(cmd.program(), "ffmpeg");
        assert_eq!(cmd.get_args(), &["-y", "-i", "in.png"]);
    }

    #[rstest]
    #[case::plain("out.mp4", "out.mp4")]
    #[case::pattern("/tmp/buf/%012d.png", "/tmp/buf/%012d.png")]
    #[case::space("my video.mp4", "'my video.mp4'")]
    #[case::quote("it's.mp4", r"'it'\''s.mp4'")]
    #[case::empty("", "''")]
    #[case::filter("pad=ceil(iw/2)*2:ceil(ih/2)*2", "'pad=ceil(iw/2)*2:ceil(ih/2)*2'")]
    fn test_display_quoting(#[case] arg: &str, #[case] expected: &str) {
        let cmd = ExternalCommand::new("ffmpeg").arg(arg);
        assert_eq!(cmd.to_string(), format!("ffmpeg {expected}"));
    }

    #[rstest]
    #[case(Some(0), true)]
    #[case(Some(1), false)]
    #[case(None, false)]
    fn test_outcome_success(#[case] exit_code: Option<i32>, #[case] expected: bool) {
        let outcome = ProcessOutcome {
            exit_code,
            stderr: String::new(),
        };
        assert_eq!(outcome.success(), expected);
    }
}
