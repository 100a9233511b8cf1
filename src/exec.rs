//! Subprocess execution
//!
//! Single seam through which every external command runs, local or remote.
//! Tasks are generic over [`Runner`] so the whole orchestration can be
//! exercised in tests against a scripted fake instead of the real binaries.

use std::fmt;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use crate::error::CommandError;

/// One fully-assembled command invocation: a program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Executes commands. The production implementation spawns real processes;
/// tests substitute a scripted fake that records every invocation.
pub trait Runner {
    /// Run to completion, capturing stdout/stderr.
    fn output(&self, cmd: &CommandLine) -> Result<Captured, CommandError>;

    /// Run to completion with stdio inherited, returning the exit code.
    fn status(&self, cmd: &CommandLine) -> Result<i32, CommandError>;
}

/// Runner backed by real subprocesses.
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn output(&self, cmd: &CommandLine) -> Result<Captured, CommandError> {
        debug!("exec (captured): {}", cmd);
        let out = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CommandError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;

        Ok(Captured {
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            code: out.status.code().unwrap_or(-1),
        })
    }

    fn status(&self, cmd: &CommandLine) -> Result<i32, CommandError> {
        debug!("exec: {}", cmd);
        let status = Command::new(&cmd.program)
            .args(&cmd.args)
            .status()
            .map_err(|source| CommandError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;

        Ok(status.code().unwrap_or(-1))
    }
}

/// Run a command and capture stdout, trimming the trailing newline.
/// A non-zero exit aborts with the command and its diagnostics.
pub fn capture(runner: &impl Runner, cmd: &CommandLine) -> Result<String, CommandError> {
    let captured = runner.output(cmd)?;
    if !captured.success() {
        if !captured.stderr.is_empty() {
            warn!("{}", captured.stderr.trim_end());
        }
        return Err(CommandError::Failed {
            command: cmd.to_string(),
            code: captured.code,
        });
    }

    let mut stdout = captured.stdout;
    if stdout.ends_with('\n') {
        stdout.pop();
        if stdout.ends_with('\r') {
            stdout.pop();
        }
    }
    Ok(stdout)
}

/// Run a command with inherited stdio, aborting on a non-zero exit.
pub fn run(runner: &impl Runner, cmd: &CommandLine) -> Result<(), CommandError> {
    let code = runner.status(cmd)?;
    if code != 0 {
        return Err(CommandError::Failed {
            command: cmd.to_string(),
            code,
        });
    }
    Ok(())
}

/// Run a command with inherited stdio, tolerating a non-zero exit.
/// Used for steps whose failures are known to be benign (e.g. a database
/// restore that warns about pre-existing objects).
pub fn run_tolerated(runner: &impl Runner, cmd: &CommandLine) -> Result<(), CommandError> {
    let code = runner.status(cmd)?;
    if code != 0 {
        warn!("Command exited with status {} (continuing): {}", code, cmd);
    }
    Ok(())
}

#[cfg(test)]
pub mod testing {
    //! Scripted runner for task tests.

    use std::cell::RefCell;

    use super::{Captured, CommandLine, Runner};
    use crate::error::CommandError;

    /// Records every invocation and answers captured queries from a script
    /// of `(needle, stdout)` pairs matched against the rendered command.
    #[derive(Default)]
    pub struct FakeRunner {
        responses: Vec<(&'static str, &'static str)>,
        fail_matching: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, needle: &'static str, stdout: &'static str) -> Self {
            self.responses.push((needle, stdout));
            self
        }

        /// Make any command whose rendering contains `needle` exit non-zero.
        pub fn fail_matching(mut self, needle: &'static str) -> Self {
            self.fail_matching = Some(needle);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub fn issued(&self, needle: &str) -> bool {
            self.calls.borrow().iter().any(|c| c.contains(needle))
        }

        fn record(&self, cmd: &CommandLine) -> (String, i32) {
            let rendered = cmd.to_string();
            self.calls.borrow_mut().push(rendered.clone());
            let code = match self.fail_matching {
                Some(needle) if rendered.contains(needle) => 1,
                _ => 0,
            };
            (rendered, code)
        }
    }

    impl Runner for FakeRunner {
        fn output(&self, cmd: &CommandLine) -> Result<Captured, CommandError> {
            let (rendered, code) = self.record(cmd);
            let stdout = self
                .responses
                .iter()
                .find(|(needle, _)| rendered.contains(needle))
                .map(|(_, stdout)| (*stdout).to_string())
                .unwrap_or_default();

            Ok(Captured {
                stdout,
                stderr: String::new(),
                code,
            })
        }

        fn status(&self, cmd: &CommandLine) -> Result<i32, CommandError> {
            let (_, code) = self.record(cmd);
            Ok(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeRunner;
    use super::*;

    #[test]
    fn test_command_line_display() {
        let cmd = CommandLine::new("git", ["push", "origin", "master"]);
        assert_eq!(cmd.to_string(), "git push origin master");
    }

    #[test]
    fn test_capture_trims_trailing_newline() {
        let runner = FakeRunner::new().respond("rev-parse", "abc1234\n");
        let cmd = CommandLine::new("git", ["rev-parse", "--short", "HEAD"]);
        let out = capture(&runner, &cmd).unwrap();
        assert_eq!(out, "abc1234");
    }

    #[test]
    fn test_capture_fails_on_nonzero_exit() {
        let runner = FakeRunner::new().fail_matching("rev-parse");
        let cmd = CommandLine::new("git", ["rev-parse", "HEAD"]);
        let err = capture(&runner, &cmd).unwrap_err();
        assert!(err.to_string().contains("git rev-parse HEAD"));
    }

    #[test]
    fn test_run_tolerated_swallows_failure() {
        let runner = FakeRunner::new().fail_matching("psql");
        let cmd = CommandLine::new("psql", ["-U", "app", "appdb"]);
        assert!(run_tolerated(&runner, &cmd).is_ok());
    }

    #[test]
    fn test_system_runner_captures_output() {
        // `sh` is the one binary the whole tool presumes present.
        let cmd = CommandLine::new("sh", ["-c", "printf 'hello\\n'"]);
        let out = capture(&SystemRunner, &cmd).unwrap();
        assert_eq!(out, "hello");
    }
}
