//! Abstraction over external command execution for testability.
//!
//! This module provides the [`CommandRunner`] trait, which hides every `kit`
//! invocation behind a trait object so the workflow sequences can be tested
//! in-process without spawning subprocesses.
//!
//! # Production Usage
//!
//! [`RealCommandRunner`] delegates to [`std::process::Command`] and is the default
//! runner used by [`Kit`](crate::kit::Kit).
//!
//! # Testing Usage
//!
//! [`testing::MockCommandRunner`] records all calls and returns canned exit codes.

use anyhow::{Context, Result};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

/// Trait for abstracting external command execution.
///
/// Stored as `Arc<dyn CommandRunner>` in [`Kit`](crate::kit::Kit).
pub trait CommandRunner: Send + Sync {
    /// Run a command and return only its exit status (inherits stdio).
    fn run_status(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
    ) -> Result<ExitStatus>;

    /// Run a command with `input` written to its stdin.
    ///
    /// stdout and stderr are inherited. stdin is closed once `input` has been
    /// written so the child sees EOF.
    fn run_status_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
        input: &[u8],
    ) -> Result<ExitStatus>;
}

/// Options for command execution.
#[derive(Debug, Default, Clone)]
pub struct CommandOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
}

impl CommandOptions {
    /// Create options with a working directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
        }
    }

    fn apply(&self, cmd: &mut Command) {
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
    }
}

/// Production implementation that delegates to [`std::process::Command`].
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run_status(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
    ) -> Result<ExitStatus> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        options.apply(&mut cmd);
        cmd.status()
            .with_context(|| format!("Failed to run '{program}'"))
    }

    fn run_status_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        options: &CommandOptions,
        input: &[u8],
    ) -> Result<ExitStatus> {
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::piped());
        options.apply(&mut cmd);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to run '{program}'"))?;

        // Take stdin so it is dropped (closed) before we wait.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(input) {
                Ok(()) => {}
                // The child closed stdin early; its exit status still decides the outcome.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    tracing::debug!(program, "Child closed stdin before reading all input");
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e)
                        .with_context(|| format!("Failed to write to stdin of '{program}'"));
                }
            }
        }

        child
            .wait()
            .with_context(|| format!("Failed to wait for '{program}'"))
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::os::unix::process::ExitStatusExt;
    use std::sync::Mutex;

    /// Recorded command invocation for test assertions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CommandCall {
        pub program: String,
        pub args: Vec<String>,
        pub cwd: Option<PathBuf>,
        pub stdin: Option<String>,
    }

    impl CommandCall {
        /// The argument vector joined with spaces, for compact assertions.
        pub fn line(&self) -> String {
            self.args.join(" ")
        }
    }

    /// Mock runner that records calls and returns scripted exit codes.
    ///
    /// Calls beyond the scripted codes exit 0.
    #[derive(Default)]
    pub struct MockCommandRunner {
        calls: Mutex<Vec<CommandCall>>,
        exit_codes: Mutex<VecDeque<i32>>,
    }

    impl MockCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the exit codes of the next calls, in order.
        pub fn with_exit_codes(codes: impl IntoIterator<Item = i32>) -> Self {
            Self {
                calls: Mutex::default(),
                exit_codes: Mutex::new(codes.into_iter().collect()),
            }
        }

        /// Get all recorded calls.
        pub fn calls(&self) -> Vec<CommandCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Get the argument lines of all recorded calls.
        pub fn lines(&self) -> Vec<String> {
            self.calls().iter().map(CommandCall::line).collect()
        }

        fn record(
            &self,
            program: &str,
            args: &[&str],
            options: &CommandOptions,
            stdin: Option<&[u8]>,
        ) -> ExitStatus {
            self.calls.lock().unwrap().push(CommandCall {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                cwd: options.cwd.clone(),
                stdin: stdin.map(|b| String::from_utf8_lossy(b).into_owned()),
            });
            let code = self.exit_codes.lock().unwrap().pop_front().unwrap_or(0);
            // Raw wait status: exit code lives in the high byte.
            ExitStatus::from_raw(code << 8)
        }
    }

    impl CommandRunner for MockCommandRunner {
        fn run_status(
            &self,
            program: &str,
            args: &[&str],
            options: &CommandOptions,
        ) -> Result<ExitStatus> {
            Ok(self.record(program, args, options, None))
        }

        fn run_status_with_stdin(
            &self,
            program: &str,
            args: &[&str],
            options: &CommandOptions,
            input: &[u8],
        ) -> Result<ExitStatus> {
            Ok(self.record(program, args, options, Some(input)))
        }
    }
}
