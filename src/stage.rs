//! One external process in a pipe chain.
//!
//! A [`Stage`] owns the full lifecycle of one spawned process: stdin/stdout
//! wiring at spawn time, handing the parent's pipe ends to whoever pumps
//! them, and joining the process for its exit code. Every spawned stage must
//! be waited on before its pipeline reports a result; a stage that is never
//! joined is a zombie process, which is a correctness bug here, not a style
//! issue. `Drop` wait is a backstop for early-return paths, not a substitute
//! for an explicit [`Stage::wait`].

use std::fs::File;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::debug;

use crate::error::{PipelineError, Result};

/// Program plus arguments for one stage.
#[derive(Debug, Clone)]
pub struct StageSpec {
    program: String,
    args: Vec<String>,
}

impl StageSpec {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Rendered command line, for diagnostics.
    pub fn command_line(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// Where a stage's stdin comes from.
pub enum StageInput {
    /// No input (`/dev/null`).
    Null,
    /// A new pipe; the parent keeps the write end and must take it via
    /// [`Stage::take_stdin`].
    Piped,
    /// Directly from another stage's stdout. Ownership of the descriptor
    /// moves into the new child; the standard library closes the parent's
    /// copy right after the spawn, so the downstream reader observes
    /// end-of-stream as soon as the upstream process exits.
    FromStage(ChildStdout),
    /// From an already-open file.
    File(File),
}

/// Where a stage's stdout goes.
pub enum StageOutput {
    /// Discard (`/dev/null`).
    Null,
    /// A new pipe; the parent keeps the read end and must take it via
    /// [`Stage::take_stdout`].
    Piped,
    /// Into an already-open file.
    File(File),
}

/// A running (or joined) external process.
#[derive(Debug)]
pub struct Stage {
    child: Child,
    command: String,
    exit: Option<i32>,
}

impl Stage {
    /// Spawn the process with the requested wiring.
    ///
    /// stderr is inherited from the parent so stage diagnostics stay
    /// visible to the operator.
    pub fn spawn(spec: StageSpec, input: StageInput, output: StageOutput) -> Result<Self> {
        let command = spec.command_line();
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd.stdin(match input {
            StageInput::Null => Stdio::null(),
            StageInput::Piped => Stdio::piped(),
            StageInput::FromStage(upstream) => Stdio::from(upstream),
            StageInput::File(file) => Stdio::from(file),
        });
        cmd.stdout(match output {
            StageOutput::Null => Stdio::null(),
            StageOutput::Piped => Stdio::piped(),
            StageOutput::File(file) => Stdio::from(file),
        });
        let child = cmd.spawn().map_err(|source| PipelineError::Spawn {
            command: command.clone(),
            source,
        })?;
        debug!(command = %command, pid = child.id(), "spawned stage");
        Ok(Self {
            child,
            command,
            exit: None,
        })
    }

    /// Take the write end of the stage's stdin pipe.
    /// `None` unless spawned with [`StageInput::Piped`], or if already taken.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Take the read end of the stage's stdout pipe.
    /// `None` unless spawned with [`StageOutput::Piped`], or if already taken.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// The rendered command line this stage was spawned with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Block until the process terminates and return its exit code.
    ///
    /// Idempotent: a second call returns the cached code without touching
    /// the process again. A child killed by a signal has no exit code and is
    /// reported as `-1`, which keeps signal death from masquerading as
    /// success.
    pub fn wait(&mut self) -> Result<i32> {
        if let Some(code) = self.exit {
            return Ok(code);
        }
        let status = self.child.wait()?;
        let code = status.code().unwrap_or(-1);
        debug!(command = %self.command, code, "stage exited");
        self.exit = Some(code);
        Ok(code)
    }

    /// Exit code if the stage has already been joined.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        if self.exit.is_none() {
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    #[test]
    fn spawn_of_missing_binary_is_a_spawn_error() {
        let err = Stage::spawn(
            StageSpec::new("gzpipe-definitely-not-installed", Vec::<String>::new()),
            StageInput::Null,
            StageOutput::Null,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Spawn { .. }));
    }

    #[test]
    fn wait_twice_returns_the_cached_code() {
        let mut stage = Stage::spawn(
            StageSpec::new("sh", ["-c", "exit 3"]),
            StageInput::Null,
            StageOutput::Null,
        )
        .unwrap();
        assert_eq!(stage.wait().unwrap(), 3);
        assert_eq!(stage.exit_code(), Some(3));
        assert_eq!(stage.wait().unwrap(), 3);
    }

    #[test]
    fn piped_stdout_is_readable_to_end_of_stream() {
        use std::io::Read;

        let mut stage = Stage::spawn(
            StageSpec::new("sh", ["-c", "printf 'hello\\n'"]),
            StageInput::Null,
            StageOutput::Piped,
        )
        .unwrap();
        let mut out = String::new();
        stage.take_stdout().unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello\n");
        assert_eq!(stage.wait().unwrap(), 0);
    }
}
