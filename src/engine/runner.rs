//! Subprocess execution behind a trait so the invoker can be tested
//! without a whisper.cpp installation.

use crate::error::{Result, VoicserveError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

/// Captured result of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait for running an external program to completion.
///
/// Object-safe, Send + Sync so a single runner can serve every session.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd`, capturing stdout and stderr.
    ///
    /// Returns `Err` only when the process could not be started; a nonzero
    /// exit is reported through `EngineOutput::code`.
    async fn run(&self, program: &Path, args: &[String], cwd: &Path) -> Result<EngineOutput>;
}

/// Production runner using `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &Path, args: &[String], cwd: &Path) -> Result<EngineOutput> {
        // kill_on_drop: if the awaiting task is cancelled the child is killed
        // before the caller's scratch guard deletes its input.
        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| VoicserveError::EngineSpawn {
                program: program.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(EngineOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// One call observed by [`MockCommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Contents of the `-f` input file at the time of the call, if it existed.
    pub input: Option<Vec<u8>>,
}

impl RecordedRun {
    /// Value following `flag` in the argument list.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Path passed with `-f`.
    pub fn input_path(&self) -> Option<PathBuf> {
        self.arg_after("-f").map(PathBuf::from)
    }

    /// The `-f` input decoded as little-endian 16-bit PCM.
    pub fn input_samples(&self) -> Option<Vec<i16>> {
        self.input.as_ref().map(|bytes| {
            bytes
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect()
        })
    }
}

/// Mock runner for testing
///
/// Returns a canned output (or spawn failure) and records every call,
/// snapshotting the `-f` input file while it still exists.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    stdout: String,
    stderr: String,
    code: Option<i32>,
    spawn_failure: bool,
    runs: Mutex<Vec<RecordedRun>>,
}

impl MockCommandRunner {
    /// Create a runner that exits 0 with empty output.
    pub fn new() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    /// Configure stdout for successful runs.
    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    /// Configure a nonzero exit with the given stderr.
    pub fn with_exit_code(mut self, code: i32, stderr: &str) -> Self {
        self.code = Some(code);
        self.stderr = stderr.to_string();
        self
    }

    /// Configure the runner to fail as if the program were missing.
    pub fn with_spawn_failure(mut self) -> Self {
        self.spawn_failure = true;
        self
    }

    /// Calls observed so far.
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &Path, args: &[String], cwd: &Path) -> Result<EngineOutput> {
        let mut run = RecordedRun {
            program: program.to_path_buf(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            input: None,
        };
        run.input = run.input_path().and_then(|p| std::fs::read(p).ok());

        if let Ok(mut runs) = self.runs.lock() {
            runs.push(run);
        }

        if self.spawn_failure {
            return Err(VoicserveError::EngineSpawn {
                program: program.display().to_string(),
                message: "mock spawn failure".to_string(),
            });
        }

        Ok(EngineOutput {
            code: self.code,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }
}
