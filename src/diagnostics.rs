//! Installation diagnostics.
//!
//! Verifies that the whisper.cpp install, its executables and the working
//! directories are in place before the server is started.

use crate::config::Config;
use crate::models::catalog;
use std::path::Path;

/// Result of a single check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Present and usable
    Ok,
    /// Missing
    NotFound,
    /// Present but with issues (e.g., not executable)
    Warning(String),
}

impl CheckResult {
    pub fn is_fatal(&self) -> bool {
        matches!(self, CheckResult::NotFound)
    }
}

/// Check that `path` is an existing directory.
fn check_directory(path: &Path) -> CheckResult {
    if path.is_dir() {
        CheckResult::Ok
    } else if path.exists() {
        CheckResult::Warning(format!("{} exists but is not a directory", path.display()))
    } else {
        CheckResult::NotFound
    }
}

/// Check that `path` is a file the current user can execute.
fn check_executable(path: &Path) -> CheckResult {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CheckResult::NotFound,
        Err(e) => return CheckResult::Warning(format!("Error checking {}: {}", path.display(), e)),
    };

    if !metadata.is_file() {
        return CheckResult::Warning(format!("{} is not a file", path.display()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return CheckResult::Warning(format!("{} is not executable", path.display()));
        }
    }

    CheckResult::Ok
}

/// Check the model directory and that it holds at least one model.
fn check_models(dir: &Path) -> CheckResult {
    match check_directory(dir) {
        CheckResult::Ok => {}
        other => return other,
    }
    if catalog::list_models(dir).is_empty() {
        CheckResult::Warning(format!("no ggml-*.bin models in {}", dir.display()))
    } else {
        CheckResult::Ok
    }
}

/// Scratch directory is created on startup, so absence is only a warning.
fn check_scratch_dir(dir: &Path) -> CheckResult {
    match check_directory(dir) {
        CheckResult::NotFound => CheckResult::Warning(format!(
            "{} does not exist yet (created on startup)",
            dir.display()
        )),
        other => other,
    }
}

/// Run every check for `config`, labelled for display.
pub fn run_checks(config: &Config) -> Vec<(String, CheckResult)> {
    let engine = &config.engine;
    vec![
        (
            format!("Engine directory ({})", engine.install_dir.display()),
            check_directory(&engine.install_dir),
        ),
        (
            format!("Streaming engine ({})", engine.stream_program().display()),
            check_executable(&engine.stream_program()),
        ),
        (
            format!("Single-shot engine ({})", engine.oneshot_program().display()),
            check_executable(&engine.oneshot_program()),
        ),
        (
            format!("Models ({})", engine.model_dir().display()),
            check_models(&engine.model_dir()),
        ),
        (
            format!("Scratch directory ({})", config.storage.scratch_dir.display()),
            check_scratch_dir(&config.storage.scratch_dir),
        ),
    ]
}

/// Run all checks and print results. Returns false if anything is missing.
pub fn check_installation(config: &Config) -> bool {
    println!("Checking whisper.cpp installation...\n");

    let mut healthy = true;
    for (label, result) in run_checks(config) {
        print!("{}: ", label);
        match &result {
            CheckResult::Ok => println!("✓ OK"),
            CheckResult::NotFound => println!("✗ NOT FOUND"),
            CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
        }
        healthy &= !result.is_fatal();
    }

    println!();
    if healthy {
        println!("✓ Ready to serve.");
    } else {
        println!("✗ Fix the missing items above or set [engine] install_dir in the config.");
    }
    healthy
}
