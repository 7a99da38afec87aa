//! Scratch audio files handed to the engine.
//!
//! A `ScratchFile` owns its path: dropping it removes the file. Every
//! invocation path holds the guard for exactly as long as the engine may
//! read the file, so cleanup happens on success, on error and on
//! cancellation alike.

use crate::error::{Result, VoicserveError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A file on disk that is deleted when the guard is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Writes `bytes` to a fresh `temp_<millis>_<seq>.<extension>` file in `dir`.
    pub async fn write(dir: &Path, extension: &str, bytes: &[u8]) -> Result<Self> {
        let path = unique_path(dir, extension);

        // Take ownership before writing so a partial write is also cleaned up.
        let guard = Self { path };
        tokio::fs::write(&guard.path, bytes)
            .await
            .map_err(|e| VoicserveError::Filesystem {
                path: guard.path.display().to_string(),
                message: format!("failed to write scratch file: {}", e),
            })?;

        tracing::debug!(path = %guard.path.display(), bytes = bytes.len(), "wrote scratch file");
        Ok(guard)
    }

    /// Writes samples as headerless little-endian 16-bit PCM.
    pub async fn write_pcm(dir: &Path, samples: &[i16]) -> Result<Self> {
        Self::write(dir, "raw", &pcm_bytes(samples)).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed scratch file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch file"
            ),
        }
    }
}

/// Encode samples as little-endian 16-bit PCM.
pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

fn unique_path(dir: &Path, extension: &str) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    dir.join(format!("temp_{}_{}.{}", millis, seq, extension))
}

/// Create the scratch directory if it does not exist.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| VoicserveError::Filesystem {
        path: dir.display().to_string(),
        message: format!("failed to create scratch directory: {}", e),
    })
}
