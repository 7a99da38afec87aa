//! Live catalog of whisper.cpp models on disk.
//!
//! The catalog is a directory listing taken at call time; nothing is cached,
//! so models dropped into or removed from the directory show up on the next
//! request.

use crate::error::{Result, VoicserveError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name prefix of whisper.cpp model files.
pub const MODEL_PREFIX: &str = "ggml-";

/// File name suffix of whisper.cpp model files.
pub const MODEL_SUFFIX: &str = ".bin";

/// Model short names (e.g. "tiny", "base.en") mapped to their file paths.
pub type ModelCatalog = BTreeMap<String, PathBuf>;

/// List `ggml-*.bin` files in `dir`.
///
/// An unreadable directory yields an empty catalog; the error is logged.
pub fn list_models(dir: &Path) -> ModelCatalog {
    let mut models = ModelCatalog::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "failed to list models");
            return models;
        }
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(name) = short_name(file_name) {
            models.insert(name.to_string(), entry.path());
        }
    }

    models
}

/// Short name for a model file name: `ggml-base.en.bin` → `base.en`.
pub fn short_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(MODEL_PREFIX)
        .and_then(|rest| rest.strip_suffix(MODEL_SUFFIX))
        .filter(|name| !name.is_empty())
}

/// File name for a model identifier.
///
/// Accepts either a short name (`tiny`) or a full file name
/// (`ggml-tiny.bin`). Identifiers that could escape the model directory are
/// rejected.
pub fn file_name(identifier: &str) -> Result<String> {
    let identifier = identifier.trim();
    if identifier.is_empty()
        || identifier.contains('/')
        || identifier.contains('\\')
        || identifier.contains("..")
    {
        return Err(VoicserveError::InvalidModelName {
            name: identifier.to_string(),
        });
    }

    if identifier.ends_with(MODEL_SUFFIX) {
        Ok(identifier.to_string())
    } else {
        Ok(format!("{}{}{}", MODEL_PREFIX, identifier, MODEL_SUFFIX))
    }
}

/// Resolve a model identifier to an existing file in `dir`.
pub fn resolve(dir: &Path, identifier: &str) -> Result<PathBuf> {
    let path = dir.join(file_name(identifier)?);
    if !path.is_file() {
        return Err(VoicserveError::ModelNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(path)
}
