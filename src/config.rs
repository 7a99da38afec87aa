use crate::defaults;
use crate::error::{Result, VoicserveError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub stream: StreamConfig,
    pub storage: StorageConfig,
}

/// HTTP / WebSocket listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

/// External recognition engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// whisper.cpp checkout; also the working directory of every invocation.
    pub install_dir: PathBuf,
    /// Defaults to `<install_dir>/models` when unset.
    pub model_dir: Option<PathBuf>,
    pub stream_binary: String,
    pub oneshot_binary: String,
    pub threads: u32,
    pub step_ms: u32,
    pub length_ms: u32,
    pub sample_rate: u32,
    pub default_model: String,
}

/// Streaming buffer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    pub volume_threshold: f64,
    pub min_duration_secs: f64,
}

/// Scratch file configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub scratch_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(defaults::ENGINE_INSTALL_DIR),
            model_dir: None,
            stream_binary: defaults::STREAM_BINARY.to_string(),
            oneshot_binary: defaults::ONESHOT_BINARY.to_string(),
            threads: defaults::ENGINE_THREADS,
            step_ms: defaults::ENGINE_STEP_MS,
            length_ms: defaults::ENGINE_LENGTH_MS,
            sample_rate: defaults::SAMPLE_RATE,
            default_model: defaults::DEFAULT_MODEL.to_string(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            volume_threshold: defaults::VOLUME_THRESHOLD,
            min_duration_secs: defaults::MIN_FLUSH_DURATION_SECS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from(defaults::SCRATCH_DIR),
        }
    }
}

impl EngineConfig {
    /// Directory scanned for `ggml-*.bin` model files.
    pub fn model_dir(&self) -> PathBuf {
        self.model_dir
            .clone()
            .unwrap_or_else(|| self.install_dir.join("models"))
    }

    /// Full path of the streaming-mode executable.
    pub fn stream_program(&self) -> PathBuf {
        self.install_dir.join(&self.stream_binary)
    }

    /// Full path of the single-shot executable.
    pub fn oneshot_program(&self) -> PathBuf {
        self.install_dir.join(&self.oneshot_binary)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing file is `ConfigFileNotFound`; invalid TOML is `Config`.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VoicserveError::ConfigFileNotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only a missing file yields defaults; invalid TOML is reported.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(VoicserveError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOICSERVE_ENGINE_DIR → engine.install_dir
    /// - VOICSERVE_MODEL_DIR → engine.model_dir
    /// - VOICSERVE_MODEL → engine.default_model
    /// - VOICSERVE_HOST → server.host
    /// - VOICSERVE_PORT → server.port (ignored unless it parses)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("VOICSERVE_ENGINE_DIR")
            && !dir.is_empty()
        {
            self.engine.install_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("VOICSERVE_MODEL_DIR")
            && !dir.is_empty()
        {
            self.engine.model_dir = Some(PathBuf::from(dir));
        }

        if let Ok(model) = std::env::var("VOICSERVE_MODEL")
            && !model.is_empty()
        {
            self.engine.default_model = model;
        }

        if let Ok(host) = std::env::var("VOICSERVE_HOST")
            && !host.is_empty()
        {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("VOICSERVE_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            self.server.port = port;
        }

        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.stream.min_duration_secs > 0.0) {
            return Err(invalid(
                "stream.min_duration_secs",
                format!("must be positive, got {}", self.stream.min_duration_secs),
            ));
        }
        if !(self.stream.volume_threshold >= 0.0) {
            return Err(invalid(
                "stream.volume_threshold",
                format!("must not be negative, got {}", self.stream.volume_threshold),
            ));
        }
        if self.engine.threads == 0 {
            return Err(invalid("engine.threads", "must be at least 1".to_string()));
        }
        if self.engine.sample_rate == 0 {
            return Err(invalid(
                "engine.sample_rate",
                "must be positive".to_string(),
            ));
        }
        if self.engine.default_model.is_empty() {
            return Err(invalid(
                "engine.default_model",
                "must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voicserve/config.toml on Linux, or `None` when no
    /// config directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voicserve").join("config.toml"))
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn invalid(key: &str, message: String) -> VoicserveError {
    VoicserveError::ConfigInvalidValue {
        key: key.to_string(),
        message,
    }
}
