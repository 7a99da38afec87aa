//! Error types for voicserve.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoicserveError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to render configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Streaming protocol errors
    #[error("Malformed audio frame: {message}")]
    FrameDecode { message: String },

    // Audio format errors
    #[error("Unsupported audio format: expected {expected}, got {actual}")]
    UnsupportedFormat { expected: String, actual: String },

    // Model errors
    #[error("Model file not found at {path}")]
    ModelNotFound { path: String },

    #[error("Invalid model name: {name}")]
    InvalidModelName { name: String },

    // Engine errors
    #[error("Failed to start engine {program}: {message}")]
    EngineSpawn { program: String, message: String },

    #[error("Engine exited with {}: {stderr}", describe_exit(.code))]
    EngineInvocation { code: Option<i32>, stderr: String },

    // Scratch file and directory errors
    #[error("Filesystem error at {path}: {message}")]
    Filesystem { path: String, message: String },

    // Server errors
    #[error("Server error: {message}")]
    Server { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoicserveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = VoicserveError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = VoicserveError::ConfigInvalidValue {
            key: "stream.min_duration_secs".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for stream.min_duration_secs: must be positive"
        );
    }

    #[test]
    fn test_frame_decode_display() {
        let error = VoicserveError::FrameDecode {
            message: "expected at least 8 bytes, got 3".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed audio frame: expected at least 8 bytes, got 3"
        );
    }

    #[test]
    fn test_unsupported_format_display() {
        let error = VoicserveError::UnsupportedFormat {
            expected: "16000 Hz".to_string(),
            actual: "44100 Hz".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unsupported audio format: expected 16000 Hz, got 44100 Hz"
        );
    }

    #[test]
    fn test_model_not_found_display() {
        let error = VoicserveError::ModelNotFound {
            path: "/opt/whisper.cpp/models/ggml-huge.bin".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Model file not found at /opt/whisper.cpp/models/ggml-huge.bin"
        );
    }

    #[test]
    fn test_engine_invocation_display_with_code() {
        let error = VoicserveError::EngineInvocation {
            code: Some(3),
            stderr: "failed to load model".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Engine exited with code 3: failed to load model"
        );
    }

    #[test]
    fn test_engine_invocation_display_without_code() {
        let error = VoicserveError::EngineInvocation {
            code: None,
            stderr: String::new(),
        };
        assert!(error.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_engine_spawn_display() {
        let error = VoicserveError::EngineSpawn {
            program: "/opt/whisper.cpp/stream".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to start engine /opt/whisper.cpp/stream: No such file or directory"
        );
    }

    #[test]
    fn test_filesystem_display() {
        let error = VoicserveError::Filesystem {
            path: "outputs/temp_1.raw".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Filesystem error at outputs/temp_1.raw: permission denied"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: VoicserveError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: VoicserveError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: VoicserveError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VoicserveError>();
        assert_sync::<VoicserveError>();
    }
}
