//! Default configuration constants for voicserve.
//!
//! Shared between the config types, the engine argument builders and the
//! streaming pipeline so the wire-visible values live in one place.

/// Sample rate the engine is told to expect, in Hz.
///
/// whisper.cpp models are trained on 16kHz audio; the one-shot path rejects
/// any other rate.
pub const SAMPLE_RATE: u32 = 16000;

/// Mean absolute amplitude (out of 32767) below which a frame counts as silence.
pub const VOLUME_THRESHOLD: f64 = 500.0;

/// Accumulated audio, in seconds, that triggers a flush to the engine.
pub const MIN_FLUSH_DURATION_SECS: f64 = 2.0;

/// Worker threads passed to the streaming engine (`-t`).
pub const ENGINE_THREADS: u32 = 8;

/// Streaming engine step size in milliseconds (`--step`).
pub const ENGINE_STEP_MS: u32 = 500;

/// Streaming engine window length in milliseconds (`--length`).
pub const ENGINE_LENGTH_MS: u32 = 5000;

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "ggml-tiny.bin";

/// Default whisper.cpp checkout containing the `stream` and `main` executables.
pub const ENGINE_INSTALL_DIR: &str = "/opt/whisper.cpp";

/// Streaming-mode executable name, relative to the install directory.
pub const STREAM_BINARY: &str = "stream";

/// Single-shot executable name, relative to the install directory.
pub const ONESHOT_BINARY: &str = "main";

/// Directory holding per-invocation scratch audio files.
pub const SCRATCH_DIR: &str = "outputs";

/// Default listen address.
pub const HOST: &str = "0.0.0.0";

/// Default listen port.
pub const PORT: u16 = 8000;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Engine marker printed for silent input.
pub const BLANK_AUDIO_MARKER: &str = "[BLANK_AUDIO]";

/// Streaming reply text sent when a flush yields no sentences.
pub const NO_TEXT_MESSAGE: &str = "未识别到文本";

/// One-shot text when the engine printed only `[BLANK_AUDIO]`.
pub const BLANK_AUDIO_MESSAGE: &str = "检测到空白音频";

/// One-shot text when the engine printed nothing.
pub const NO_SPEECH_MESSAGE: &str = "未检测到语音内容";

/// Prefix of the in-band error reply on the streaming connection.
pub const PROCESSING_ERROR_PREFIX: &str = "处理错误";
