//! voicserve - speech-to-text over HTTP and WebSocket
//!
//! Streams 16-bit PCM frames into whisper.cpp's streaming executable and
//! serves single-shot WAV uploads through its batch executable.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod models;
pub mod server;
pub mod stream;

// Engine seam
pub use engine::invoker::TranscriptionInvoker;
pub use engine::runner::{CommandRunner, MockCommandRunner, SystemCommandRunner};

// Streaming
pub use audio::frame::AudioFrame;
pub use stream::session::{ConnectionSession, FrameTransport, Inbound};

// Server
pub use server::protocol::{RecognitionResponse, RecognitionStatus, StreamReply};
pub use server::recognizer::OneShotRecognizer;
pub use server::{AppState, router};

// Error handling
pub use error::{Result, VoicserveError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
