//! Streaming recognition: per-connection buffering and session loop.

pub mod buffer;
pub mod session;

pub use buffer::StreamBuffer;
pub use session::{ConnectionSession, FrameTransport, Inbound, SessionState, SessionStats};
