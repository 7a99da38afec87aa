//! Per-connection streaming state machine.
//!
//! A session owns its gate and buffer outright. Each inbound binary message
//! is decoded, gated and buffered; once the buffer is ready it is drained and
//! transcribed inline, so a session never has more than one engine run in
//! flight.

use crate::audio::frame::AudioFrame;
use crate::audio::gate::{self, GateDecision, VolumeGate};
use crate::config::StreamConfig;
use crate::engine::invoker::TranscriptionInvoker;
use crate::engine::sanitize;
use crate::error::Result;
use crate::server::protocol::StreamReply;
use crate::stream::buffer::StreamBuffer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique session id for logging.
pub fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Lifecycle of a streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Receiving,
    Closed,
}

/// Message received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Binary(Vec<u8>),
    Text(String),
    Close,
}

/// Bidirectional message channel a session runs over.
///
/// `recv` returns `None` once the peer is gone.
#[async_trait::async_trait]
pub trait FrameTransport: Send {
    async fn recv(&mut self) -> Option<Result<Inbound>>;
    async fn send(&mut self, reply: &StreamReply) -> Result<()>;
}

/// Counters reported when a session closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub malformed: u64,
    pub rejected: u64,
    pub flushes: u64,
    pub failed_flushes: u64,
}

pub struct ConnectionSession {
    id: u64,
    state: SessionState,
    gate: VolumeGate,
    buffer: StreamBuffer,
    invoker: Arc<TranscriptionInvoker>,
    model: String,
    stats: SessionStats,
}

impl ConnectionSession {
    pub fn new(
        id: u64,
        invoker: Arc<TranscriptionInvoker>,
        model: impl Into<String>,
        config: &StreamConfig,
    ) -> Self {
        Self {
            id,
            state: SessionState::Open,
            gate: VolumeGate::new(config.volume_threshold),
            buffer: StreamBuffer::new(config.min_duration_secs),
            invoker,
            model: model.into(),
            stats: SessionStats::default(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Process one binary message and return the replies it produced.
    ///
    /// Malformed and quiet frames produce no replies.
    pub async fn handle_frame(&mut self, payload: &[u8]) -> Vec<StreamReply> {
        self.stats.frames += 1;

        let frame = match AudioFrame::decode(payload) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.malformed += 1;
                tracing::warn!(session = self.id, error = %e, "dropping frame");
                return Vec::new();
            }
        };

        let decision = self.gate.check(&frame);
        tracing::debug!(
            session = self.id,
            sample_rate = frame.sample_rate,
            sample_count = frame.sample_count,
            volume = decision.volume(),
            peak = gate::peak_amplitude(&frame.samples),
            "frame received"
        );

        if let GateDecision::Reject { volume } = decision {
            self.stats.rejected += 1;
            tracing::debug!(
                session = self.id,
                volume,
                threshold = self.gate.threshold(),
                "frame below volume threshold"
            );
            return Vec::new();
        }

        self.buffer.push(frame);
        if !self.buffer.is_ready() {
            return Vec::new();
        }
        self.flush().await
    }

    /// Drain the buffer, transcribe it and build the replies.
    ///
    /// The buffer is empty on return whatever the engine outcome.
    pub async fn flush(&mut self) -> Vec<StreamReply> {
        let seconds = self.buffer.accumulated_secs();
        let frames = self.buffer.pending_frames();
        let samples = self.buffer.drain();
        if frames == 0 {
            return Vec::new();
        }
        self.stats.flushes += 1;

        // Headers can declare audio the payload never carried.
        if samples.is_empty() {
            tracing::debug!(
                session = self.id,
                frames,
                seconds,
                "flushed frames carried no samples"
            );
            return vec![StreamReply::no_text()];
        }

        tracing::info!(
            session = self.id,
            frames,
            samples = samples.len(),
            seconds,
            model = %self.model,
            "flushing stream buffer"
        );

        let raw = match self.invoker.invoke_streaming(&samples, &self.model).await {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.failed_flushes += 1;
                tracing::error!(session = self.id, error = %e, "stream transcription failed");
                return vec![StreamReply::error(e)];
            }
        };

        let sentences = sanitize::sanitize(&raw);
        tracing::info!(session = self.id, ?sentences, "stream transcription result");

        if sentences.is_empty() {
            vec![StreamReply::no_text()]
        } else {
            sentences.into_iter().map(StreamReply::success).collect()
        }
    }

    /// Drive the session until the peer disconnects or a reply cannot be sent.
    ///
    /// Audio still buffered at close is discarded.
    pub async fn run<T: FrameTransport>(&mut self, transport: &mut T) -> SessionStats {
        self.state = SessionState::Receiving;
        tracing::info!(session = self.id, model = %self.model, "session opened");

        while let Some(inbound) = transport.recv().await {
            let payload = match inbound {
                Ok(Inbound::Binary(payload)) => payload,
                Ok(Inbound::Text(text)) => {
                    tracing::warn!(session = self.id, len = text.len(), "ignoring text message");
                    continue;
                }
                Ok(Inbound::Close) => break,
                Err(e) => {
                    tracing::warn!(session = self.id, error = %e, "receive failed");
                    break;
                }
            };

            for reply in self.handle_frame(&payload).await {
                if let Err(e) = transport.send(&reply).await {
                    tracing::warn!(session = self.id, error = %e, "failed to send reply");
                    return self.close();
                }
            }
        }

        self.close()
    }

    fn close(&mut self) -> SessionStats {
        self.state = SessionState::Closed;
        if !self.buffer.is_empty() {
            tracing::debug!(
                session = self.id,
                seconds = self.buffer.accumulated_secs(),
                "discarding buffered audio"
            );
        }
        tracing::info!(session = self.id, stats = ?self.stats, "session closed");
        self.stats
    }
}
