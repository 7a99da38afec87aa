//! Single-request recognition of an uploaded WAV file.

use crate::engine::invoker::TranscriptionInvoker;
use crate::engine::sanitize;
use crate::engine::scratch::ScratchFile;
use crate::error::Result;
use crate::server::protocol::{RecognitionResponse, RecognitionStatus};
use std::sync::Arc;
use std::time::Instant;

/// Runs the one-shot engine over uploaded audio.
///
/// Shares the invoker with streaming sessions but keeps no state between
/// requests.
#[derive(Clone)]
pub struct OneShotRecognizer {
    invoker: Arc<TranscriptionInvoker>,
}

impl OneShotRecognizer {
    pub fn new(invoker: Arc<TranscriptionInvoker>) -> Self {
        Self { invoker }
    }

    /// Recognize a complete WAV file held in memory.
    ///
    /// `duration` in the response covers the engine run only.
    pub async fn recognize(&self, audio: &[u8], model: &str) -> Result<RecognitionResponse> {
        let scratch = ScratchFile::write(self.invoker.scratch_dir(), "wav", audio).await?;
        tracing::info!(
            path = %scratch.path().display(),
            bytes = audio.len(),
            model,
            "recognizing upload"
        );

        let started = Instant::now();
        let raw = self.invoker.invoke_one_shot(scratch.path(), model).await?;
        let duration = started.elapsed().as_secs_f64();

        let interpreted = sanitize::interpret_one_shot(&raw);
        let status = if interpreted.has_text() {
            RecognitionStatus::Success
        } else {
            RecognitionStatus::NoText
        };
        tracing::info!(?status, duration, text = interpreted.message(), "upload recognized");

        Ok(RecognitionResponse {
            text: interpreted.message().to_string(),
            duration,
            status,
        })
    }
}
