//! Invocation of the whisper.cpp executables.
//!
//! Each call owns a [`ScratchFile`] for the duration of the engine run, so
//! the audio handed to the engine is removed whether the run succeeds,
//! fails, or the calling task is cancelled.

use crate::audio::wav;
use crate::config::{Config, EngineConfig};
use crate::engine::runner::CommandRunner;
use crate::engine::scratch::ScratchFile;
use crate::error::{Result, VoicserveError};
use crate::models::catalog::{self, ModelCatalog};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A fully specified engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub program: PathBuf,
    pub input: PathBuf,
    pub model: PathBuf,
    pub args: Vec<String>,
}

impl TranscriptionRequest {
    /// Streaming-mode run over headerless PCM.
    pub fn streaming(engine: &EngineConfig, model: PathBuf, input: PathBuf) -> Self {
        let args = vec![
            "-m".to_string(),
            model.display().to_string(),
            "-f".to_string(),
            input.display().to_string(),
            "-t".to_string(),
            engine.threads.to_string(),
            "--step".to_string(),
            engine.step_ms.to_string(),
            "--length".to_string(),
            engine.length_ms.to_string(),
            "-nr".to_string(),
            "-sr".to_string(),
            engine.sample_rate.to_string(),
            "-ch".to_string(),
            "1".to_string(),
            "-bd".to_string(),
            "16".to_string(),
        ];
        Self {
            program: engine.stream_program(),
            input,
            model,
            args,
        }
    }

    /// Single-shot run over a WAV file: auto language, no progress, no
    /// timestamps, unlimited segment length.
    pub fn one_shot(engine: &EngineConfig, model: PathBuf, input: PathBuf) -> Self {
        let args = vec![
            "-m".to_string(),
            model.display().to_string(),
            "-f".to_string(),
            input.display().to_string(),
            "-l".to_string(),
            "auto".to_string(),
            "-np".to_string(),
            "-nt".to_string(),
            "--max-len".to_string(),
            "0".to_string(),
        ];
        Self {
            program: engine.oneshot_program(),
            input,
            model,
            args,
        }
    }
}

/// Runs the engine against scratch files in a dedicated directory.
pub struct TranscriptionInvoker {
    engine: EngineConfig,
    scratch_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl TranscriptionInvoker {
    pub fn new(engine: EngineConfig, scratch_dir: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            engine,
            scratch_dir,
            runner,
        }
    }

    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(
            config.engine.clone(),
            config.storage.scratch_dir.clone(),
            runner,
        )
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Current contents of the model directory.
    pub async fn models(&self) -> ModelCatalog {
        let dir = self.engine.model_dir();
        match blocking(move || Ok(catalog::list_models(&dir))).await {
            Ok(models) => models,
            Err(e) => {
                tracing::error!(error = %e, "model listing task failed");
                ModelCatalog::new()
            }
        }
    }

    async fn resolve_model(&self, model: &str) -> Result<PathBuf> {
        let dir = self.engine.model_dir();
        let model = model.to_string();
        blocking(move || catalog::resolve(&dir, &model)).await
    }

    /// Transcribe buffered stream audio; returns raw engine stdout.
    pub async fn invoke_streaming(&self, samples: &[i16], model: &str) -> Result<String> {
        let model = self.resolve_model(model).await?;
        let scratch = ScratchFile::write_pcm(&self.scratch_dir, samples).await?;
        tracing::info!(
            path = %scratch.path().display(),
            samples = samples.len(),
            "saved buffered audio for streaming engine"
        );

        let request =
            TranscriptionRequest::streaming(&self.engine, model, scratch.path().to_path_buf());
        self.execute(&request).await
    }

    /// Transcribe a 16kHz WAV file; returns raw engine stdout.
    ///
    /// The sample rate is checked before the engine runs and a mismatch is
    /// rejected with `UnsupportedFormat`.
    pub async fn invoke_one_shot(&self, wav_path: &Path, model: &str) -> Result<String> {
        let path = wav_path.to_path_buf();
        let rate = self.engine.sample_rate;
        blocking(move || wav::require_sample_rate(&path, rate)).await?;
        let model = self.resolve_model(model).await?;

        let request =
            TranscriptionRequest::one_shot(&self.engine, model, wav_path.to_path_buf());
        self.execute(&request).await
    }

    async fn execute(&self, request: &TranscriptionRequest) -> Result<String> {
        tracing::info!(
            program = %request.program.display(),
            args = %request.args.join(" "),
            "running engine"
        );

        let output = self
            .runner
            .run(&request.program, &request.args, &self.engine.install_dir)
            .await?;

        if !output.stderr.is_empty() {
            tracing::debug!(stderr = %output.stderr, "engine stderr");
        }

        if !output.success() {
            tracing::error!(code = ?output.code, stderr = %output.stderr, "engine failed");
            return Err(VoicserveError::EngineInvocation {
                code: output.code,
                stderr: output.stderr,
            });
        }

        tracing::info!(stdout = %output.stdout.trim(), "engine output");
        Ok(output.stdout)
    }
}

/// Run filesystem and WAV header work off the async worker threads.
async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| VoicserveError::Server {
            message: format!("Blocking task failed: {}", e),
        })?
}
