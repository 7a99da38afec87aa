//! HTTP and WebSocket front end.
//!
//! Routes:
//! - `GET /ws[?model=]` streaming recognition
//! - `POST /api/recognize[?model=]` one-shot upload (multipart field `file`)
//! - `GET /api/status` live model catalog

pub mod protocol;
pub mod recognizer;

use crate::config::Config;
use crate::engine::invoker::TranscriptionInvoker;
use crate::engine::runner::CommandRunner;
use crate::error::{Result, VoicserveError};
use crate::server::protocol::{ErrorBody, RecognitionResponse, StatusResponse, StreamReply};
use crate::server::recognizer::OneShotRecognizer;
use crate::stream::session::{self, ConnectionSession, FrameTransport, Inbound};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared, immutable server state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub invoker: Arc<TranscriptionInvoker>,
    pub recognizer: OneShotRecognizer,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        let invoker = Arc::new(TranscriptionInvoker::from_config(&config, runner));
        Self {
            config: Arc::new(config),
            recognizer: OneShotRecognizer::new(invoker.clone()),
            invoker,
        }
    }

    fn model_or_default(&self, requested: Option<String>) -> String {
        requested
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| self.config.engine.default_model.clone())
    }
}

/// Optional `?model=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct ModelQuery {
    pub model: Option<String>,
}

/// Error returned from HTTP handlers as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    /// Keep the status axum assigns, so an oversized upload stays a 413.
    pub fn multipart(context: &str, error: MultipartError) -> Self {
        Self {
            status: error.status(),
            detail: format!("{}: {}", context, error.body_text()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<VoicserveError> for ApiError {
    fn from(error: VoicserveError) -> Self {
        let status = match &error {
            VoicserveError::FrameDecode { .. } | VoicserveError::InvalidModelName { .. } => {
                StatusCode::BAD_REQUEST
            }
            VoicserveError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
            VoicserveError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, detail = %self.detail, "request failed");
        } else {
            tracing::warn!(status = %self.status, detail = %self.detail, "request rejected");
        }
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/ws", get(ws_handler))
        .route(
            "/api/recognize",
            post(recognize_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let address = format!("{}:{}", state.config.server.host, state.config.server.port);
    let address: SocketAddr = address
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address {}: {}", address, e))?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", address, e))?;
    let local = listener.local_addr()?;

    tracing::info!(
        address = %local,
        engine = %state.config.engine.install_dir.display(),
        models = %state.config.engine.model_dir().display(),
        "voicserve listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::running(state.invoker.models().await))
}

async fn recognize_handler(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
    mut multipart: Multipart,
) -> std::result::Result<Json<RecognitionResponse>, ApiError> {
    let model = state.model_or_default(query.model);

    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::multipart("Invalid multipart body", e))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::multipart("Failed to read upload", e))?;
        audio = Some(bytes);
        break;
    }
    let audio = audio.ok_or_else(|| ApiError::bad_request("Missing multipart field 'file'"))?;

    let response = state.recognizer.recognize(&audio, &model).await?;
    Ok(Json(response))
}

async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    let model = state.model_or_default(query.model);
    upgrade.on_upgrade(move |socket| handle_socket(state, socket, model))
}

async fn handle_socket(state: AppState, socket: WebSocket, model: String) {
    let mut transport = WebSocketTransport::new(socket);
    let mut session = ConnectionSession::new(
        session::next_session_id(),
        state.invoker.clone(),
        model,
        &state.config.stream,
    );
    session.run(&mut transport).await;
}

/// [`FrameTransport`] over an axum WebSocket.
pub struct WebSocketTransport {
    sender: SplitSink<WebSocket, Message>,
    receiver: SplitStream<WebSocket>,
}

impl WebSocketTransport {
    pub fn new(socket: WebSocket) -> Self {
        let (sender, receiver) = socket.split();
        Self { sender, receiver }
    }
}

#[async_trait::async_trait]
impl FrameTransport for WebSocketTransport {
    async fn recv(&mut self) -> Option<Result<Inbound>> {
        loop {
            let message = match self.receiver.next().await? {
                Ok(message) => message,
                Err(e) => {
                    return Some(Err(VoicserveError::Server {
                        message: format!("WebSocket receive failed: {}", e),
                    }));
                }
            };
            let inbound = match message {
                Message::Binary(data) => Inbound::Binary(data),
                Message::Text(text) => Inbound::Text(text),
                Message::Close(_) => Inbound::Close,
                // axum answers pings itself
                Message::Ping(_) | Message::Pong(_) => continue,
            };
            return Some(Ok(inbound));
        }
    }

    async fn send(&mut self, reply: &StreamReply) -> Result<()> {
        let payload = reply.to_json().map_err(|e| VoicserveError::Server {
            message: format!("Failed to encode reply: {}", e),
        })?;
        self.sender
            .send(Message::Text(payload))
            .await
            .map_err(|e| VoicserveError::Server {
                message: format!("WebSocket send failed: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::runner::MockCommandRunner;
    use axum::body::Body;
    use axum::http::{Request, header};
    use std::io::Cursor;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "voicserve-test-boundary";

    struct Harness {
        root: TempDir,
        runner: Arc<MockCommandRunner>,
        state: AppState,
    }

    fn harness_with(
        models: &[&str],
        runner: MockCommandRunner,
        configure: impl FnOnce(&mut Config),
    ) -> Harness {
        let root = TempDir::new().unwrap();
        let mut config = Config::default();
        config.engine.install_dir = root.path().to_path_buf();
        config.storage.scratch_dir = root.path().join("outputs");
        configure(&mut config);
        std::fs::create_dir_all(config.engine.model_dir()).unwrap();
        std::fs::create_dir_all(&config.storage.scratch_dir).unwrap();
        for name in models {
            std::fs::write(config.engine.model_dir().join(name), b"model").unwrap();
        }
        let runner = Arc::new(runner);
        let state = AppState::new(config, runner.clone());
        Harness {
            root,
            runner,
            state,
        }
    }

    fn state_with_models(models: &[&str]) -> (TempDir, AppState) {
        let harness = harness_with(models, MockCommandRunner::new(), |_| {});
        (harness.root, harness.state)
    }

    fn wav_bytes(sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..1600 {
                writer.write_sample((i % 100) as i16 * 40).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn multipart_body(field: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"clip.wav\"\r\n",
                field
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[test]
    fn test_api_error_status_mapping() {
        let cases = [
            (
                VoicserveError::InvalidModelName {
                    name: "../x".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                VoicserveError::ModelNotFound {
                    path: "/m/ggml-huge.bin".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                VoicserveError::UnsupportedFormat {
                    expected: "16000 Hz".to_string(),
                    actual: "44100 Hz".to_string(),
                },
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                VoicserveError::EngineInvocation {
                    code: Some(1),
                    stderr: "boom".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let message = error.to_string();
            let api = ApiError::from(error);
            assert_eq!(api.status(), expected, "for {}", message);
            assert_eq!(api.detail(), message);
        }
    }

    #[test]
    fn test_api_error_response_status() {
        let response = ApiError::bad_request("Missing multipart field 'file'").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_model_defaults_when_query_absent_or_blank() {
        let (_root, state) = state_with_models(&[]);
        assert_eq!(state.model_or_default(None), "ggml-tiny.bin");
        assert_eq!(state.model_or_default(Some("  ".to_string())), "ggml-tiny.bin");
        assert_eq!(state.model_or_default(Some("base".to_string())), "base");
    }

    #[tokio::test]
    async fn test_status_lists_models_live() {
        let (root, state) = state_with_models(&["ggml-tiny.bin"]);

        let Json(status) = status_handler(State(state.clone())).await;
        assert_eq!(status.status, "running");
        assert_eq!(status.models.len(), 1);
        assert!(status.models.contains_key("tiny"));

        std::fs::write(
            root.path().join("models").join("ggml-base.bin"),
            b"model",
        )
        .unwrap();
        let Json(status) = status_handler(State(state)).await;
        assert_eq!(status.models.len(), 2);
    }

    #[tokio::test]
    async fn test_status_route_returns_json() {
        let (_root, state) = state_with_models(&["ggml-tiny.bin", "ggml-base.bin"]);
        let request = Request::builder()
            .uri("/api/status")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert!(body["models"]["tiny"].is_string());
        assert!(body["models"]["base"].is_string());
    }

    #[tokio::test]
    async fn test_recognize_uses_default_model_without_query() {
        let harness = harness_with(
            &["ggml-tiny.bin"],
            MockCommandRunner::new().with_stdout(" Good morning.\n"),
            |_| {},
        );
        let upload = multipart_body("file", &wav_bytes(16000));
        let request = upload_request("/api/recognize", upload);

        let (status, body) = send(harness.state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["text"], "Good morning.");
        assert!(body["duration"].is_number());
        let runs = harness.runner.runs();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].arg_after("-m").unwrap().ends_with("ggml-tiny.bin"));
    }

    #[tokio::test]
    async fn test_recognize_honours_model_query() {
        let harness = harness_with(
            &["ggml-tiny.bin", "ggml-base.bin"],
            MockCommandRunner::new().with_stdout("[BLANK_AUDIO]"),
            |_| {},
        );
        let request = upload_request(
            "/api/recognize?model=base",
            multipart_body("file", &wav_bytes(16000)),
        );

        let (status, body) = send(harness.state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_text");
        let runs = harness.runner.runs();
        assert!(runs[0].arg_after("-m").unwrap().ends_with("ggml-base.bin"));
    }

    #[tokio::test]
    async fn test_recognize_missing_file_field_is_bad_request() {
        let harness = harness_with(&["ggml-tiny.bin"], MockCommandRunner::new(), |_| {});
        let upload = multipart_body("audio", &wav_bytes(16000));
        let request = upload_request("/api/recognize", upload);

        let (status, body) = send(harness.state, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Missing multipart field 'file'");
        assert_eq!(harness.runner.run_count(), 0);
    }

    #[tokio::test]
    async fn test_recognize_wrong_sample_rate_is_unsupported_media_type() {
        let harness = harness_with(&["ggml-tiny.bin"], MockCommandRunner::new(), |_| {});
        let upload = multipart_body("file", &wav_bytes(44100));
        let request = upload_request("/api/recognize", upload);

        let (status, body) = send(harness.state, request).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["detail"].as_str().unwrap().contains("44100 Hz"));
        assert_eq!(harness.runner.run_count(), 0);
    }

    #[tokio::test]
    async fn test_recognize_unknown_model_is_not_found() {
        let harness = harness_with(&["ggml-tiny.bin"], MockCommandRunner::new(), |_| {});
        let request = upload_request(
            "/api/recognize?model=huge",
            multipart_body("file", &wav_bytes(16000)),
        );

        let (status, body) = send(harness.state, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("ggml-huge.bin"));
    }

    #[tokio::test]
    async fn test_recognize_oversized_upload_is_payload_too_large() {
        let harness = harness_with(&["ggml-tiny.bin"], MockCommandRunner::new(), |config| {
            config.server.max_upload_bytes = 1024;
        });
        let request = upload_request("/api/recognize", multipart_body("file", &[7u8; 4096]));

        let (status, body) = send(harness.state, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["detail"].is_string());
        assert_eq!(harness.runner.run_count(), 0);
    }
}
