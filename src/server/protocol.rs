//! JSON messages exchanged with streaming and HTTP clients.

use crate::defaults;
use crate::models::catalog::ModelCatalog;
use serde::{Deserialize, Serialize};

/// Reply sent over the streaming connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreamReply {
    /// One recognized sentence
    Success { text: String },
    /// A flush produced no sentences
    NoText { text: String },
    /// The engine failed for this flush
    Error { text: String },
}

impl StreamReply {
    pub fn success(text: impl Into<String>) -> Self {
        StreamReply::Success { text: text.into() }
    }

    pub fn no_text() -> Self {
        StreamReply::NoText {
            text: defaults::NO_TEXT_MESSAGE.to_string(),
        }
    }

    pub fn error(error: impl std::fmt::Display) -> Self {
        StreamReply::Error {
            text: format!("{}: {}", defaults::PROCESSING_ERROR_PREFIX, error),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            StreamReply::Success { text }
            | StreamReply::NoText { text }
            | StreamReply::Error { text } => text,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Outcome class of a one-shot recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStatus {
    Success,
    NoText,
    Error,
}

/// Body of a successful upload response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    pub text: String,
    /// Seconds spent in the engine
    pub duration: f64,
    pub status: RecognitionStatus,
}

/// Body of the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub models: ModelCatalog,
}

impl StatusResponse {
    pub fn running(models: ModelCatalog) -> Self {
        Self {
            status: "running".to_string(),
            models,
        }
    }
}

/// Body of an HTTP error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
