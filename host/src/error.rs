//! Error types for the proof service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PoaError>;

/// External collaborator that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Generator,
    Storage,
    Registry,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Service::Generator => "generator",
            Service::Storage => "storage",
            Service::Registry => "registry",
        })
    }
}

#[derive(Debug, Error)]
pub enum PoaError {
    /// Missing or malformed caller input
    #[error("Invalid input: {0}")]
    Input(String),

    /// Generator, storage or chain call failed
    #[error("{service} unavailable: {message}")]
    Upstream { service: Service, message: String },

    /// No registered proof matches
    #[error("No proof registered for {0}")]
    NotFound(String),

    /// Fingerprint already registered
    #[error("Proof already registered: {0}")]
    Conflict(String),

    /// Output bytes match more than one registered fingerprint
    #[error("Output hash {output_hash} matches {} registered proofs", .candidates.len())]
    Ambiguous {
        output_hash: String,
        candidates: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PoaError {
    pub fn upstream(service: Service, message: impl std::fmt::Display) -> Self {
        Self::Upstream {
            service,
            message: message.to_string(),
        }
    }

    /// Only upstream failures are worth retrying; the caller owns the backoff.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::Ambiguous { .. } => StatusCode::CONFLICT,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PoaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "error": self.to_string(),
            "retryable": self.is_retriable(),
        });
        if let PoaError::Ambiguous { candidates, .. } = &self {
            body["candidates"] = json!(candidates);
        }

        (status, Json(body)).into_response()
    }
}
