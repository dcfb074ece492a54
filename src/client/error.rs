//! Errors returned by the Resend API client.

use serde::Deserialize;
use thiserror::Error;

/// Failure modes of a single Resend API call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport error (connection refused, DNS failure, timeout, ...).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Structured error returned by the Resend API.
    #[error("Resend API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Resend's machine-readable error name (e.g. `not_found`).
        name: Option<String>,
        /// Human-readable message.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization {
        /// Parser message.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// The configured base URL cannot be used.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Returns `true` if the remote side reports the resource as absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { status: 404, .. } => true,
            Self::Api { name, .. } => name.as_deref() == Some("not_found"),
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if the request ran past the client timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Build an error from a non-success response.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => Self::Api {
                status,
                name: parsed.name,
                message: parsed.message,
            },
            Err(_) => Self::Api {
                status,
                name: None,
                message: if body.trim().is_empty() {
                    format!("empty response body (HTTP {status})")
                } else {
                    body.trim().to_string()
                },
            },
        }
    }
}

/// Error envelope: `{"statusCode": 404, "name": "not_found", "message": "..."}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    name: Option<String>,
    message: String,
}
