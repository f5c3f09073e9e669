use serde::Deserialize;
use thiserror::Error;
use workflow::WorkflowError;

/// Error body returned by the backend on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was made.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Authentication required or token rejected")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused a transition because our snapshot was stale.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    /// Whether retrying the same idempotent request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_connect() || err.is_timeout(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: Option<ErrorBody>) -> Self {
        let (code, message) = match body {
            Some(body) => (body.code, body.message),
            None => ("UNKNOWN".to_string(), format!("HTTP {status}")),
        };
        match status {
            401 => Self::Unauthorized,
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Api {
                status,
                code,
                message,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
