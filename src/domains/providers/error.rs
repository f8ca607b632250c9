//! Provider error types.
//!
//! Display strings are user-facing: they end up verbatim in tool results.

use thiserror::Error;

/// A failed request to the financial-data provider, classified by cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Error: Resource not found. Please check the ID or symbol is correct.")]
    NotFound,

    #[error("Error: Permission denied. Authentication may be required.")]
    PermissionDenied,

    #[error("Error: Rate limit exceeded. Please wait before making more requests.")]
    RateLimited,

    #[error("Error: Server error (HTTP {status}). The data provider failed to handle the request.")]
    Server { status: u16 },

    #[error("Error: Request rejected by the data provider (HTTP {status}).")]
    Client { status: u16 },

    #[error("Error: Request timed out. The server may be slow or unavailable.")]
    Timeout,

    #[error("Error: Could not reach the data provider: {0}")]
    Network(String),

    #[error("Error: Unexpected response from the data provider: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-2xx status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::PermissionDenied,
            429 => Self::RateLimited,
            500..=599 => Self::Server { status },
            _ => Self::Client { status },
        }
    }

    /// Classify a transport-level reqwest failure.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// A failed call to the text-completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("Error: AI request failed (HTTP {status}): {detail}")]
    Http { status: u16, detail: String },

    #[error("Error: AI provider returned errors: {0}")]
    Provider(String),

    #[error("Error: AI request timed out. Try again with a shorter question.")]
    Timeout,

    #[error("Error: Failed to call the AI provider: {0}")]
    Network(String),

    #[error("Error: Unexpected response from the AI provider: {0}")]
    Decode(String),
}

impl InferenceError {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
