//! Tool-specific error types.
//!
//! Every variant renders as one line of user-facing text; the registry turns
//! it into an `isError: true` tool result rather than a JSON-RPC fault.

use thiserror::Error;

use super::schema::ValidationError;
use crate::domains::providers::{ApiError, InferenceError};

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments failed schema validation.
    #[error("Error: Invalid arguments: {0}")]
    InvalidArguments(#[from] ValidationError),

    /// The data provider request failed.
    #[error(transparent)]
    Upstream(#[from] ApiError),

    /// The inference provider request failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// An AI tool was called without inference credentials.
    #[error(
        "Error: AI analysis is not configured. Set CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN to enable AI tools."
    )]
    NotConfigured,

    /// The requested entity does not exist upstream.
    #[error("{0}")]
    NotFound(String),

    /// An internal error occurred.
    #[error("Error: Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
