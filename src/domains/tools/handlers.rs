//! Tool handler trait and the context shared by all handlers.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject};

use super::error::ToolError;
use super::schema::InputSchema;
use crate::domains::providers::{DataProvider, InferenceProvider};

/// Providers available to a tool call.
///
/// Built once at startup and shared by every call; handlers never read the
/// environment.
#[derive(Clone)]
pub struct ToolContext {
    data: Arc<dyn DataProvider>,
    inference: Option<Arc<dyn InferenceProvider>>,
}

impl ToolContext {
    pub fn new(data: Arc<dyn DataProvider>, inference: Option<Arc<dyn InferenceProvider>>) -> Self {
        Self { data, inference }
    }

    pub fn data(&self) -> &dyn DataProvider {
        self.data.as_ref()
    }

    /// The inference provider, or [`ToolError::NotConfigured`].
    pub fn inference(&self) -> Result<&dyn InferenceProvider, ToolError> {
        self.inference.as_deref().ok_or(ToolError::NotConfigured)
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("inference_configured", &self.inference.is_some())
            .finish()
    }
}

/// A single entry in the tool catalog.
///
/// `execute` receives arguments already validated and coerced against
/// `input_schema`. Returning `Err` produces an `isError: true` result whose
/// text is the error's display string.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &'static str;

    /// Description shown to clients.
    fn description(&self) -> &'static str;

    /// Declared arguments.
    fn input_schema(&self) -> InputSchema;

    async fn execute(&self, args: JsonObject, ctx: &ToolContext)
    -> Result<CallToolResult, ToolError>;
}
