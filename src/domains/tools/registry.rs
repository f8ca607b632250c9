//! Tool Registry - the static tool catalog.
//!
//! This module provides:
//! - The catalog of tool descriptors served by `tools/list`
//! - Argument validation against each tool's compiled schema
//! - Dispatch of `tools/call` with per-call failure isolation

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::definitions;
use super::error::ToolError;
use super::format::one_line;
use super::handlers::{ToolContext, ToolHandler};
use super::schema::InputSchema;

struct Entry {
    handler: Box<dyn ToolHandler>,
    schema: InputSchema,
}

/// Tool registry - immutable after construction.
pub struct ToolRegistry {
    entries: Vec<Entry>,
    descriptors: Vec<Tool>,
}

impl ToolRegistry {
    /// Build a registry from handlers, compiling each schema once.
    ///
    /// A handler whose name is already registered is skipped.
    pub fn new(handlers: Vec<Box<dyn ToolHandler>>) -> Self {
        let mut entries: Vec<Entry> = Vec::with_capacity(handlers.len());
        for handler in handlers {
            if entries.iter().any(|e| e.handler.name() == handler.name()) {
                warn!("Duplicate tool '{}' ignored", handler.name());
                continue;
            }
            let schema = handler.input_schema();
            entries.push(Entry { handler, schema });
        }

        let descriptors = entries
            .iter()
            .map(|entry| Tool {
                name: entry.handler.name().into(),
                description: Some(entry.handler.description().into()),
                input_schema: Arc::new(entry.schema.to_json_schema()),
                annotations: None,
                output_schema: None,
                icons: None,
                meta: None,
                title: None,
            })
            .collect();

        Self {
            entries,
            descriptors,
        }
    }

    /// The full earnings catalog.
    pub fn with_default_tools() -> Self {
        Self::new(definitions::all())
    }

    /// All tool descriptors, in registration order.
    pub fn list(&self) -> &[Tool] {
        &self.descriptors
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.descriptors.iter().find(|tool| tool.name == name)
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.handler.name()).collect()
    }

    /// Validate and run a tool call.
    ///
    /// Never fails: unknown tools, invalid arguments, handler errors and
    /// handler panics all come back as a single-line `isError: true` result.
    #[instrument(skip(self, arguments, ctx))]
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<&Value>,
        ctx: &ToolContext,
    ) -> CallToolResult {
        let Some(entry) = self.entries.iter().find(|e| e.handler.name() == name) else {
            warn!("Unknown tool requested: {}", name);
            return error_result(&ToolError::UnknownTool(name.to_string()));
        };

        let args = match entry.schema.validate(arguments) {
            Ok(args) => args,
            Err(e) => {
                debug!("Rejected arguments for {}: {}", name, e);
                return error_result(&ToolError::InvalidArguments(e));
            }
        };

        info!("Executing tool {}", name);
        let outcome = AssertUnwindSafe(entry.handler.execute(args, ctx))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("Tool {} failed: {}", name, e);
                error_result(&e)
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                error!("Tool {} panicked: {}", name, detail);
                error_result(&ToolError::internal(detail))
            }
        }
    }
}

/// `isError: true` result carrying one line of text.
pub fn error_result(err: &ToolError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(one_line(&err.to_string()))])
}
