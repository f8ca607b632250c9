//! MCP Server implementation - the JSON-RPC dispatcher.
//!
//! Routes decoded envelopes by method to the static [`ToolRegistry`].
//! Both transports call [`McpServer::dispatch`], so tool behaviour is the
//! same whichever channel a request arrives on.
//!
//! ## Error Layers
//!
//! - Envelope problems (wrong `jsonrpc`, unknown method, missing params)
//!   become JSON-RPC error objects.
//! - Everything that happens inside a tool (unknown tool, bad arguments,
//!   upstream failures, panics) becomes a successful response whose result
//!   is an `isError: true` tool result.

use std::sync::Arc;

use rmcp::model::Tool;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use super::error::Result;
use super::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::domains::providers::{EarningsApiClient, InferenceProvider, WorkersAiClient};
use crate::domains::tools::{ToolContext, ToolRegistry};

const INSTRUCTIONS: &str = "Read-only access to earnings portfolios (listing, holdings, scores) and stock data (quotes, details, statistics). The earnings_ai_* tools add AI commentary when an inference provider is configured. Every tool accepts response_format = markdown | json.";

/// The dispatcher shared by all transports.
///
/// Cheap to clone: configuration, registry and providers are behind `Arc`.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Immutable tool catalog.
    registry: Arc<ToolRegistry>,

    /// Providers handed to every tool call.
    context: ToolContext,
}

impl McpServer {
    /// Create a server talking to the configured upstream providers.
    ///
    /// The inference client is only built when both Cloudflare credentials
    /// are present; without it the AI tools report a configuration error.
    pub fn new(config: Config) -> Result<Self> {
        let data = Arc::new(EarningsApiClient::new(&config.upstream, &config.credentials)?);

        let inference: Option<Arc<dyn InferenceProvider>> = match config.credentials.cloudflare() {
            Some((account_id, api_token)) => Some(Arc::new(WorkersAiClient::new(
                &config.ai, account_id, api_token,
            )?)),
            None => None,
        };

        Ok(Self::with_context(config, ToolContext::new(data, inference)))
    }

    /// Create a server over explicit providers.
    pub fn with_context(config: Config, context: ToolContext) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ToolRegistry::with_default_tools()),
            context,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The tool catalog, as served by `tools/list`.
    pub fn tools(&self) -> &[Tool] {
        self.registry.list()
    }

    /// Names of all registered tools.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.registry.tool_names()
    }

    /// Handle one decoded JSON envelope.
    ///
    /// Returns `None` for notifications, which get no response.
    #[instrument(skip_all, fields(method))]
    pub async fn dispatch(&self, envelope: Value) -> Option<JsonRpcResponse> {
        let request = match JsonRpcRequest::from_value(envelope) {
            Ok(request) => request,
            Err(rejection) => {
                warn!("Rejected envelope: {:?}", rejection.error_object());
                return Some(rejection);
            }
        };
        tracing::Span::current().record("method", request.method.as_str());

        if request.is_notification() {
            debug!("Notification received: {}", request.method);
            return None;
        }

        let id = request.response_id();
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            method => {
                warn!("Unknown method: {}", method);
                JsonRpcResponse::method_not_found(id, method)
            }
        };
        Some(response)
    }

    /// Parse a raw JSON body and dispatch it.
    ///
    /// Returns a parse-error response when `raw` is not JSON.
    pub async fn dispatch_str(&self, raw: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(raw) {
            Ok(envelope) => self.dispatch(envelope).await,
            Err(e) => Some(JsonRpcResponse::parse_error(format!("Parse error: {e}"))),
        }
    }

    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        info!("Processing initialize request");
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": self.config.server.protocol_version,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": self.name(),
                    "version": self.version()
                },
                "instructions": INSTRUCTIONS
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        debug!("Processing tools/list request");
        match serde_json::to_value(self.registry.list()) {
            Ok(tools) => JsonRpcResponse::success(id, json!({ "tools": tools })),
            Err(e) => JsonRpcResponse::internal_error(id, format!("Failed to encode tools: {e}")),
        }
    }

    async fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::invalid_params(id, "Missing params");
        };
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::invalid_params(id, "Missing tool name");
        };

        info!("Processing tools/call request: {}", name);
        let result = self
            .registry
            .call(name, params.get("arguments"), &self.context)
            .await;

        match serde_json::to_value(&result) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::internal_error(id, format!("Failed to encode result: {e}")),
        }
    }
}
