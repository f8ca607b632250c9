//! HTTP transport implementation.
//!
//! Stateless JSON-RPC over `POST <rpc path>`, plus health and catalog
//! introspection routes. Every request is dispatched independently; the
//! adapter keeps no session.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use http::{HeaderValue, Method, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::core::protocol::JsonRpcResponse;

/// Parse errors quote at most this many characters of the body.
const BODY_PREVIEW: usize = 50;

const GET_GUIDANCE: &str = "MCP Server is running. Please use POST with JSON-RPC payload.";

/// Paths served by fixed routes; the rpc path must not shadow them.
const RESERVED_PATHS: &[&str] = &["/", "/health", "/tools"];

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    server: McpServer,
    rpc_path: String,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport until Ctrl-C.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = build_router(server, &self.config)?;

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");
        info!("  → Tools:    GET /tools");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Build the axum router for `server`.
///
/// Fails when the configured rpc path is not absolute or collides with a
/// fixed route.
pub fn build_router(server: McpServer, config: &HttpConfig) -> TransportResult<Router> {
    let rpc_path = config.rpc_path.as_str();
    if !rpc_path.starts_with('/') || RESERVED_PATHS.contains(&rpc_path) {
        return Err(TransportError::init(format!(
            "invalid JSON-RPC path '{rpc_path}': must start with '/' and differ from {}",
            RESERVED_PATHS.join(", ")
        )));
    }

    let state = AppState {
        server,
        rpc_path: rpc_path.to_string(),
    };

    let router = Router::new()
        .route(
            rpc_path,
            get(rpc_get).post(handle_rpc).options(preflight),
        )
        .route("/", get(health_check).options(preflight))
        .route("/health", get(health_check).options(preflight))
        .route("/tools", get(list_tools).options(preflight))
        .fallback(not_found)
        .with_state(state);

    let router = if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);
        router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
    } else {
        router.layer(TraceLayer::new_for_http())
    };
    Ok(router)
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "server": state.server.name(),
        "version": state.server.version(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "endpoints": {
            "mcp": state.rpc_path,
            "tools": "/tools"
        }
    }))
}

/// The same catalog `tools/list` returns.
async fn list_tools(State(state): State<AppState>) -> Response {
    match serde_json::to_value(state.server.tools()) {
        Ok(tools) => Json(json!({ "tools": tools })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode tools: {e}"),
        )
            .into_response(),
    }
}

async fn rpc_get() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"))],
        GET_GUIDANCE,
    )
}

/// Bare `OPTIONS` answer. With CORS enabled the layer replies first, also
/// with 200, so both configurations agree.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Handle JSON-RPC requests.
///
/// The body is parsed here rather than by the `Json` extractor so that a
/// malformed body still gets a JSON-RPC envelope.
#[instrument(skip_all, fields(len = body.len()))]
async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let envelope: Value = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            let preview: String = String::from_utf8_lossy(&body)
                .chars()
                .take(BODY_PREVIEW)
                .collect();
            warn!("Unparseable request body: {}", e);
            let response =
                JsonRpcResponse::parse_error(format!("Parse error: {e}. Received: {preview}..."));
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    match state.server.dispatch(envelope).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => {
            debug!("Notification acknowledged");
            StatusCode::ACCEPTED.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::core::protocol::codes;
    use crate::domains::providers::fake::FakeData;
    use crate::domains::tools::ToolContext;
    use axum::body::Body;
    use http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(config: &HttpConfig) -> Router {
        let data = FakeData::new().with_portfolios(json!([{"id": 1, "name": "Lilu"}]));
        let server = McpServer::with_context(
            Config::default(),
            ToolContext::new(Arc::new(data), None),
        );
        build_router(server, config).unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Bytes, http::HeaderMap) {
        let response = app(&HttpConfig::default()).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body, headers)
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_body_is_parse_error() {
        let (status, body, _) = send(post(Body::empty())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let response: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(response["error"]["code"], codes::PARSE_ERROR);
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_body_echoes_preview() {
        let (status, body, _) = send(post("{\"jsonrpc\": \"2.0\", oops")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let response: Value = serde_json::from_slice(&body).unwrap();
        let message = response["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Parse error: "));
        assert!(message.contains("Received: {\"jsonrpc\": \"2.0\", oops..."));
    }

    #[tokio::test]
    async fn test_tools_call_over_http() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": "r1",
            "method": "tools/call",
            "params": {"name": "earnings_list_portfolios", "arguments": {"response_format": "json"}}
        });
        let (status, body, _) = send(post(request.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        let response: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(response["id"], "r1");
        assert_eq!(response["result"]["structuredContent"]["count"], 1);
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_body() {
        let request = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        let (status, body, _) = send(post(request.to_string())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_get_rpc_path_is_405() {
        let (status, body, headers) = send(get("/mcp")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, GET_GUIDANCE.as_bytes());
        assert_eq!(headers[header::ALLOW], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_health_and_tools_routes() {
        let (status, body, _) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let health: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["endpoints"]["mcp"], "/mcp");

        let (status, body, _) = send(get("/tools")).await;
        assert_eq!(status, StatusCode::OK);
        let tools: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(tools["tools"].as_array().unwrap().len(), 11);
    }

    fn options(uri: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_options_and_unknown_paths() {
        let (status, _, _) = send(options("/mcp")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body, _) = send(get("/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found".as_bytes());
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/mcp")
            .header(header::ORIGIN, "https://app.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let (_, _, headers) = send(request).await;
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_options_without_cors_layer() {
        let config = HttpConfig {
            enable_cors: false,
            ..Default::default()
        };
        for uri in ["/mcp", "/health", "/tools"] {
            let response = app(&config).oneshot(options(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        }
    }

    #[test]
    fn test_rpc_path_must_not_shadow_fixed_routes() {
        let config = HttpConfig {
            rpc_path: "/health".to_string(),
            ..Default::default()
        };
        let server = McpServer::with_context(
            Config::default(),
            ToolContext::new(Arc::new(FakeData::new()), None),
        );
        assert!(build_router(server.clone(), &config).is_err());

        let config = HttpConfig {
            rpc_path: "rpc".to_string(),
            ..Default::default()
        };
        assert!(build_router(server, &config).is_err());
    }
}
