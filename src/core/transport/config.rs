//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Line-delimited JSON-RPC over standard input/output.
    #[cfg(feature = "stdio")]
    Stdio(StdioConfig),

    /// HTTP transport with JSON-RPC over POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// STDIO transport configuration.
#[cfg(feature = "stdio")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StdioConfig {
    /// Remote `/mcp` endpoint to bridge to. When unset, requests are
    /// dispatched in-process.
    #[serde(default)]
    pub bridge_url: Option<String>,

    /// Timeout for one forwarded request, in seconds. Covers AI tools
    /// running on the remote side.
    #[serde(default = "default_bridge_timeout")]
    pub bridge_timeout_secs: u64,
}

#[cfg(feature = "stdio")]
fn default_bridge_timeout() -> u64 {
    120
}

#[cfg(feature = "stdio")]
impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            bridge_url: None,
            bridge_timeout_secs: default_bridge_timeout(),
        }
    }
}

#[cfg(feature = "stdio")]
impl StdioConfig {
    pub fn bridge_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.bridge_timeout_secs)
    }
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio(StdioConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config dispatching in-process.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio(StdioConfig::default())
    }

    /// Create a STDIO transport config bridging to a remote endpoint.
    #[cfg(feature = "stdio")]
    pub fn bridge(url: impl Into<String>) -> Self {
        Self::Stdio(StdioConfig {
            bridge_url: Some(url.into()),
            ..Default::default()
        })
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "http" => {
                let port = std::env::var("MCP_HTTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080);
                let host = std::env::var("MCP_HTTP_HOST").unwrap_or_else(|_| default_host());
                let rpc_path =
                    std::env::var("MCP_HTTP_PATH").unwrap_or_else(|_| default_rpc_path());
                let enable_cors = std::env::var("MCP_HTTP_CORS")
                    .map(|v| v.to_lowercase() != "false" && v != "0")
                    .unwrap_or(true);
                Self::Http(HttpConfig {
                    port,
                    host,
                    rpc_path,
                    enable_cors,
                })
            }
            #[cfg(feature = "stdio")]
            _ => Self::Stdio(StdioConfig {
                bridge_url: std::env::var("MCP_BRIDGE_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                bridge_timeout_secs: std::env::var("MCP_BRIDGE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|secs| secs.trim().parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or_else(default_bridge_timeout),
            }),
            #[cfg(all(not(feature = "stdio"), feature = "http"))]
            _ => Self::Http(HttpConfig::default()),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio(cfg) => match &cfg.bridge_url {
                Some(url) => format!("STDIO bridge to {url}"),
                None => "STDIO (standard MCP mode)".to_string(),
            },
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio(_))
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "stdio")]
    #[test]
    fn test_bridge_description() {
        let cfg = TransportConfig::bridge("https://worker.example/mcp");
        assert!(cfg.is_stdio());
        assert_eq!(cfg.description(), "STDIO bridge to https://worker.example/mcp");
        assert_eq!(TransportConfig::stdio().description(), "STDIO (standard MCP mode)");
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_stdio_config_default_timeout() {
        let cfg: StdioConfig = serde_json::from_str(r#"{"bridge_url": "http://x/mcp"}"#).unwrap();
        assert_eq!(cfg.bridge_timeout_secs, 120);
        assert_eq!(cfg.bridge_timeout().as_secs(), 120);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_config_deserializes_with_defaults() {
        let cfg: TransportConfig =
            serde_json::from_str(r#"{"type": "http", "port": 9000}"#).unwrap();
        match cfg {
            TransportConfig::Http(http) => {
                assert_eq!(http.port, 9000);
                assert_eq!(http.host, "127.0.0.1");
                assert_eq!(http.rpc_path, "/mcp");
                assert!(http.enable_cors);
            }
            #[allow(unreachable_patterns)]
            _ => panic!("expected http transport"),
        }
    }
}
