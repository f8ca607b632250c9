//! Configuration management for the MCP server.
//!
//! The configuration is read once at startup (environment variables, with an
//! optional `.env` file) and then passed by reference to the dispatcher, the
//! upstream providers and the transports. Nothing downstream of
//! [`Config::from_env`] reads the process environment.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const DEFAULT_API_URL: &str = "https://pf.bforecast.com";
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_AI_MODEL: &str = "@cf/meta/llama-3.1-8b-instruct";
const DEFAULT_AI_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 90;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Upstream financial-data API.
    pub upstream: UpstreamConfig,

    /// Text-completion provider used by the AI tools.
    pub ai: AiConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// External API credentials configuration.
    pub credentials: CredentialsConfig,

    /// Environment values that were rejected while loading.
    #[serde(skip)]
    pub warnings: Vec<String>,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,

    /// MCP protocol version announced during `initialize`.
    pub protocol_version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Upstream REST data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Inference provider settings (credentials live in [`CredentialsConfig`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Model identifier, e.g. `@cf/meta/llama-3.1-8b-instruct`.
    pub model: String,

    /// REST API base of the provider.
    pub api_base: String,

    /// Per-request timeout in seconds. Completions are slow, so this is
    /// much larger than the data timeout.
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for external API credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Shared secret sent as `X-Auth-Token` to the data provider.
    pub shared_secret: Option<String>,

    /// Session cookie sent as `Cookie` when no shared secret is set.
    pub auth_cookie: Option<String>,

    /// Cloudflare account hosting the Workers AI model.
    pub cloudflare_account_id: Option<String>,

    /// Cloudflare API token with Workers AI access.
    pub cloudflare_api_token: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("CredentialsConfig")
            .field("shared_secret", &redact(&self.shared_secret))
            .field("auth_cookie", &redact(&self.auth_cookie))
            .field("cloudflare_account_id", &redact(&self.cloudflare_account_id))
            .field("cloudflare_api_token", &redact(&self.cloudflare_api_token))
            .finish()
    }
}

/// Authentication header for the data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamAuth<'a> {
    /// `X-Auth-Token: <secret>`
    SharedSecret(&'a str),
    /// `Cookie: <cookie>`
    Cookie(&'a str),
}

impl CredentialsConfig {
    /// The auth header to send upstream; the shared secret wins over the cookie.
    pub fn upstream_auth(&self) -> Option<UpstreamAuth<'_>> {
        if let Some(secret) = non_empty(&self.shared_secret) {
            Some(UpstreamAuth::SharedSecret(secret))
        } else {
            non_empty(&self.auth_cookie).map(UpstreamAuth::Cookie)
        }
    }

    /// Account id and token, when both are present.
    pub fn cloudflare(&self) -> Option<(&str, &str)> {
        Some((
            non_empty(&self.cloudflare_account_id)?,
            non_empty(&self.cloudflare_api_token)?,
        ))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "earnings-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                protocol_version: PROTOCOL_VERSION.to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            upstream: UpstreamConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: DEFAULT_API_TIMEOUT_SECS,
                user_agent: format!("Earnings-MCP-Server/{}", env!("CARGO_PKG_VERSION")),
            },
            ai: AiConfig {
                model: DEFAULT_AI_MODEL.to_string(),
                api_base: DEFAULT_AI_API_BASE.to_string(),
                timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            warnings: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix (`MCP_SERVER_NAME`,
    /// `MCP_LOG_LEVEL`, ...). Provider settings keep the names used by the
    /// deployed services: `EARNINGS_API_URL`, `MCP_SHARED_SECRET`,
    /// `AUTH_COOKIE`, `CLOUDFLARE_ACCOUNT_ID` and `CLOUDFLARE_API_TOKEN`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(url) = std::env::var("EARNINGS_API_URL") {
            config.upstream.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = env_u64("MCP_API_TIMEOUT_SECS", &mut config.warnings) {
            config.upstream.timeout_secs = secs;
        }

        if let Ok(model) = std::env::var("MCP_AI_MODEL") {
            config.ai.model = model;
        }
        if let Ok(base) = std::env::var("MCP_AI_API_BASE") {
            config.ai.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(secs) = env_u64("MCP_AI_TIMEOUT_SECS", &mut config.warnings) {
            config.ai.timeout_secs = secs;
        }

        config.transport = TransportConfig::from_env();

        config.credentials = CredentialsConfig {
            shared_secret: std::env::var("MCP_SHARED_SECRET").ok(),
            auth_cookie: std::env::var("AUTH_COOKIE").ok(),
            cloudflare_account_id: std::env::var("CLOUDFLARE_ACCOUNT_ID").ok(),
            cloudflare_api_token: std::env::var("CLOUDFLARE_API_TOKEN").ok(),
        };

        config
    }

    /// Log what loading found. Call once tracing is initialized.
    pub fn log_summary(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
        match self.credentials.upstream_auth() {
            Some(UpstreamAuth::SharedSecret(_)) => info!("Upstream auth: shared secret"),
            Some(UpstreamAuth::Cookie(_)) => info!("Upstream auth: cookie"),
            None => info!("Upstream auth: none"),
        }
    }

    /// Check values that would otherwise fail on the first request.
    pub fn validate(&self) -> Result<()> {
        let url = &self.upstream.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::config(format!(
                "EARNINGS_API_URL must be an http(s) URL, got '{url}'"
            )));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(Error::config("MCP_API_TIMEOUT_SECS must be greater than 0"));
        }
        if self.ai.timeout_secs == 0 {
            return Err(Error::config("MCP_AI_TIMEOUT_SECS must be greater than 0"));
        }
        Ok(())
    }

    /// Whether the AI tools can reach their provider.
    pub fn ai_configured(&self) -> bool {
        self.credentials.cloudflare().is_some()
    }
}

fn env_u64(key: &str, warnings: &mut Vec<String>) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warnings.push(format!("Ignoring {key}: '{raw}' is not a whole number"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_api_url_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("EARNINGS_API_URL", "https://example.test/");
            std::env::set_var("MCP_API_TIMEOUT_SECS", "12");
        }
        let config = Config::from_env();
        assert_eq!(config.upstream.base_url, "https://example.test");
        assert_eq!(config.upstream.timeout_secs, 12);
        assert!(config.warnings.is_empty());
        unsafe {
            std::env::remove_var("EARNINGS_API_URL");
            std::env::remove_var("MCP_API_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_invalid_timeout_falls_back_to_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_AI_TIMEOUT_SECS", "soon");
        }
        let config = Config::from_env();
        assert_eq!(config.ai.timeout_secs, DEFAULT_AI_TIMEOUT_SECS);
        assert_eq!(
            config.warnings,
            vec!["Ignoring MCP_AI_TIMEOUT_SECS: 'soon' is not a whole number".to_string()]
        );
        unsafe {
            std::env::remove_var("MCP_AI_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            shared_secret: Some("super_secret_key".to_string()),
            cloudflare_api_token: Some("cf_token".to_string()),
            ..Default::default()
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
        assert!(!debug_str.contains("cf_token"));
    }

    #[test]
    fn test_shared_secret_wins_over_cookie() {
        let creds = CredentialsConfig {
            shared_secret: Some("s3cret".to_string()),
            auth_cookie: Some("session=abc".to_string()),
            ..Default::default()
        };
        assert_eq!(creds.upstream_auth(), Some(UpstreamAuth::SharedSecret("s3cret")));

        let creds = CredentialsConfig {
            shared_secret: Some("  ".to_string()),
            auth_cookie: Some("session=abc".to_string()),
            ..Default::default()
        };
        assert_eq!(creds.upstream_auth(), Some(UpstreamAuth::Cookie("session=abc")));
    }

    #[test]
    fn test_ai_requires_both_credentials() {
        let mut config = Config::default();
        assert!(!config.ai_configured());

        config.credentials.cloudflare_account_id = Some("acct".to_string());
        assert!(!config.ai_configured());

        config.credentials.cloudflare_api_token = Some("token".to_string());
        assert!(config.ai_configured());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.upstream.base_url = "pf.bforecast.com".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
