//! STDIO transport implementation.
//!
//! Reads one JSON-RPC envelope per line from stdin and writes one compact
//! JSON line per response to stdout. Lines are forwarded either to the
//! in-process dispatcher or, in bridge mode, to a remote `/mcp` endpoint.
//!
//! ## Framing
//!
//! - stdout carries protocol lines only; diagnostics go to stderr.
//! - A line that is not JSON is logged and dropped.
//! - Notifications produce no output line.
//! - Every other line produces exactly one output line, even when the
//!   forward fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::config::StdioConfig;
use super::{TransportError, TransportResult};
use crate::core::McpServer;
use crate::core::protocol::JsonRpcResponse;

/// Diagnostics quote at most this much of an unexpected remote body.
const BODY_PREVIEW: usize = 200;

/// Something that turns one request envelope into at most one response line.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// `Ok(None)` means the envelope needs no response.
    async fn forward(&self, envelope: Value) -> TransportResult<Option<String>>;
}

#[async_trait]
impl Forwarder for McpServer {
    async fn forward(&self, envelope: Value) -> TransportResult<Option<String>> {
        match self.dispatch(envelope).await {
            Some(response) => Ok(Some(serde_json::to_string(&response)?)),
            None => Ok(None),
        }
    }
}

/// Bridge to a remote JSON-RPC endpoint over HTTP POST.
#[derive(Debug, Clone)]
pub struct RemoteDispatcher {
    client: reqwest::Client,
    url: Url,
}

impl RemoteDispatcher {
    pub fn new(url: &str, timeout: Duration) -> TransportResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| TransportError::init(format!("invalid bridge URL '{url}': {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("earnings-mcp-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::init(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn is_envelope(value: &Value) -> bool {
    value.get("jsonrpc").is_some() && (value.get("result").is_some() || value.get("error").is_some())
}

#[async_trait]
impl Forwarder for RemoteDispatcher {
    async fn forward(&self, envelope: Value) -> TransportResult<Option<String>> {
        let response = self
            .client
            .post(self.url.clone())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(envelope.to_string())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::http("remote endpoint timed out")
                } else {
                    TransportError::http(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::ACCEPTED || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;
        let body = body.trim();
        if body.is_empty() {
            return Ok(None);
        }

        // Error envelopes are relayed even with a non-2xx status.
        match serde_json::from_str::<Value>(body) {
            Ok(value) if is_envelope(&value) => {
                if !status.is_success() {
                    debug!("Relaying JSON-RPC envelope sent with HTTP {}", status);
                }
                Ok(Some(value.to_string()))
            }
            _ => Err(TransportError::protocol(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(BODY_PREVIEW).collect::<String>()
            ))),
        }
    }
}

fn is_notification(envelope: &Value) -> bool {
    envelope.get("id").is_none_or(Value::is_null)
        && envelope
            .get("method")
            .and_then(Value::as_str)
            .is_some_and(|m| m.starts_with("notifications/"))
}

/// Process one input line, returning the line to write, if any.
async fn handle_line<F>(forwarder: &F, line: &str) -> Option<String>
where
    F: Forwarder + ?Sized,
{
    let envelope: Value = match serde_json::from_str(line) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Dropping input line that is not valid JSON: {}", e);
            return None;
        }
    };

    let notification = is_notification(&envelope);
    let id = envelope.get("id").cloned().unwrap_or(Value::Null);

    let failure = match forwarder.forward(envelope).await {
        Ok(Some(line)) => return Some(line),
        Ok(None) if notification => return None,
        Ok(None) => "Empty response from dispatcher".to_string(),
        Err(e) if notification => {
            warn!("Notification could not be forwarded: {}", e);
            return None;
        }
        Err(e) => {
            error!("Forward failed: {}", e);
            format!("Bridge request failed: {e}")
        }
    };

    match serde_json::to_string(&JsonRpcResponse::internal_error(id, failure)) {
        Ok(line) => Some(line),
        Err(e) => {
            error!("Failed to encode error response: {}", e);
            None
        }
    }
}

/// Serve line-delimited JSON-RPC from `reader` to `writer`.
///
/// Each line is handled on its own task; a single writer task serializes
/// output so lines never interleave. Lines that are not UTF-8 are dropped
/// like any other non-JSON line. Returns the writer once the input is
/// exhausted and every response has been flushed; a read error is reported
/// only after pending responses are written.
pub async fn serve<F, R, W>(forwarder: Arc<F>, reader: R, writer: W) -> TransportResult<W>
where
    F: Forwarder + ?Sized + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let write_loop = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(format!("{line}\n").as_bytes()).await?;
            writer.flush().await?;
        }
        Ok::<W, std::io::Error>(writer)
    });

    let mut tasks = JoinSet::new();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut read_error = None;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!("Failed to read input: {}", e);
                read_error = Some(e);
                break;
            }
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Dropping input line that is not valid UTF-8: {}", e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        let forwarder = forwarder.clone();
        let tx = tx.clone();
        tasks.spawn(async move {
            if let Some(out) = handle_line(forwarder.as_ref(), &line).await {
                // The receiver only closes after all tasks finish.
                let _ = tx.send(out);
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("Line handler aborted: {}", e);
        }
    }
    drop(tx);

    let writer = write_loop
        .await
        .map_err(|e| TransportError::IoError(std::io::Error::other(e)))??;
    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(writer),
    }
}

/// STDIO transport handler.
pub struct StdioTransport {
    config: StdioConfig,
}

impl StdioTransport {
    pub fn new(config: StdioConfig) -> Self {
        Self { config }
    }

    /// Run until stdin closes.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());

        match &self.config.bridge_url {
            Some(url) => {
                let remote = RemoteDispatcher::new(url, self.config.bridge_timeout())?;
                info!("Ready - bridging stdin/stdout to {}", remote.url());
                serve(Arc::new(remote), stdin, stdout).await?;
            }
            None => {
                info!("Ready - communicating via stdin/stdout");
                serve(Arc::new(server), stdin, stdout).await?;
            }
        }

        info!("STDIO transport finished");
        Ok(())
    }
}
