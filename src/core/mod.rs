//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, the JSON-RPC envelope and
//! dispatcher, and the transport adapters.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use protocol::{JsonRpcRequest, JsonRpcResponse};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
