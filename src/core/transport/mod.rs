//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: line-delimited JSON-RPC on stdin/stdout, dispatched locally
//!   or bridged to a remote endpoint - feature: `stdio`
//! - **HTTP**: HTTP server with JSON-RPC over POST requests - feature: `http`
//!
//! Both adapters hand each envelope to [`McpServer::dispatch`](crate::core::McpServer::dispatch)
//! (or its remote counterpart), so they differ only in framing.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;

#[cfg(feature = "stdio")]
pub use config::StdioConfig;
