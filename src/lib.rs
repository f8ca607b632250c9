//! Earnings MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing read-only portfolio and
//! stock lookups from the earnings API, plus AI commentary through a
//! text-completion provider.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the JSON-RPC envelope and
//!   dispatcher, and the stdio / HTTP transport adapters
//! - **domains**: business logic organized by bounded contexts
//!   - **providers**: clients for the upstream data and inference services
//!   - **tools**: the static tool catalog, schemas and handlers
//!
//! # Example
//!
//! ```rust,no_run
//! use earnings_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     config.validate()?;
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
