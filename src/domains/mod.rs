//! Domains module containing business logic organized by bounded contexts.
//!
//! - `providers` - clients for the upstream data and inference services
//! - `tools` - the MCP tool catalog built on top of them

pub mod providers;
pub mod tools;
