//! Tools domain module.
//!
//! Tools are the callable units exposed through `tools/list` and
//! `tools/call`.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `schema.rs` - Declarative argument schemas and validation
//! - `registry.rs` - Static catalog and guarded dispatch
//! - `format.rs` - Number formatting and output clipping
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` implementing [`ToolHandler`]
//! 2. Export it from the group's `mod.rs`
//! 3. Add it to [`definitions::all`]

pub mod definitions;
mod error;
pub mod format;
mod handlers;
mod registry;
pub mod schema;

pub use error::ToolError;
pub use handlers::{ToolContext, ToolHandler};
pub use registry::{ToolRegistry, error_result};
