//! MCP tool implementations.

pub mod get_pe_percentile;
pub mod guard;
pub mod registry;

pub use registry::ToolRegistry;
