//! MCP prompt implementations.

pub mod registry;
pub mod usage_guide;

pub use registry::PromptRegistry;
