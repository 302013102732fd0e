//! Transport layer for MCP communication.

pub mod framing;
pub mod sse;

pub use sse::SseTransport;
