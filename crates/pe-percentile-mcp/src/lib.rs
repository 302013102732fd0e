//! PE percentile MCP server — stock valuation lookups over the MCP SSE transport.

pub mod config;
pub mod prompts;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::Settings;
pub use protocol::ProtocolHandler;
pub use session::{SessionBridge, SessionRegistry};
pub use transport::SseTransport;
