//! Per-connection sessions and the registry that routes messages to them.

pub mod bridge;
pub mod registry;

pub use bridge::{SessionBridge, SessionState};
pub use registry::{SessionId, SessionRegistry};
