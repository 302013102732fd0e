//! Message framing for the SSE transport.
//!
//! Inbound frames arrive as JSON bodies on the message endpoint; outbound
//! frames are SSE events whose data is a single line of JSON.

use serde_json::Value;

use crate::types::{JsonRpcMessage, McpError, McpResult};

/// Parse a posted body as a JSON-RPC message.
pub fn parse_message(body: &str) -> McpResult<JsonRpcMessage> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))?;
    let carries_id = value.get("id").is_some();

    let message: JsonRpcMessage =
        serde_json::from_value(value).map_err(|e| McpError::InvalidRequest(e.to_string()))?;

    // An id of the wrong type leaves the frame decoded as a notification.
    if carries_id && matches!(message, JsonRpcMessage::Notification(_)) {
        return Err(McpError::InvalidRequest(
            "Request id must be a string, number, or null".to_string(),
        ));
    }

    Ok(message)
}

/// A frame written to a session's outbound stream.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    /// Handshake: URL the client must post its messages to.
    Endpoint(String),
    /// A JSON-RPC response.
    Message(Value),
}

impl OutboundFrame {
    pub fn event(&self) -> &'static str {
        match self {
            OutboundFrame::Endpoint(_) => "endpoint",
            OutboundFrame::Message(_) => "message",
        }
    }

    /// Event payload. Compact JSON never contains a newline, so each
    /// message fits in one `data:` line.
    pub fn data(&self) -> McpResult<String> {
        match self {
            OutboundFrame::Endpoint(url) => Ok(url.clone()),
            OutboundFrame::Message(value) => serde_json::to_string(value).map_err(McpError::Json),
        }
    }
}
