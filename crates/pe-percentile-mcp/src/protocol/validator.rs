//! JSON-RPC message validation.

use crate::types::{JsonRpcMessage, JsonRpcRequest, McpError, McpResult, JSONRPC_VERSION};

/// Validate that a JSON-RPC request is well-formed.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    check_version(&request.jsonrpc)?;

    if request.method.is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate the envelope of any inbound frame before it is queued.
pub fn validate_message(message: &JsonRpcMessage) -> McpResult<()> {
    match message {
        JsonRpcMessage::Request(req) => validate_request(req),
        JsonRpcMessage::Notification(n) => check_version(&n.jsonrpc),
        JsonRpcMessage::Response(r) => check_version(&r.jsonrpc),
        JsonRpcMessage::Error(e) => check_version(&e.jsonrpc),
    }
}

fn check_version(version: &str) -> McpResult<()> {
    if version != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{version}\""
        )));
    }
    Ok(())
}
