//! Protocol-level tests for pe-percentile-mcp: handshake negotiation, the
//! lookup tool's message variants, prompts, and JSON-RPC error mapping.

use std::sync::Arc;

use serde_json::{json, Value};

use pe_percentile::{MemoryStore, PercentileLookup, StockRow};
use pe_percentile_mcp::protocol::ProtocolHandler;
use pe_percentile_mcp::tools::guard::LOOKUP_FAILED_MESSAGE;
use pe_percentile_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

fn seeded_store() -> MemoryStore {
    MemoryStore::new()
        .with_row(StockRow::new("sh600739", Some("Xinhua Department Store"), Some(0.1234)))
        .with_row(StockRow::new("sz000603", Some("Shengda Resources"), Some(0.87654)))
        .with_row(StockRow::new("sz300001", None, Some(0.05)))
        .with_row(StockRow::new("sh600000", Some("Pudong Bank"), None))
}

fn handler_with(store: MemoryStore) -> ProtocolHandler {
    ProtocolHandler::new(PercentileLookup::new(Arc::new(store)))
}

fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await
}

async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

/// Call get_pe_percentile and return the text of the result.
async fn lookup_text(handler: &ProtocolHandler, stock_code: &str) -> String {
    let msg = mcp_request(
        7,
        "tools/call",
        json!({ "name": "get_pe_percentile", "arguments": { "stock_code": stock_code } }),
    );
    let resp = send_unwrap(handler, msg).await;
    assert!(resp.get("error").is_none(), "lookup must not error: {resp}");
    assert!(resp["result"].get("isError").is_none());
    resp["result"]["content"][0]["text"]
        .as_str()
        .expect("text content")
        .to_string()
}

// ═══════════════════════════════════════════════════════
// HANDSHAKE
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_initialize_advertises_tools_and_prompts() {
    let handler = handler_with(seeded_store());
    let resp = send_unwrap(&handler, init_request()).await;

    let result = &resp["result"];
    assert_eq!(result["protocolVersion"], MCP_VERSION);
    assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["prompts"].is_object());
    assert!(!handler.is_initialized().await);

    let ack = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    assert!(send(&handler, ack).await.is_none());
    assert!(handler.is_initialized().await);
}

#[tokio::test]
async fn test_initialized_before_initialize_is_ignored() {
    let handler = handler_with(seeded_store());
    let ack = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    assert!(send(&handler, ack.clone()).await.is_none());
    assert!(!handler.is_initialized().await);

    send_unwrap(&handler, init_request()).await;
    send(&handler, ack).await;
    assert!(handler.is_initialized().await);
}

#[tokio::test]
async fn test_future_protocol_version_gets_server_version() {
    let handler = handler_with(seeded_store());
    let msg = mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2025-11-25",
            "capabilities": {},
            "clientInfo": { "name": "future-client", "version": "99.0" }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn test_initialize_without_params() {
    let handler = handler_with(seeded_store());
    let msg = json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" });
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32602);
}

// ═══════════════════════════════════════════════════════
// LOOKUP TOOL
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_tools_list() {
    let handler = handler_with(seeded_store());
    let resp = send_unwrap(&handler, mcp_request(1, "tools/list", json!({}))).await;
    let tools = resp["result"]["tools"].as_array().unwrap();

    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "get_pe_percentile");
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["stock_code"]));
}

#[tokio::test]
async fn test_success_message_four_decimals() {
    let handler = handler_with(seeded_store());

    assert_eq!(
        lookup_text(&handler, "SH600739").await,
        "sh600739 (Xinhua Department Store): 0.1234"
    );
    assert_eq!(
        lookup_text(&handler, "000603.sz").await,
        "sz000603 (Shengda Resources): 0.8765"
    );
    assert_eq!(lookup_text(&handler, "300001.SZ").await, "sz300001: 0.0500");
}

#[tokio::test]
async fn test_both_notations_give_same_answer() {
    let handler = handler_with(seeded_store());
    let suffix = lookup_text(&handler, "600739.SH").await;
    let prefix = lookup_text(&handler, "sh600739").await;
    assert_eq!(suffix, prefix);
}

#[tokio::test]
async fn test_invalid_format_message() {
    let handler = handler_with(seeded_store());
    let text = lookup_text(&handler, "abc123").await;

    assert!(text.contains("'abc123'"), "names the input: {text}");
    assert!(text.contains("000603.SZ") && text.contains("sz000603"));
}

#[tokio::test]
async fn test_not_found_distinct_from_absent_value() {
    let handler = handler_with(seeded_store());

    let not_found = lookup_text(&handler, "sz301011").await;
    let absent = lookup_text(&handler, "sh600000").await;

    assert_eq!(not_found, "No record found for stock code sz301011");
    assert_eq!(absent, "PE percentile data is not available for sh600000");
    assert_ne!(not_found, absent);
}

#[tokio::test]
async fn test_upstream_failure_is_generic_message() {
    let handler = handler_with(MemoryStore::failing("password authentication failed"));
    let text = lookup_text(&handler, "sh600739").await;

    assert_eq!(text, LOOKUP_FAILED_MESSAGE);
    assert!(!text.contains("password"));
}

#[tokio::test]
async fn test_missing_or_mistyped_argument() {
    let handler = handler_with(seeded_store());

    let msg = mcp_request(1, "tools/call", json!({ "name": "get_pe_percentile" }));
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32602);

    let msg = mcp_request(
        2,
        "tools/call",
        json!({ "name": "get_pe_percentile", "arguments": { "stock_code": 600739 } }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32602);
}

#[tokio::test]
async fn test_unknown_tool() {
    let handler = handler_with(seeded_store());
    let params = json!({ "name": "get_pb_percentile", "arguments": {} });
    let msg = mcp_request(1, "tools/call", params);
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32803);
}

// ═══════════════════════════════════════════════════════
// PROMPTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_usage_guide_prompt() {
    let handler = handler_with(seeded_store());

    let list = send_unwrap(&handler, mcp_request(1, "prompts/list", json!({}))).await;
    assert_eq!(list["result"]["prompts"][0]["name"], "usage_guide");

    let params = json!({ "name": "usage_guide", "arguments": { "stock_code": "301011.SZ" } });
    let get = send_unwrap(&handler, mcp_request(2, "prompts/get", params)).await;
    let text = get["result"]["messages"][0]["content"]["text"].as_str().unwrap();
    assert!(text.contains("600739.SH"));
    assert!(text.contains("sz301011"));
    assert!(text.contains("get_pe_percentile(\"301011.SZ\")"));

    let missing = mcp_request(3, "prompts/get", json!({ "name": "nope" }));
    let missing = send_unwrap(&handler, missing).await;
    assert_eq!(missing["error"]["code"], -32804);
}

// ═══════════════════════════════════════════════════════
// JSON-RPC ERRORS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_unknown_method() {
    let handler = handler_with(seeded_store());
    let resp = send_unwrap(&handler, mcp_request(4, "resources/list", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32601);
    assert_eq!(resp["id"], 4);
}

#[tokio::test]
async fn test_wrong_jsonrpc_version() {
    let handler = handler_with(seeded_store());
    let msg = json!({ "jsonrpc": "1.0", "id": 9, "method": "ping" });
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["error"]["code"], -32600);
}

#[tokio::test]
async fn test_ping_and_string_ids() {
    let handler = handler_with(seeded_store());
    let msg = json!({ "jsonrpc": "2.0", "id": "abc", "method": "ping" });
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["id"], "abc");
    assert_eq!(resp["result"], json!({}));
}

#[tokio::test]
async fn test_fractional_and_unsigned_ids_are_answered() {
    let handler = handler_with(seeded_store());
    let params = json!({ "name": "get_pe_percentile", "arguments": { "stock_code": "sh600739" } });

    for id in [json!(1.5), json!(18446744073709551615u64)] {
        let msg = json!({
            "jsonrpc": "2.0",
            "id": id.clone(),
            "method": "tools/call",
            "params": params.clone()
        });
        let resp = send_unwrap(&handler, msg).await;
        assert_eq!(resp["id"], id);
        assert_eq!(
            resp["result"]["content"][0]["text"],
            "sh600739 (Xinhua Department Store): 0.1234"
        );
    }
}

#[tokio::test]
async fn test_cancel_notification_has_no_response() {
    let handler = handler_with(seeded_store());
    let msg = json!({
        "jsonrpc": "2.0",
        "method": "notifications/cancelled",
        "params": { "requestId": 3, "reason": "user aborted" }
    });
    assert!(send(&handler, msg).await.is_none());
}
