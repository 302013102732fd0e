//! Prompt: usage_guide — Accepted code formats and example calls.

use serde_json::Value;

use crate::types::{Content, McpResult, PromptGetResult, PromptMessage};

pub const NAME: &str = "usage_guide";

pub fn expand(args: Value) -> McpResult<PromptGetResult> {
    let stock_code = args
        .get("stock_code")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");

    let request_section = if stock_code.is_empty() {
        String::new()
    } else {
        format!("\nLook up: get_pe_percentile(\"{stock_code}\")\n")
    };

    let text = format!(
        "Welcome to the PE percentile lookup tool.\n\n\
         Supported stock code formats:\n\
         1. Exchange suffix: '600739.SH' or '301011.SZ'\n\
         2. Exchange prefix: 'sh600739' or 'sz301011'\n\
         Both are case-insensitive.\n\n\
         Example calls:\n\
         > get_pe_percentile(\"sh600739\")\n\
         > get_pe_percentile(\"600739.SH\")\n\
         > get_pe_percentile(\"sz301011\")\n\
         > get_pe_percentile(\"301011.SZ\")\n\
         {request_section}"
    );

    Ok(PromptGetResult {
        description: Some("How to call get_pe_percentile".to_string()),
        messages: vec![PromptMessage {
            role: "user".to_string(),
            content: Content::Text { text },
        }],
    })
}
