//! Tool registration and dispatch.

use serde_json::Value;

use pe_percentile::PercentileLookup;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::get_pe_percentile;

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![get_pe_percentile::definition()]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        lookup: &PercentileLookup,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            get_pe_percentile::NAME => get_pe_percentile::execute(args, lookup).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
