//! Prompt registration and dispatch.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult};

use super::usage_guide;

pub struct PromptRegistry;

impl PromptRegistry {
    pub fn list_prompts() -> Vec<PromptDefinition> {
        vec![PromptDefinition {
            name: usage_guide::NAME.to_string(),
            description: Some("Usage guide for the PE percentile tool".to_string()),
            arguments: Some(vec![PromptArgument {
                name: "stock_code".to_string(),
                description: Some("Optional stock code to build an example call for".to_string()),
                required: false,
            }]),
        }]
    }

    pub fn get(name: &str, arguments: Option<Value>) -> McpResult<PromptGetResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            usage_guide::NAME => usage_guide::expand(args),
            _ => Err(McpError::PromptNotFound(name.to_string())),
        }
    }
}
