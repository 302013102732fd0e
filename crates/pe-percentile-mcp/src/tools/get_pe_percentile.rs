//! Tool: get_pe_percentile — Three-year PE percentile for one stock.

use serde::Deserialize;
use serde_json::{json, Value};

use pe_percentile::{normalize, LookupOutcome, PercentileLookup, PercentileRecord};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::guard::guarded;

pub const NAME: &str = "get_pe_percentile";

#[derive(Debug, Deserialize)]
struct LookupParams {
    stock_code: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: Some(
            "Query the three-year PE percentile of a stock. \
             Accepts '000603.SZ' or 'sz000603' style codes."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "stock_code": {
                    "type": "string",
                    "description": "Stock code, e.g. '600739.SH' or 'sh600739'"
                }
            },
            "required": ["stock_code"]
        }),
    }
}

pub async fn execute(args: Value, lookup: &PercentileLookup) -> McpResult<ToolCallResult> {
    let params =
        LookupParams::deserialize(&args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let text = guarded(NAME, &args, || describe(&params.stock_code, lookup)).await;
    Ok(ToolCallResult::text(text))
}

async fn describe(raw: &str, lookup: &PercentileLookup) -> Result<String, String> {
    let code = match normalize(raw) {
        Ok(code) => code,
        Err(_) => {
            return Ok(format!(
                "Stock code '{raw}' has an invalid format; use '000603.SZ' or 'sz000603'"
            ))
        }
    };

    match lookup.lookup(&code).await {
        LookupOutcome::NotFound => Ok(format!("No record found for stock code {code}")),
        LookupOutcome::Found(record) => Ok(render(&record)),
        LookupOutcome::UpstreamFailure(detail) => Err(format!("{code}: {detail}")),
    }
}

fn render(record: &PercentileRecord) -> String {
    let code = &record.code;
    match (record.percentile, record.name.as_deref()) {
        (None, _) => format!("PE percentile data is not available for {code}"),
        (Some(value), Some(name)) => format!("{code} ({name}): {value:.4}"),
        (Some(value), None) => format!("{code}: {value:.4}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: Option<&str>, percentile: Option<f64>) -> PercentileRecord {
        PercentileRecord {
            code: normalize("sh600739").unwrap(),
            name: name.map(|s| s.to_string()),
            percentile,
        }
    }

    #[test]
    fn test_render_four_decimals() {
        assert_eq!(render(&record(Some("Xinhua"), Some(0.1234))), "sh600739 (Xinhua): 0.1234");
        assert_eq!(render(&record(None, Some(0.5))), "sh600739: 0.5000");
        assert_eq!(render(&record(None, Some(0.123456))), "sh600739: 0.1235");
    }

    #[test]
    fn test_render_absent_value() {
        assert_eq!(
            render(&record(Some("Xinhua"), None)),
            "PE percentile data is not available for sh600739"
        );
    }
}
