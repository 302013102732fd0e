//! Call wrapper shared by tools: logs the call and turns faults into a
//! caller-visible message.

use std::future::Future;

use serde_json::Value;

/// Returned to the caller in place of any upstream error detail.
pub const LOOKUP_FAILED_MESSAGE: &str = "Lookup failed, please try again later";

/// Run `op`, logging the call first.
///
/// An `Err` from `op` carries the fault detail; it is logged at error level
/// and replaced by [`LOOKUP_FAILED_MESSAGE`].
pub async fn guarded<F, Fut>(tool: &str, args: &Value, op: F) -> String
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, String>>,
{
    tracing::info!("Tool call {tool}: {args}");

    match op().await {
        Ok(text) => text,
        Err(detail) => {
            tracing::error!("Tool {tool} failed: {detail}");
            LOOKUP_FAILED_MESSAGE.to_string()
        }
    }
}
