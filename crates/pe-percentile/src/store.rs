//! External row store access — the `stocks` collection behind a PostgREST API.

use std::time::Duration;

use async_trait::async_trait;

use crate::code::StockCode;
use crate::types::{StockRow, StoreError, StoreResult};

/// Name of the row collection holding percentile data.
pub const STOCKS_TABLE: &str = "stocks";

/// Columns projected by every lookup.
pub const SELECT_COLUMNS: &str = "stock_code,stock_name,pe_percentile_3y";

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// A read-only source of stock rows keyed by canonical code.
///
/// Implementations must be safe to share across sessions; no per-call
/// locking is done by callers.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Return every row whose code column equals the canonical code.
    async fn rows_for(&self, code: &StockCode) -> StoreResult<Vec<StockRow>>;
}

/// Supabase (PostgREST) client for the `stocks` table.
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    api_key: String,
}

impl SupabaseStore {
    /// Build a client for the project at `url`, authenticating with `api_key`.
    pub fn new(url: &str, api_key: &str, timeout_ms: u64) -> StoreResult<Self> {
        if api_key.trim().is_empty() {
            return Err(StoreError::Config("API key must not be empty".to_string()));
        }

        let base = reqwest::Url::parse(url.trim_end_matches('/'))
            .map_err(|e| StoreError::Config(format!("invalid store URL '{url}': {e}")))?;
        let endpoint = base
            .join(&format!("{}/rest/v1/{STOCKS_TABLE}", base.path().trim_end_matches('/')))
            .map_err(|e| StoreError::Config(format!("invalid store URL '{url}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl StockStore for SupabaseStore {
    async fn rows_for(&self, code: &StockCode) -> StoreResult<Vec<StockRow>> {
        let filter = format!("eq.{code}");
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("select", SELECT_COLUMNS), ("stock_code", filter.as_str())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// In-process store holding a fixed set of rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Vec<StockRow>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(mut self, row: StockRow) -> Self {
        self.rows.push(row);
        self
    }

    /// A store whose every query fails with the given detail.
    pub fn failing(detail: &str) -> Self {
        Self {
            rows: Vec::new(),
            failure: Some(detail.to_string()),
        }
    }
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn rows_for(&self, code: &StockCode) -> StoreResult<Vec<StockRow>> {
        if let Some(detail) = &self.failure {
            return Err(StoreError::Unavailable(detail.clone()));
        }

        let key = code.canonical();
        Ok(self
            .rows
            .iter()
            .filter(|r| r.stock_code == key)
            .cloned()
            .collect())
    }
}
