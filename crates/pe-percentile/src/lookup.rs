//! Percentile lookup service over a [`StockStore`].

use std::sync::Arc;

use crate::code::StockCode;
use crate::store::StockStore;
use crate::types::{LookupOutcome, PercentileRecord};

/// Looks up the three-year PE percentile for a canonical code.
///
/// Holds a shared handle to the process-wide store client. Cloning the
/// service clones the handle, not the client.
#[derive(Clone)]
pub struct PercentileLookup {
    store: Arc<dyn StockStore>,
}

impl PercentileLookup {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self { store }
    }

    /// Query the store. Store errors are reported as
    /// [`LookupOutcome::UpstreamFailure`] and never returned as `Err`.
    pub async fn lookup(&self, code: &StockCode) -> LookupOutcome {
        let rows = match self.store.rows_for(code).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::debug!("Store query for {code} failed: {e}");
                return LookupOutcome::UpstreamFailure(e.to_string());
            }
        };

        match rows.into_iter().next() {
            Some(row) => LookupOutcome::Found(PercentileRecord {
                code: code.clone(),
                name: row.stock_name.filter(|n| !n.trim().is_empty()),
                percentile: row.pe_percentile_3y,
            }),
            None => LookupOutcome::NotFound,
        }
    }
}
