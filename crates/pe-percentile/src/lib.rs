//! PE percentile — stock code normalization and percentile lookup.

pub mod code;
pub mod lookup;
pub mod store;
pub mod types;

pub use code::{normalize, CodeError, Exchange, StockCode};
pub use lookup::PercentileLookup;
pub use store::{MemoryStore, StockStore, SupabaseStore, DEFAULT_TIMEOUT_MS};
pub use types::*;
