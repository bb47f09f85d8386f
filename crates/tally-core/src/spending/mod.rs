//! Spending analysis
//!
//! - `aggregator` - totals and per-category breakdown for a period
//! - `trends` - pluggable trend series (placeholder by default)

pub mod aggregator;
pub mod trends;

pub use aggregator::{top_categories, SpendingAggregator, DEFAULT_TOP_CATEGORY_LIMIT};
pub use trends::{PlaceholderTrends, TrendStrategy};
