//! Spending insights
//!
//! Insights are derived on every analysis from fixed thresholds; nothing is stored.
//!
//! ## Built-in rules
//!
//! - **High Spending Category** - one category dominates spending
//! - **High Spending Ratio** - spending is close to (or above) income
//! - **High Transaction Frequency** - many transactions in the period
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_core::insights::InsightGenerator;
//!
//! let generator = InsightGenerator::new();
//! let insights = generator.generate(&transactions, &breakdown, spent, income);
//! ```

pub mod generator;
pub mod rules;

pub use generator::{InsightGenerator, InsightInput, InsightRule};
pub use rules::{HighSpendingCategory, HighSpendingRatio, HighTransactionFrequency};
