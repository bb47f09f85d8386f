//! Tally Core Library
//!
//! Transaction categorization and spending analytics:
//! - Rule-based categorization with a frequency heuristic fallback
//! - Period spending aggregation with per-category breakdown
//! - Threshold-based spending insights
//! - Categorization rule administration
//! - SQLite repository with optional SQLCipher encryption
//! - CSV transaction import

pub mod cancel;
pub mod categorize;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod insights;
pub mod models;
pub mod repository;
pub mod rules;
pub mod service;
pub mod spending;

pub use cancel::CancellationToken;
pub use categorize::{CategorizationOrchestrator, HeuristicClassifier, PatternCache, RuleMatcher};
pub use config::EngineConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use import::{import_csv, ImportStats};
pub use insights::{InsightGenerator, InsightRule};
pub use models::*;
pub use repository::{CategoryStore, Repository, RuleStore, TransactionStore};
pub use rules::RuleAdministration;
pub use service::SpendingService;
pub use spending::{PlaceholderTrends, SpendingAggregator, TrendStrategy};
