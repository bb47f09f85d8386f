//! Transaction categorization
//!
//! - `matcher` - deterministic pattern rules with a compiled pattern cache
//! - `heuristic` - frequency heuristic over similar historical transactions
//! - `orchestrator` - rule → heuristic → "Uncategorized" pipeline

pub mod heuristic;
pub mod matcher;
pub mod orchestrator;

pub use heuristic::{amount_similarity, rank_categories, HeuristicClassifier};
pub use matcher::{rule_confidence, validate_pattern, PatternCache, RuleMatcher, RulePattern};
pub use orchestrator::{CategorizationOrchestrator, DEFAULT_RULE_CONFIDENCE_THRESHOLD};
