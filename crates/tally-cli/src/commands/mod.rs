//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db, open_service)
//! - `categories` - Category listing and creation
//! - `categorize` - Single-transaction categorization
//! - `import` - CSV transaction import
//! - `reports` - Spending analysis and insights
//! - `rules` - Categorization rule management

pub mod categories;
pub mod categorize;
pub mod core;
pub mod import;
pub mod reports;
pub mod rules;

// Re-export command functions for main.rs
pub use categories::*;
pub use categorize::*;
pub use core::*;
pub use import::*;
pub use reports::*;
pub use rules::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
