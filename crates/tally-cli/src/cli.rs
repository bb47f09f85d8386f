//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Categorize transactions and analyze spending
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Transaction categorization and spending analytics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Engine config file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for real data)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set TALLY_DB_KEY environment variable with your passphrase.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// Manage categories (list, add)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Import transactions from CSV (date,description,merchant,amount,category)
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// User the transactions belong to
        #[arg(short, long)]
        user: i64,
    },

    /// Categorize a single transaction
    Categorize {
        /// Transaction description
        #[arg(short, long)]
        description: String,

        /// Merchant name
        #[arg(short, long)]
        merchant: Option<String>,

        /// Transaction amount
        #[arg(short, long, allow_negative_numbers = true)]
        amount: f64,

        /// Location (informational only)
        #[arg(long)]
        location: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze spending for a period
    Analyze {
        /// User to analyze
        #[arg(short, long)]
        user: i64,

        #[command(flatten)]
        period: PeriodArgs,

        /// Trend grouping: day, week, month
        #[arg(long, default_value = "month")]
        group_by: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show spending insights for a period
    Insights {
        /// User to analyze
        #[arg(short, long)]
        user: i64,

        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage categorization rules (list, show, add, update, delete)
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },
}

/// Period selection shared by analysis commands
#[derive(clap::Args, Debug, Clone)]
pub struct PeriodArgs {
    /// Time period: this-month, last-month, this-year, last-30-days, last-90-days, all
    #[arg(long, default_value = "this-month")]
    pub period: String,

    /// Custom start date (YYYY-MM-DD, inclusive) - overrides period
    #[arg(long)]
    pub from: Option<String>,

    /// Custom end date (YYYY-MM-DD, exclusive) - overrides period
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List,

    /// Add a category
    Add {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules
    List {
        /// Rules to skip
        #[arg(long, default_value = "0")]
        offset: u32,

        /// Maximum rules to show
        #[arg(long, default_value = "50")]
        limit: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single rule
    Show {
        /// Rule ID
        id: i64,
    },

    /// Add a new rule
    Add {
        /// Category (name or ID) to assign when the rule matches
        category: String,
        /// Pattern to match against description and merchant
        pattern: String,
        /// Pattern type: exact, keyword, regex
        #[arg(long = "type", default_value = "exact")]
        pattern_type: String,
        /// Rule priority (higher = checked first)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        priority: i32,
    },

    /// Update fields of an existing rule
    Update {
        /// Rule ID
        id: i64,
        /// New category (name or ID)
        #[arg(long)]
        category: Option<String>,
        /// New pattern
        #[arg(long)]
        pattern: Option<String>,
        /// New pattern type: exact, keyword, regex
        #[arg(long = "type")]
        pattern_type: Option<String>,
        /// New priority
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i32>,
        /// Activate or deactivate the rule
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a rule
    Delete {
        /// Rule ID to delete
        id: i64,
    },
}
