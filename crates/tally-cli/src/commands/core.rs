//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `open_service` - Open the database and wire the engine around it
//! - `cmd_init` - Initialize the database

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tally_core::{Database, EngineConfig, SpendingService};
use tracing::debug;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Resolve the engine config: --config, then the data-dir override, then defaults
pub fn load_config(config_path: Option<&Path>) -> Result<EngineConfig> {
    let config = EngineConfig::load(config_path).context("Failed to load engine config")?;
    debug!(?config, "Loaded engine config");
    Ok(config)
}

/// Build the spending service on top of an open database
pub fn build_service(db: &Database, config_path: Option<&Path>) -> Result<SpendingService> {
    let config = load_config(config_path)?;
    Ok(SpendingService::new(Arc::new(db.clone()), &config))
}

pub fn open_service(
    db_path: &Path,
    config_path: Option<&Path>,
    no_encrypt: bool,
) -> Result<SpendingService> {
    let db = open_db(db_path, no_encrypt)?;
    build_service(&db, config_path)
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    let created = db
        .seed_default_categories()
        .context("Failed to seed default categories")?;
    println!("   Seeded {} default categories", created);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: tally import --file statement.csv --user 1");
    println!("  2. Add rules: tally rules add Groceries walmart");
    println!("  3. Analyze: tally analyze --user 1 --period last-month");

    Ok(())
}
