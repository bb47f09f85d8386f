//! CSV import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{import_csv, Database};

pub fn cmd_import(db: &Database, file: &Path, user_id: i64) -> Result<()> {
    println!("📥 Importing {} for user {}...", file.display(), user_id);

    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let stats = import_csv(db, reader, user_id).context("Import failed")?;

    println!("   Imported:    {}", stats.imported);
    println!("   Categorized: {}", stats.categorized);
    if !stats.unknown_categories.is_empty() {
        println!(
            "   ⚠️  Unknown categories (imported uncategorized): {}",
            stats.unknown_categories.join(", ")
        );
    }
    println!("✅ Import complete");

    Ok(())
}
