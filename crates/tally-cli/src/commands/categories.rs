//! Category commands

use anyhow::{bail, Context, Result};
use tally_core::{Category, Database};

pub fn cmd_categories_list(db: &Database) -> Result<()> {
    let categories = db.list_categories()?;

    if categories.is_empty() {
        println!("No categories. Run 'tally init' to seed the defaults.");
        return Ok(());
    }

    println!();
    println!("  ID │ Category");
    println!("─────┼──────────────────────────────");
    for category in &categories {
        println!("{:>4} │ {}", category.id, category.name);
    }
    println!();
    println!("{} categories", categories.len());

    Ok(())
}

pub fn cmd_categories_add(db: &Database, name: &str) -> Result<()> {
    let category = db
        .create_category(name)
        .with_context(|| format!("Failed to add category '{}'", name))?;
    println!("✅ Added category {} (ID: {})", category.name, category.id);
    Ok(())
}

/// Resolve a category given as an ID or a (case-insensitive) name
pub fn resolve_category(db: &Database, value: &str) -> Result<Category> {
    let found = match value.trim().parse::<i64>() {
        Ok(id) => db.get_category(id)?,
        Err(_) => db.get_category_by_name(value)?,
    };

    match found {
        Some(category) => Ok(category),
        None => bail!(
            "Category not found: {}. Use 'tally categories' to see available categories.",
            value
        ),
    }
}
