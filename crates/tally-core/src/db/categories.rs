//! Category operations

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::Database;
use crate::error::{Error, Result};
use crate::models::Category;

/// Categories created by `seed_default_categories`
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Income",
    "Housing",
    "Utilities",
    "Groceries",
    "Dining",
    "Transport",
    "Healthcare",
    "Shopping",
    "Entertainment",
    "Subscriptions",
    "Travel",
    "Personal",
    "Education",
    "Financial",
    "Other",
];

impl Database {
    /// Seed the default categories (idempotent - skips existing names)
    ///
    /// Returns how many categories were created.
    pub fn seed_default_categories(&self) -> Result<usize> {
        let conn = self.conn()?;

        let mut created = 0;
        for name in DEFAULT_CATEGORIES {
            created += conn.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?)",
                params![name],
            )?;
        }

        if created > 0 {
            info!("Seeded {} default categories", created);
        }
        Ok(created)
    }

    /// Create a category; names are unique (case-insensitive)
    pub fn create_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("category name must not be empty".into()));
        }
        if self.get_category_by_name(name)?.is_some() {
            return Err(Error::Validation(format!(
                "category '{}' already exists",
                name
            )));
        }

        let conn = self.conn()?;
        conn.execute("INSERT INTO categories (name) VALUES (?)", params![name])?;

        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    /// Get a category by ID
    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name FROM categories WHERE id = ?",
                params![id],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    /// Get a category by name (case-insensitive)
    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name FROM categories WHERE name = ? COLLATE NOCASE",
                params![name.trim()],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    /// List all categories by name
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;

        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }
}
