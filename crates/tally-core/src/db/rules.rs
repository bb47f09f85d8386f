//! Categorization rule operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{CategorizationRule, NewCategorizationRule, PatternType, RuleUpdate};

const RULE_COLUMNS: &str =
    "id, category_id, pattern, pattern_type, priority, is_active, created_at, updated_at";

fn row_to_rule(row: &Row<'_>) -> rusqlite::Result<CategorizationRule> {
    let pattern_type_str: String = row.get(3)?;
    let pattern_type: PatternType = pattern_type_str.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    Ok(CategorizationRule {
        id: row.get(0)?,
        category_id: row.get(1)?,
        pattern: row.get(2)?,
        pattern_type,
        priority: row.get(4)?,
        is_active: row.get(5)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

impl Database {
    /// Insert a rule (no pattern validation here)
    pub fn create_rule(&self, rule: &NewCategorizationRule) -> Result<CategorizationRule> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO categorization_rules (category_id, pattern, pattern_type, priority, is_active)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                rule.category_id,
                rule.pattern,
                rule.pattern_type.as_str(),
                rule.priority,
                rule.is_active
            ],
        )?;
        let id = conn.last_insert_rowid();

        let created = conn.query_row(
            &format!("SELECT {} FROM categorization_rules WHERE id = ?", RULE_COLUMNS),
            params![id],
            row_to_rule,
        )?;
        Ok(created)
    }

    /// Get a rule by ID
    pub fn get_rule(&self, id: i64) -> Result<Option<CategorizationRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                &format!("SELECT {} FROM categorization_rules WHERE id = ?", RULE_COLUMNS),
                params![id],
                row_to_rule,
            )
            .optional()?;
        Ok(rule)
    }

    /// Page through all rules in creation order
    pub fn list_rules(&self, offset: u32, limit: u32) -> Result<Vec<CategorizationRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categorization_rules ORDER BY id LIMIT ? OFFSET ?",
            RULE_COLUMNS
        ))?;

        let rules = stmt
            .query_map(params![limit, offset], row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Active rules in creation order (the matcher sorts by priority)
    pub fn list_active_rules(&self) -> Result<Vec<CategorizationRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categorization_rules WHERE is_active = 1 ORDER BY id",
            RULE_COLUMNS
        ))?;

        let rules = stmt
            .query_map([], row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Apply the provided fields; `None` if the rule does not exist
    pub fn update_rule(&self, id: i64, update: &RuleUpdate) -> Result<Option<CategorizationRule>> {
        let conn = self.conn()?;

        let changed = conn.execute(
            r#"
            UPDATE categorization_rules SET
                category_id = COALESCE(?, category_id),
                pattern = COALESCE(?, pattern),
                pattern_type = COALESCE(?, pattern_type),
                priority = COALESCE(?, priority),
                is_active = COALESCE(?, is_active),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                update.category_id,
                update.pattern,
                update.pattern_type.map(|t| t.as_str()),
                update.priority,
                update.is_active,
                id
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_rule(id)
    }

    /// Delete a rule; returns whether it existed
    pub fn delete_rule(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM categorization_rules WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}
