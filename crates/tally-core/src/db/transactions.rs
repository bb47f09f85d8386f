//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{parse_date, Database};
use crate::error::Result;
use crate::models::{NewTransaction, Transaction};

/// Shortest word considered by the similarity search
const MIN_TOKEN_LEN: usize = 3;

const TRANSACTION_COLUMNS: &str = "id, user_id, date, description, merchant, amount, category_id";

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(2)?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date(2, &date_str)?,
        description: row.get(3)?,
        merchant: row.get(4)?,
        amount: row.get(5)?,
        category_id: row.get(6)?,
    })
}

/// Distinct lower-cased words of at least `MIN_TOKEN_LEN` characters
///
/// Folds ASCII only, like SQLite's `lower()` and `LIKE`. Non-ASCII letters match
/// only in the same case.
pub(crate) fn similarity_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for word in text
        .to_ascii_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TOKEN_LEN)
    {
        if !tokens.iter().any(|t| t == word) {
            tokens.push(word.to_string());
        }
    }
    tokens
}

const INSERT_TRANSACTION: &str = r#"
    INSERT INTO transactions (user_id, date, description, merchant, amount, category_id)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

fn insert_row(conn: &Connection, tx: &NewTransaction) -> rusqlite::Result<i64> {
    conn.execute(
        INSERT_TRANSACTION,
        params![
            tx.user_id,
            tx.date.format("%Y-%m-%d").to_string(),
            tx.description,
            tx.merchant,
            tx.amount,
            tx.category_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Insert a transaction, returning its ID
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let conn = self.conn()?;
        Ok(insert_row(&conn, tx)?)
    }

    /// Insert a batch of transactions atomically, returning their IDs in order
    pub fn insert_transactions(&self, txs: &[NewTransaction]) -> Result<Vec<i64>> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;

        let mut ids = Vec::with_capacity(txs.len());
        for tx in txs {
            ids.push(insert_row(&db_tx, tx)?);
        }

        db_tx.commit()?;
        Ok(ids)
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
                params![id],
                row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// Assign (or clear) a transaction's category; returns whether it existed
    pub fn set_transaction_category(&self, id: i64, category_id: Option<i64>) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE transactions SET category_id = ? WHERE id = ?",
            params![category_id, id],
        )?;
        Ok(changed > 0)
    }

    /// A user's transactions dated within `[start, end)`, oldest first
    pub fn list_transactions_in_period(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM transactions
            WHERE user_id = ? AND date >= ? AND date < ?
            ORDER BY date, id
            "#,
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(
                params![
                    user_id,
                    start.format("%Y-%m-%d").to_string(),
                    end.format("%Y-%m-%d").to_string()
                ],
                row_to_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Transactions sharing words with `text`
    ///
    /// Ranked by number of shared words, then most recent first.
    pub fn find_similar_transactions(&self, text: &str, limit: usize) -> Result<Vec<Transaction>> {
        let tokens = similarity_tokens(text);
        if tokens.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let score = tokens
            .iter()
            .map(|_| "(CASE WHEN haystack LIKE ? THEN 1 ELSE 0 END)")
            .collect::<Vec<_>>()
            .join(" + ");

        let sql = format!(
            r#"
            SELECT {columns} FROM (
                SELECT *, {score} AS score FROM (
                    SELECT *, lower(description || ' ' || COALESCE(merchant, '')) AS haystack
                    FROM transactions
                )
            )
            WHERE score > 0
            ORDER BY score DESC, date DESC, id DESC
            LIMIT {limit}
            "#,
            columns = TRANSACTION_COLUMNS,
            score = score,
            limit = limit,
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let patterns = tokens.iter().map(|t| format!("%{}%", t));

        let transactions = stmt
            .query_map(params_from_iter(patterns), row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Number of stored transactions for a user
    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
