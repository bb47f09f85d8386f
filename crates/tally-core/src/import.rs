//! CSV transaction import
//!
//! Expected header: `date,description,merchant,amount,category`. Column order is
//! free, header names are case-insensitive, and `merchant` and `category` may be
//! missing or blank. Categories are referenced by name.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::NewTransaction;

/// One parsed CSV row, category still unresolved
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub date: NaiveDate,
    pub description: String,
    pub merchant: Option<String>,
    pub amount: f64,
    pub category: Option<String>,
}

/// Outcome of importing a file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub categorized: usize,
    /// Category names that did not resolve (rows imported uncategorized)
    pub unknown_categories: Vec<String>,
}

struct Columns {
    date: usize,
    description: usize,
    merchant: Option<usize>,
    amount: usize,
    category: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::Import(format!("Missing '{}' column", name)))
        };

        Ok(Self {
            date: require("date")?,
            description: require("description")?,
            merchant: find("merchant"),
            amount: require("amount")?,
            category: find("category"),
        })
    }
}

fn optional_field(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse CSV data into rows
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<ImportRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut rows = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = i + 2;

        let date_str = record
            .get(columns.date)
            .ok_or_else(|| Error::Import(format!("Line {}: missing date", line)))?;
        let date = parse_date(date_str)
            .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?;

        let description = record
            .get(columns.description)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Import(format!("Line {}: missing description", line)))?;

        let amount_str = record
            .get(columns.amount)
            .ok_or_else(|| Error::Import(format!("Line {}: missing amount", line)))?;
        let amount = parse_amount(amount_str)
            .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?;

        rows.push(ImportRow {
            date,
            description,
            merchant: optional_field(&record, columns.merchant),
            amount,
            category: optional_field(&record, columns.category),
        });
    }

    debug!("Parsed {} CSV rows", rows.len());
    Ok(rows)
}

/// Parse a CSV file and store its rows for `user_id`
pub fn import_csv<R: Read>(db: &Database, reader: R, user_id: i64) -> Result<ImportStats> {
    let rows = parse_csv(reader)?;

    let mut stats = ImportStats::default();
    let mut resolved: HashMap<String, Option<i64>> = HashMap::new();
    let mut batch = Vec::with_capacity(rows.len());

    for row in rows {
        let category_id = match &row.category {
            None => None,
            Some(name) => {
                let key = name.to_lowercase();
                match resolved.get(&key) {
                    Some(id) => *id,
                    None => {
                        let id = db.get_category_by_name(name)?.map(|c| c.id);
                        if id.is_none() {
                            warn!(category = %name, "Unknown category, importing uncategorized");
                            stats.unknown_categories.push(name.clone());
                        }
                        resolved.insert(key, id);
                        id
                    }
                }
            }
        };

        if category_id.is_some() {
            stats.categorized += 1;
        }
        batch.push(NewTransaction {
            user_id,
            date: row.date,
            description: row.description,
            merchant: row.merchant,
            amount: row.amount,
            category_id,
        });
    }

    stats.imported = db.insert_transactions(&batch)?.len();

    info!(
        user_id,
        imported = stats.imported,
        categorized = stats.categorized,
        "Imported transactions"
    );
    Ok(stats)
}

/// Parse a date string in various common formats
fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(format!("Unable to parse date: {}", s))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> std::result::Result<f64, String> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(format!("Unable to parse amount: {}", s)),
    }
}
