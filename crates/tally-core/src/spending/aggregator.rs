//! Period totals and per-category breakdown

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::models::{CategorySpending, Period, SpendingSummary, Transaction};
use crate::repository::CategoryStore;

/// Default size of `top_categories`
pub const DEFAULT_TOP_CATEGORY_LIMIT: usize = 5;

/// Label used when a transaction references a category the store does not know
const UNKNOWN_CATEGORY_NAME: &str = "Unknown";

pub struct SpendingAggregator {
    categories: Arc<dyn CategoryStore>,
    top_limit: usize,
}

impl SpendingAggregator {
    pub fn new(categories: Arc<dyn CategoryStore>) -> Self {
        Self {
            categories,
            top_limit: DEFAULT_TOP_CATEGORY_LIMIT,
        }
    }

    pub fn with_top_limit(mut self, top_limit: usize) -> Self {
        self.top_limit = top_limit;
        self
    }

    /// Reduce the transactions dated inside `period` to totals and a breakdown
    ///
    /// Uncategorized transactions count toward the totals but never appear in the
    /// breakdown. Inflows count as income only.
    pub fn aggregate(
        &self,
        transactions: &[Transaction],
        period: Period,
        cancel: &CancellationToken,
    ) -> Result<SpendingSummary> {
        let mut total_spent = 0.0;
        let mut total_income = 0.0;
        let mut transaction_count = 0usize;
        let mut breakdown: Vec<CategorySpending> = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();

        for tx in transactions.iter().filter(|t| period.contains(t.date)) {
            transaction_count += 1;

            if tx.amount >= 0.0 {
                total_income += tx.amount;
                continue;
            }

            let spent = tx.amount.abs();
            total_spent += spent;

            let Some(category_id) = tx.category_id else {
                continue;
            };

            let slot = match index.get(&category_id) {
                Some(&i) => i,
                None => {
                    let name = self.category_name(category_id, cancel)?;
                    index.insert(category_id, breakdown.len());
                    breakdown.push(CategorySpending {
                        category_id,
                        category_name: name,
                        amount: 0.0,
                        percentage: 0.0,
                        transaction_count: 0,
                    });
                    breakdown.len() - 1
                }
            };
            breakdown[slot].amount += spent;
            breakdown[slot].transaction_count += 1;
        }

        if total_spent > 0.0 {
            for entry in &mut breakdown {
                entry.percentage = entry.amount / total_spent * 100.0;
            }
        }

        let top_categories = top_categories(&breakdown, self.top_limit);

        debug!(
            transactions = transaction_count,
            categories = breakdown.len(),
            total_spent,
            total_income,
            "Aggregated spending"
        );

        Ok(SpendingSummary {
            total_spent,
            total_income,
            net_amount: total_income - total_spent,
            category_breakdown: breakdown,
            top_categories,
            transaction_count,
        })
    }

    fn category_name(&self, category_id: i64, cancel: &CancellationToken) -> Result<String> {
        let category = self
            .categories
            .get_category_by_id(category_id, cancel)
            .map_err(Error::in_operation("get_category_by_id"))?;

        Ok(match category {
            Some(c) => c.name,
            None => {
                warn!(category_id, "Transaction references unknown category");
                UNKNOWN_CATEGORY_NAME.to_string()
            }
        })
    }
}

/// Breakdown sorted by amount, largest first, truncated to `limit`
pub fn top_categories(breakdown: &[CategorySpending], limit: usize) -> Vec<CategorySpending> {
    let mut sorted = breakdown.to_vec();
    sorted.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    struct Names;

    impl CategoryStore for Names {
        fn get_category_by_id(
            &self,
            id: i64,
            cancel: &CancellationToken,
        ) -> Result<Option<Category>> {
            cancel.check()?;
            let name = match id {
                1 => "Food",
                2 => "Rent",
                3 => "Travel",
                4 => "Fun",
                5 => "Gas",
                6 => "Gifts",
                _ => return Ok(None),
            };
            Ok(Some(Category {
                id,
                name: name.into(),
            }))
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn may() -> Period {
        Period::new(date(1), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn tx(day: u32, amount: f64, category_id: Option<i64>) -> Transaction {
        Transaction {
            id: day as i64,
            user_id: 1,
            date: date(day),
            description: "tx".into(),
            merchant: None,
            amount,
            category_id,
        }
    }

    fn aggregator() -> SpendingAggregator {
        SpendingAggregator::new(Arc::new(Names))
    }

    #[test]
    fn test_totals_and_percentages() {
        let txs = vec![
            tx(1, 1500.0, None),
            tx(2, -500.0, Some(1)),
            tx(3, -300.0, Some(2)),
            tx(4, -200.0, None),
        ];

        let summary = aggregator()
            .aggregate(&txs, may(), &CancellationToken::new())
            .unwrap();

        assert_eq!(summary.total_spent, 1000.0);
        assert_eq!(summary.total_income, 1500.0);
        assert_eq!(summary.net_amount, 500.0);
        assert_eq!(summary.transaction_count, 4);

        let food = summary
            .category_breakdown
            .iter()
            .find(|c| c.category_name == "Food")
            .unwrap();
        assert_eq!(food.percentage, 50.0);
        assert_eq!(food.transaction_count, 1);
    }

    #[test]
    fn test_uncategorized_only_in_totals() {
        let txs = vec![tx(2, -80.0, None), tx(3, -20.0, Some(1))];
        let summary = aggregator()
            .aggregate(&txs, may(), &CancellationToken::new())
            .unwrap();

        assert_eq!(summary.total_spent, 100.0);
        assert_eq!(summary.category_breakdown.len(), 1);
        assert!((summary.category_breakdown[0].percentage - 20.0).abs() < 1e-9);
        assert!(summary
            .category_breakdown
            .iter()
            .all(|c| c.category_name != "Uncategorized"));
    }

    #[test]
    fn test_percentages_sum_to_at_most_100() {
        let txs = vec![
            tx(1, -33.33, Some(1)),
            tx(2, -66.67, Some(2)),
            tx(3, -12.5, Some(3)),
            tx(4, -7.0, None),
            tx(5, 250.0, Some(1)),
        ];
        let summary = aggregator()
            .aggregate(&txs, may(), &CancellationToken::new())
            .unwrap();

        let sum: f64 = summary.category_breakdown.iter().map(|c| c.percentage).sum();
        assert!(sum <= 100.0 + 1e-9);
        assert!(summary.category_breakdown.iter().all(|c| c.amount >= 0.0));
    }

    #[test]
    fn test_no_spending_means_empty_breakdown() {
        let txs = vec![
            tx(1, 100.0, Some(1)),
            tx(2, 0.0, Some(2)),
            tx(3, -0.0, Some(3)),
        ];
        let summary = aggregator()
            .aggregate(&txs, may(), &CancellationToken::new())
            .unwrap();

        assert_eq!(summary.total_spent, 0.0);
        assert_eq!(summary.total_income, 100.0);
        // Only outflows enter the breakdown, and any outflow makes total_spent positive
        assert!(summary.category_breakdown.is_empty());
        assert!(summary.top_categories.is_empty());
    }

    #[test]
    fn test_out_of_period_ignored() {
        let mut before = tx(1, -40.0, Some(1));
        before.date = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let mut on_end = tx(1, -60.0, Some(1));
        on_end.date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let txs = vec![before, on_end, tx(15, -10.0, Some(1))];

        let summary = aggregator()
            .aggregate(&txs, may(), &CancellationToken::new())
            .unwrap();
        assert_eq!(summary.total_spent, 10.0);
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_top_categories_sorted_and_capped() {
        let txs: Vec<Transaction> = (1..=6)
            .map(|c| tx(c as u32, -(c as f64) * 10.0, Some(c)))
            .collect();
        let summary = aggregator()
            .aggregate(&txs, may(), &CancellationToken::new())
            .unwrap();

        assert_eq!(summary.category_breakdown.len(), 6);
        assert_eq!(summary.top_categories.len(), 5);
        let amounts: Vec<f64> = summary.top_categories.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![60.0, 50.0, 40.0, 30.0, 20.0]);

        let limited = aggregator()
            .with_top_limit(2)
            .aggregate(&txs, may(), &CancellationToken::new())
            .unwrap();
        assert_eq!(limited.top_categories.len(), 2);
    }

    #[test]
    fn test_idempotent_breakdown() {
        let txs = vec![
            tx(1, -10.0, Some(2)),
            tx(2, -20.0, Some(1)),
            tx(3, -5.0, Some(2)),
        ];
        let a = aggregator();
        let first = a.aggregate(&txs, may(), &CancellationToken::new()).unwrap();
        let second = a.aggregate(&txs, may(), &CancellationToken::new()).unwrap();

        let mut left = first.category_breakdown.clone();
        let mut right = second.category_breakdown.clone();
        left.sort_by_key(|c| c.category_id);
        right.sort_by_key(|c| c.category_id);
        assert_eq!(left, right);
    }

    #[test]
    fn test_unknown_category_labelled() {
        let txs = vec![tx(1, -10.0, Some(42))];
        let summary = aggregator()
            .aggregate(&txs, may(), &CancellationToken::new())
            .unwrap();
        assert_eq!(summary.category_breakdown[0].category_name, "Unknown");
    }
}
