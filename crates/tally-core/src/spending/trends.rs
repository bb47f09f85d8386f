//! Spending trend series
//!
//! Trend computation is a pluggable strategy. No real algorithm has been settled
//! on yet, so the default strategy is a placeholder that ignores its input.

use crate::models::{GroupBy, Period, SpendingTrend, Transaction, TrendDirection};

/// Produces the `spending_trends` series of an analysis
pub trait TrendStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn trends(
        &self,
        transactions: &[Transaction],
        period: Period,
        group_by: GroupBy,
    ) -> Vec<SpendingTrend>;
}

/// Placeholder: a fixed, flat two-point series unrelated to the transactions.
///
/// Callers that need real trends should supply their own [`TrendStrategy`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderTrends;

impl TrendStrategy for PlaceholderTrends {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn trends(
        &self,
        _transactions: &[Transaction],
        _period: Period,
        _group_by: GroupBy,
    ) -> Vec<SpendingTrend> {
        ["previous", "current"]
            .into_iter()
            .map(|label| SpendingTrend {
                label: label.to_string(),
                amount: 0.0,
                change_percent: 0.0,
                direction: TrendDirection::Stable,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn period() -> Period {
        Period::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
    }

    #[test]
    fn test_placeholder_ignores_input() {
        let tx = Transaction {
            id: 1,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            description: "RENT".into(),
            merchant: None,
            amount: -2000.0,
            category_id: None,
        };

        let empty = PlaceholderTrends.trends(&[], period(), GroupBy::Month);
        let full = PlaceholderTrends.trends(&[tx], period(), GroupBy::Day);

        assert_eq!(empty, full);
        assert_eq!(empty.len(), 2);
        assert!(empty.iter().all(|t| t.direction == TrendDirection::Stable));
        assert_eq!(PlaceholderTrends.name(), "placeholder");
    }
}
