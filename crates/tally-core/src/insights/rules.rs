//! Built-in threshold insights

use serde_json::json;

use crate::config::InsightConfig;
use crate::models::{InsightType, Severity, SpendingInsight};

use super::generator::{InsightInput, InsightRule};

/// Fires when one category takes more than `share_percent` of total spend
pub struct HighSpendingCategory {
    pub share_percent: f64,
}

impl HighSpendingCategory {
    pub fn new(share_percent: f64) -> Self {
        Self { share_percent }
    }
}

impl Default for HighSpendingCategory {
    fn default() -> Self {
        Self::new(InsightConfig::default().high_category_share_percent)
    }
}

impl InsightRule for HighSpendingCategory {
    fn name(&self) -> &'static str {
        "High Spending Category"
    }

    fn evaluate(&self, input: &InsightInput<'_>) -> Option<SpendingInsight> {
        // First of equal maxima wins
        let top = input
            .category_breakdown
            .iter()
            .reduce(|best, c| if c.amount > best.amount { c } else { best })?;

        if top.percentage <= self.share_percent {
            return None;
        }

        Some(SpendingInsight {
            insight_type: InsightType::Pattern,
            title: self.name().to_string(),
            description: format!(
                "{:.1}% of your spending went to {}",
                top.percentage, top.category_name
            ),
            severity: Severity::Medium,
            data: json!({
                "category_id": top.category_id,
                "category_name": top.category_name,
                "amount": top.amount,
                "percentage": top.percentage,
                "threshold_percent": self.share_percent,
            }),
            created_at: input.generated_at,
        })
    }
}

/// Fires when spending exceeds `ratio` of income
pub struct HighSpendingRatio {
    pub ratio: f64,
}

impl HighSpendingRatio {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }
}

impl Default for HighSpendingRatio {
    fn default() -> Self {
        Self::new(InsightConfig::default().high_spending_ratio)
    }
}

impl InsightRule for HighSpendingRatio {
    fn name(&self) -> &'static str {
        "High Spending Ratio"
    }

    fn evaluate(&self, input: &InsightInput<'_>) -> Option<SpendingInsight> {
        if input.total_income <= 0.0 {
            return None;
        }

        let spending_ratio = input.total_spent / input.total_income;
        if spending_ratio <= self.ratio {
            return None;
        }

        Some(SpendingInsight {
            insight_type: InsightType::Recommendation,
            title: self.name().to_string(),
            description: format!(
                "You spent {:.1}% of your income this period",
                spending_ratio * 100.0
            ),
            severity: Severity::High,
            data: json!({
                "total_spent": input.total_spent,
                "total_income": input.total_income,
                "spending_ratio": spending_ratio,
                "threshold_ratio": self.ratio,
            }),
            created_at: input.generated_at,
        })
    }
}

/// Fires when the period has more than `count` transactions
pub struct HighTransactionFrequency {
    pub count: usize,
}

impl HighTransactionFrequency {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl Default for HighTransactionFrequency {
    fn default() -> Self {
        Self::new(InsightConfig::default().high_frequency_count)
    }
}

impl InsightRule for HighTransactionFrequency {
    fn name(&self) -> &'static str {
        "High Transaction Frequency"
    }

    fn evaluate(&self, input: &InsightInput<'_>) -> Option<SpendingInsight> {
        let transaction_count = input.transactions.len();
        if transaction_count <= self.count {
            return None;
        }

        Some(SpendingInsight {
            insight_type: InsightType::Pattern,
            title: self.name().to_string(),
            description: format!("You made {} transactions this period", transaction_count),
            severity: Severity::Low,
            data: json!({
                "transaction_count": transaction_count,
                "threshold_count": self.count,
            }),
            created_at: input.generated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategorySpending, Transaction};
    use chrono::{NaiveDate, Utc};

    fn spending(id: i64, name: &str, amount: f64, percentage: f64) -> CategorySpending {
        CategorySpending {
            category_id: id,
            category_name: name.into(),
            amount,
            percentage,
            transaction_count: 1,
        }
    }

    fn input<'a>(
        transactions: &'a [Transaction],
        breakdown: &'a [CategorySpending],
        total_spent: f64,
        total_income: f64,
    ) -> InsightInput<'a> {
        InsightInput {
            transactions,
            category_breakdown: breakdown,
            total_spent,
            total_income,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_high_category_fires_above_threshold() {
        let breakdown = vec![
            spending(1, "Food", 500.0, 50.0),
            spending(2, "Rent", 300.0, 30.0),
        ];
        let insight = HighSpendingCategory::default()
            .evaluate(&input(&[], &breakdown, 1000.0, 0.0))
            .unwrap();

        assert_eq!(insight.severity, Severity::Medium);
        assert_eq!(insight.description, "50.0% of your spending went to Food");
        assert_eq!(insight.data["category_name"], "Food");
        assert_eq!(insight.data["percentage"], 50.0);
    }

    #[test]
    fn test_high_category_needs_strictly_more() {
        let breakdown = vec![spending(1, "Food", 300.0, 30.0)];
        assert!(HighSpendingCategory::default()
            .evaluate(&input(&[], &breakdown, 1000.0, 0.0))
            .is_none());
        assert!(HighSpendingCategory::default()
            .evaluate(&input(&[], &[], 0.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_high_category_uses_largest_amount() {
        // Unordered breakdown; the largest amount is not first
        let breakdown = vec![
            spending(1, "Gas", 100.0, 10.0),
            spending(2, "Rent", 600.0, 60.0),
        ];
        let insight = HighSpendingCategory::default()
            .evaluate(&input(&[], &breakdown, 1000.0, 0.0))
            .unwrap();
        assert_eq!(insight.data["category_id"], 2);
    }

    #[test]
    fn test_spending_ratio_threshold() {
        // 1000 / 1500 = 0.667
        assert!(HighSpendingRatio::default()
            .evaluate(&input(&[], &[], 1000.0, 1500.0))
            .is_none());

        let insight = HighSpendingRatio::default()
            .evaluate(&input(&[], &[], 1900.0, 2000.0))
            .unwrap();
        assert_eq!(insight.severity, Severity::High);
        assert_eq!(insight.insight_type, InsightType::Recommendation);
        assert_eq!(insight.description, "You spent 95.0% of your income this period");
        assert_eq!(insight.data["spending_ratio"], 0.95);
    }

    #[test]
    fn test_spending_ratio_requires_income() {
        assert!(HighSpendingRatio::default()
            .evaluate(&input(&[], &[], 1000.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_frequency_threshold() {
        let tx = Transaction {
            id: 1,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            description: "COFFEE".into(),
            merchant: None,
            amount: -3.0,
            category_id: None,
        };
        let fifty = vec![tx.clone(); 50];
        assert!(HighTransactionFrequency::default()
            .evaluate(&input(&fifty, &[], 150.0, 0.0))
            .is_none());

        let sixty = vec![tx; 60];
        let insight = HighTransactionFrequency::default()
            .evaluate(&input(&sixty, &[], 180.0, 0.0))
            .unwrap();
        assert_eq!(insight.severity, Severity::Low);
        assert_eq!(insight.data["transaction_count"], 60);
        assert!(insight.description.contains("60"));
    }
}
