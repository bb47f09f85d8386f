//! Insight generator - runs registered threshold rules over aggregated spending

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::InsightConfig;
use crate::models::{CategorySpending, SpendingInsight, Transaction};

use super::rules::{HighSpendingCategory, HighSpendingRatio, HighTransactionFrequency};

/// Everything an insight rule may look at
pub struct InsightInput<'a> {
    /// Transactions inside the analysed period
    pub transactions: &'a [Transaction],
    pub category_breakdown: &'a [CategorySpending],
    pub total_spent: f64,
    pub total_income: f64,
    /// Shared creation timestamp for this run
    pub generated_at: DateTime<Utc>,
}

/// A stateless rule that may produce one insight
pub trait InsightRule: Send + Sync {
    /// Human-readable name, also used as the insight title
    fn name(&self) -> &'static str;

    fn evaluate(&self, input: &InsightInput<'_>) -> Option<SpendingInsight>;
}

/// Runs every registered rule; any subset may fire
pub struct InsightGenerator {
    rules: Vec<Box<dyn InsightRule>>,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightGenerator {
    /// Generator with the built-in rules at their default thresholds
    pub fn new() -> Self {
        Self::from_config(&InsightConfig::default())
    }

    /// Generator with the built-in rules at configured thresholds
    pub fn from_config(config: &InsightConfig) -> Self {
        let mut generator = Self::empty();

        generator.register(Box::new(HighSpendingCategory::new(
            config.high_category_share_percent,
        )));
        generator.register(Box::new(HighSpendingRatio::new(config.high_spending_ratio)));
        generator.register(Box::new(HighTransactionFrequency::new(
            config.high_frequency_count,
        )));

        generator
    }

    /// Generator with no rules registered
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate all rules in registration order
    pub fn generate(
        &self,
        transactions: &[Transaction],
        category_breakdown: &[CategorySpending],
        total_spent: f64,
        total_income: f64,
    ) -> Vec<SpendingInsight> {
        let input = InsightInput {
            transactions,
            category_breakdown,
            total_spent,
            total_income,
            generated_at: Utc::now(),
        };

        let insights: Vec<SpendingInsight> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let insight = rule.evaluate(&input);
                if insight.is_some() {
                    debug!(rule = rule.name(), "Insight fired");
                }
                insight
            })
            .collect();

        debug!(
            rules = self.rules.len(),
            fired = insights.len(),
            "Insight generation complete"
        );
        insights
    }
}
