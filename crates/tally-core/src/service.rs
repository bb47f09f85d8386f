//! Spending service - the operations Tally exposes
//!
//! Wires the categorization pipeline, aggregator, insight generator and rule
//! administration over one repository. Holds no per-request state; the only
//! shared structure is the compiled pattern cache.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::categorize::{CategorizationOrchestrator, HeuristicClassifier, PatternCache, RuleMatcher};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::insights::InsightGenerator;
use crate::models::{
    CategorizationRequest, CategorizationResponse, GroupBy, PatternType, Period, RuleUpdate,
    RuleWithCategory, SpendingAnalysis, SpendingInsight, SpendingSummary, Transaction,
};
use crate::repository::{Repository, TransactionStore};
use crate::rules::RuleAdministration;
use crate::spending::{PlaceholderTrends, SpendingAggregator, TrendStrategy};

pub struct SpendingService {
    transactions: Arc<dyn TransactionStore>,
    orchestrator: CategorizationOrchestrator,
    aggregator: SpendingAggregator,
    insights: InsightGenerator,
    rules: RuleAdministration,
    trends: Box<dyn TrendStrategy>,
}

impl SpendingService {
    /// Build a service over `repo` with the given thresholds
    pub fn new<R: Repository + 'static>(repo: Arc<R>, config: &EngineConfig) -> Self {
        let cache = Arc::new(PatternCache::new());

        let matcher = RuleMatcher::new(repo.clone(), cache.clone());
        let classifier = HeuristicClassifier::new(
            repo.clone(),
            repo.clone(),
            config.categorization.similar_transaction_limit,
        );
        let orchestrator = CategorizationOrchestrator::new(repo.clone(), matcher, classifier)
            .with_rule_confidence_threshold(config.categorization.rule_confidence_threshold);

        let aggregator = SpendingAggregator::new(repo.clone())
            .with_top_limit(config.analysis.top_category_limit);

        Self {
            transactions: repo.clone(),
            orchestrator,
            aggregator,
            insights: InsightGenerator::from_config(&config.insights),
            rules: RuleAdministration::new(repo.clone(), repo, cache),
            trends: Box::new(PlaceholderTrends),
        }
    }

    /// Replace the trend strategy (placeholder by default)
    pub fn with_trend_strategy(mut self, trends: Box<dyn TrendStrategy>) -> Self {
        self.trends = trends;
        self
    }

    /// Replace the insight generator (built-ins from config by default)
    pub fn with_insight_generator(mut self, insights: InsightGenerator) -> Self {
        self.insights = insights;
        self
    }

    pub fn trend_strategy(&self) -> &'static str {
        self.trends.name()
    }

    // ========== Categorization ==========

    pub fn categorize_transaction(
        &self,
        request: &CategorizationRequest,
        cancel: &CancellationToken,
    ) -> Result<CategorizationResponse> {
        if request.description.trim().is_empty() {
            return Err(Error::Validation("description must not be empty".into()));
        }
        if !request.amount.is_finite() {
            return Err(Error::Validation(format!(
                "amount must be a finite number, got {}",
                request.amount
            )));
        }

        let response = self.orchestrator.categorize(request, cancel)?;
        debug!(
            category = %response.category_name,
            source = %response.source,
            confidence = response.confidence,
            "Categorized '{}'",
            request.description
        );
        Ok(response)
    }

    // ========== Analysis ==========

    /// Totals, breakdown, trend series and insights for `[start, end)`
    pub fn analyze_spending(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        group_by: GroupBy,
        cancel: &CancellationToken,
    ) -> Result<SpendingAnalysis> {
        let period = validated_period(start, end)?;
        let transactions = self.period_transactions(user_id, period, cancel)?;
        let summary = self.aggregator.aggregate(&transactions, period, cancel)?;

        let spending_trends = self.trends.trends(&transactions, period, group_by);
        let insights = self.insights_for(&transactions, &summary);

        info!(
            user_id,
            start = %start,
            end = %end,
            transactions = summary.transaction_count,
            insights = insights.len(),
            "Analyzed spending"
        );

        Ok(SpendingAnalysis {
            user_id,
            period_start: start,
            period_end: end,
            total_spent: summary.total_spent,
            total_income: summary.total_income,
            net_amount: summary.net_amount,
            category_breakdown: summary.category_breakdown,
            top_categories: summary.top_categories,
            spending_trends,
            insights,
        })
    }

    /// Only the insights of an analysis
    pub fn get_spending_insights(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<SpendingInsight>> {
        let period = validated_period(start, end)?;
        let transactions = self.period_transactions(user_id, period, cancel)?;
        let summary = self.aggregator.aggregate(&transactions, period, cancel)?;
        Ok(self.insights_for(&transactions, &summary))
    }

    fn period_transactions(
        &self,
        user_id: i64,
        period: Period,
        cancel: &CancellationToken,
    ) -> Result<Vec<Transaction>> {
        let mut transactions = self
            .transactions
            .get_transactions_by_period(user_id, period.start, period.end, cancel)
            .map_err(Error::in_operation("get_transactions_by_period"))?;
        // Half-open even if the store is inclusive at `end`
        transactions.retain(|t| period.contains(t.date));
        Ok(transactions)
    }

    fn insights_for(
        &self,
        transactions: &[Transaction],
        summary: &SpendingSummary,
    ) -> Vec<SpendingInsight> {
        self.insights.generate(
            transactions,
            &summary.category_breakdown,
            summary.total_spent,
            summary.total_income,
        )
    }

    // ========== Rule administration ==========

    pub fn create_categorization_rule(
        &self,
        category_id: i64,
        pattern: &str,
        pattern_type: PatternType,
        priority: i32,
        cancel: &CancellationToken,
    ) -> Result<RuleWithCategory> {
        self.rules.create(category_id, pattern, pattern_type, priority, cancel)
    }

    pub fn get_categorization_rule(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<RuleWithCategory> {
        self.rules.get(id, cancel)
    }

    pub fn list_categorization_rules(
        &self,
        offset: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<RuleWithCategory>> {
        self.rules.list(offset, limit, cancel)
    }

    pub fn update_categorization_rule(
        &self,
        id: i64,
        update: &RuleUpdate,
        cancel: &CancellationToken,
    ) -> Result<RuleWithCategory> {
        self.rules.update(id, update, cancel)
    }

    pub fn delete_categorization_rule(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        self.rules.delete(id, cancel)
    }
}

fn validated_period(start: NaiveDate, end: NaiveDate) -> Result<Period> {
    let period = Period::new(start, end);
    if !period.is_valid() {
        return Err(Error::Validation(format!(
            "period end {} must be after start {}",
            end, start
        )));
    }
    Ok(period)
}
