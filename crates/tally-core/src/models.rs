//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Category id reported when nothing could categorize a transaction.
/// Never stored; real category ids start at 1.
pub const UNCATEGORIZED_ID: i64 = 0;

/// Display name paired with [`UNCATEGORIZED_ID`]
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

/// A spending category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A transaction as read from the transaction store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub merchant: Option<String>,
    /// Signed amount; negative values are outflows
    pub amount: f64,
    pub category_id: Option<i64>,
}

/// A transaction to be inserted (import path)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub merchant: Option<String>,
    pub amount: f64,
    pub category_id: Option<i64>,
}

/// Pattern matching type for categorization rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Case-insensitive substring match
    Exact,
    /// Whitespace-separated keywords, all must appear
    Keyword,
    /// Case-insensitive regular expression
    Regex,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Keyword => "keyword",
            Self::Regex => "regex",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "keyword" | "keywords" => Ok(Self::Keyword),
            "regex" => Ok(Self::Regex),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored rule that deterministically assigns a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationRule {
    pub id: i64,
    pub category_id: i64,
    /// The pattern to match against description + merchant
    pub pattern: String,
    pub pattern_type: PatternType,
    /// Higher priority rules are checked first
    pub priority: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a rule about to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategorizationRule {
    pub category_id: i64,
    pub pattern: String,
    pub pattern_type: PatternType,
    pub priority: i32,
    pub is_active: bool,
}

/// Partial update for a rule; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleUpdate {
    pub category_id: Option<i64>,
    pub pattern: Option<String>,
    pub pattern_type: Option<PatternType>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
}

impl RuleUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether the pattern needs re-validation after this update
    pub fn touches_pattern(&self) -> bool {
        self.pattern.is_some() || self.pattern_type.is_some()
    }
}

/// A rule with its category name resolved (for display)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleWithCategory {
    #[serde(flatten)]
    pub rule: CategorizationRule,
    pub category_name: String,
}

/// How a category was assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorizationSource {
    /// Matched by a categorization rule
    Rule,
    /// Frequency heuristic over similar transactions
    Ml,
    /// Nothing matched; the user has to categorize it
    Manual,
}

impl CategorizationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Ml => "ml",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for CategorizationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input to the categorization pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizationRequest {
    pub description: String,
    pub merchant: Option<String>,
    pub amount: f64,
    /// Opaque, carried for callers; not used for matching
    pub location: Option<String>,
}

impl CategorizationRequest {
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        Self {
            description: description.into(),
            amount,
            ..Default::default()
        }
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant = Some(merchant.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Lower-cased "description merchant" text used for matching and similarity
    pub fn match_text(&self) -> String {
        normalized_text(&self.description, self.merchant.as_deref())
    }
}

/// Build the matching text: lower(description), plus " " + lower(merchant) if present
pub fn normalized_text(description: &str, merchant: Option<&str>) -> String {
    let mut text = description.to_lowercase();
    if let Some(merchant) = merchant.filter(|m| !m.is_empty()) {
        text.push(' ');
        text.push_str(&merchant.to_lowercase());
    }
    text
}

/// A ranked runner-up suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeCategory {
    pub category_id: i64,
    pub category_name: String,
    pub confidence: f64,
}

/// Result of the categorization pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResponse {
    pub category_id: i64,
    pub category_name: String,
    /// Always within [0.0, 1.0]
    pub confidence: f64,
    pub source: CategorizationSource,
    /// Set only when source is `Rule`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_categories: Vec<AlternativeCategory>,
}

impl CategorizationResponse {
    /// The terminal "nothing matched" answer
    pub fn uncategorized() -> Self {
        Self {
            category_id: UNCATEGORIZED_ID,
            category_name: UNCATEGORIZED_NAME.to_string(),
            confidence: 0.0,
            source: CategorizationSource::Manual,
            matched_pattern: None,
            alternative_categories: Vec::new(),
        }
    }
}

/// Half-open date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Bucket size for trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
    #[default]
    Month,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            _ => Err(format!("Unknown grouping: {}", s)),
        }
    }
}

/// Spending aggregated for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub category_id: i64,
    pub category_name: String,
    /// Sum of absolute outflows, never negative
    pub amount: f64,
    /// Share of total spending (0-100)
    pub percentage: f64,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// One point of a spending trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingTrend {
    pub label: String,
    pub amount: f64,
    pub change_percent: f64,
    pub direction: TrendDirection,
}

/// Totals and breakdown for a period (analysis minus trends and insights)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub total_spent: f64,
    pub total_income: f64,
    /// total_income - total_spent
    pub net_amount: f64,
    pub category_breakdown: Vec<CategorySpending>,
    pub top_categories: Vec<CategorySpending>,
    /// Transactions that fell inside the period
    pub transaction_count: usize,
}

/// Full spending analysis for a user and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingAnalysis {
    pub user_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_spent: f64,
    pub total_income: f64,
    pub net_amount: f64,
    pub category_breakdown: Vec<CategorySpending>,
    pub top_categories: Vec<CategorySpending>,
    pub spending_trends: Vec<SpendingTrend>,
    pub insights: Vec<SpendingInsight>,
}

/// Kinds of spending insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Trend,
    Anomaly,
    Pattern,
    Recommendation,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Anomaly => "anomaly",
            Self::Pattern => "pattern",
            Self::Recommendation => "recommendation",
        }
    }
}

impl std::fmt::Display for InsightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A derived, human-readable observation about spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingInsight {
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    /// Metric values that triggered the insight
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
