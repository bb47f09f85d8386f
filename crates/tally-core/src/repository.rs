//! Storage contracts consumed by the engine
//!
//! The engine never persists anything itself. Each component depends only on the
//! narrow store it needs; `db::Database` implements all three.

use chrono::NaiveDate;

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::models::{
    CategorizationRule, Category, NewCategorizationRule, RuleUpdate, Transaction,
};

/// Categorization rule persistence
pub trait RuleStore: Send + Sync {
    /// All rules with `is_active = true`, in storage order
    fn get_active_categorization_rules(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<CategorizationRule>>;

    fn get_categorization_rule_by_id(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<CategorizationRule>>;

    fn get_categorization_rules(
        &self,
        offset: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<CategorizationRule>>;

    fn create_categorization_rule(
        &self,
        rule: &NewCategorizationRule,
        cancel: &CancellationToken,
    ) -> Result<CategorizationRule>;

    /// Apply `update` to rule `id`; `None` if the rule does not exist
    fn update_categorization_rule(
        &self,
        id: i64,
        update: &RuleUpdate,
        cancel: &CancellationToken,
    ) -> Result<Option<CategorizationRule>>;

    /// Delete rule `id`; returns whether a rule was removed
    fn delete_categorization_rule(&self, id: i64, cancel: &CancellationToken) -> Result<bool>;
}

/// Category lookup
pub trait CategoryStore: Send + Sync {
    fn get_category_by_id(&self, id: i64, cancel: &CancellationToken)
        -> Result<Option<Category>>;
}

/// Read access to transaction history
pub trait TransactionStore: Send + Sync {
    /// Up to `limit` historical transactions similar to `text`, most similar first
    fn get_similar_transactions(
        &self,
        text: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Transaction>>;

    /// A user's transactions dated within `[start, end)`
    fn get_transactions_by_period(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<Transaction>>;
}

/// Everything the full service needs from one backend
pub trait Repository: RuleStore + CategoryStore + TransactionStore {}

impl<T: RuleStore + CategoryStore + TransactionStore> Repository for T {}
