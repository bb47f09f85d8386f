//! Store trait implementations for `Database`
//!
//! Each call checks the cancellation token before touching the pool.

use chrono::NaiveDate;

use super::Database;
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::models::{
    CategorizationRule, Category, NewCategorizationRule, RuleUpdate, Transaction,
};
use crate::repository::{CategoryStore, RuleStore, TransactionStore};

impl RuleStore for Database {
    fn get_active_categorization_rules(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<CategorizationRule>> {
        cancel.check()?;
        self.list_active_rules()
    }

    fn get_categorization_rule_by_id(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<CategorizationRule>> {
        cancel.check()?;
        self.get_rule(id)
    }

    fn get_categorization_rules(
        &self,
        offset: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<CategorizationRule>> {
        cancel.check()?;
        self.list_rules(offset, limit)
    }

    fn create_categorization_rule(
        &self,
        rule: &NewCategorizationRule,
        cancel: &CancellationToken,
    ) -> Result<CategorizationRule> {
        cancel.check()?;
        self.create_rule(rule)
    }

    fn update_categorization_rule(
        &self,
        id: i64,
        update: &RuleUpdate,
        cancel: &CancellationToken,
    ) -> Result<Option<CategorizationRule>> {
        cancel.check()?;
        self.update_rule(id, update)
    }

    fn delete_categorization_rule(&self, id: i64, cancel: &CancellationToken) -> Result<bool> {
        cancel.check()?;
        self.delete_rule(id)
    }
}

impl CategoryStore for Database {
    fn get_category_by_id(
        &self,
        id: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<Category>> {
        cancel.check()?;
        self.get_category(id)
    }
}

impl TransactionStore for Database {
    fn get_similar_transactions(
        &self,
        text: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Transaction>> {
        cancel.check()?;
        self.find_similar_transactions(text, limit)
    }

    fn get_transactions_by_period(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<Transaction>> {
        cancel.check()?;
        self.list_transactions_in_period(user_id, start, end)
    }
}
