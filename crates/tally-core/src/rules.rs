//! Categorization rule administration
//!
//! CRUD over the rule store with pattern validation up front. Writes invalidate the
//! compiled pattern cache so the next categorization sees the new pattern.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::categorize::{validate_pattern, PatternCache};
use crate::error::{Error, Result};
use crate::models::{
    CategorizationRule, Category, NewCategorizationRule, PatternType, RuleUpdate,
    RuleWithCategory,
};
use crate::repository::{CategoryStore, RuleStore};

pub struct RuleAdministration {
    rules: Arc<dyn RuleStore>,
    categories: Arc<dyn CategoryStore>,
    cache: Arc<PatternCache>,
}

impl RuleAdministration {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        categories: Arc<dyn CategoryStore>,
        cache: Arc<PatternCache>,
    ) -> Self {
        Self {
            rules,
            categories,
            cache,
        }
    }

    /// Validate and persist a new, active rule
    pub fn create(
        &self,
        category_id: i64,
        pattern: &str,
        pattern_type: PatternType,
        priority: i32,
        cancel: &CancellationToken,
    ) -> Result<RuleWithCategory> {
        validate_pattern(pattern_type, pattern)?;
        let category = self.require_category(category_id, cancel)?;

        let rule = self
            .rules
            .create_categorization_rule(
                &NewCategorizationRule {
                    category_id,
                    pattern: pattern.to_string(),
                    pattern_type,
                    priority,
                    is_active: true,
                },
                cancel,
            )
            .map_err(Error::in_operation("create_categorization_rule"))?;

        info!(
            rule_id = rule.id,
            category = %category.name,
            pattern_type = %rule.pattern_type,
            priority = rule.priority,
            "Created categorization rule"
        );

        Ok(RuleWithCategory {
            rule,
            category_name: category.name,
        })
    }

    pub fn get(&self, id: i64, cancel: &CancellationToken) -> Result<RuleWithCategory> {
        let rule = self.existing_rule(id, cancel)?;
        self.with_category(rule, cancel)
    }

    /// A page of rules, each with its category name
    pub fn list(
        &self,
        offset: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<RuleWithCategory>> {
        let rules = self
            .rules
            .get_categorization_rules(offset, limit, cancel)
            .map_err(Error::in_operation("get_categorization_rules"))?;

        let mut names: HashMap<i64, String> = HashMap::new();
        let mut out = Vec::with_capacity(rules.len());
        for rule in rules {
            let category_name = match names.get(&rule.category_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.category_name(rule.category_id, cancel)?;
                    names.insert(rule.category_id, name.clone());
                    name
                }
            };
            out.push(RuleWithCategory {
                rule,
                category_name,
            });
        }
        Ok(out)
    }

    /// Merge `update` onto rule `id`
    ///
    /// Pattern and type are re-validated together when either one changes.
    pub fn update(
        &self,
        id: i64,
        update: &RuleUpdate,
        cancel: &CancellationToken,
    ) -> Result<RuleWithCategory> {
        let existing = self.existing_rule(id, cancel)?;
        if update.is_empty() {
            return self.with_category(existing, cancel);
        }

        if update.touches_pattern() {
            let pattern = update.pattern.as_deref().unwrap_or(&existing.pattern);
            let pattern_type = update.pattern_type.unwrap_or(existing.pattern_type);
            validate_pattern(pattern_type, pattern)?;
        }
        if let Some(category_id) = update.category_id {
            self.require_category(category_id, cancel)?;
        }

        let rule = self
            .rules
            .update_categorization_rule(id, update, cancel)
            .map_err(Error::in_operation("update_categorization_rule"))?
            .ok_or_else(|| Error::NotFound(format!("categorization rule {}", id)))?;

        self.cache.invalidate(id);
        info!(rule_id = id, "Updated categorization rule");

        self.with_category(rule, cancel)
    }

    /// Delete rule `id`; an unknown id is `NotFound`
    pub fn delete(&self, id: i64, cancel: &CancellationToken) -> Result<()> {
        let existed = self
            .rules
            .delete_categorization_rule(id, cancel)
            .map_err(Error::in_operation("delete_categorization_rule"))?;

        if !existed {
            return Err(Error::NotFound(format!("categorization rule {}", id)));
        }

        self.cache.invalidate(id);
        info!(rule_id = id, "Deleted categorization rule");
        Ok(())
    }

    fn existing_rule(&self, id: i64, cancel: &CancellationToken) -> Result<CategorizationRule> {
        self.rules
            .get_categorization_rule_by_id(id, cancel)
            .map_err(Error::in_operation("get_categorization_rule_by_id"))?
            .ok_or_else(|| Error::NotFound(format!("categorization rule {}", id)))
    }

    fn require_category(&self, category_id: i64, cancel: &CancellationToken) -> Result<Category> {
        self.categories
            .get_category_by_id(category_id, cancel)
            .map_err(Error::in_operation("get_category_by_id"))?
            .ok_or_else(|| Error::Validation(format!("category {} does not exist", category_id)))
    }

    fn category_name(&self, category_id: i64, cancel: &CancellationToken) -> Result<String> {
        Ok(self
            .categories
            .get_category_by_id(category_id, cancel)
            .map_err(Error::in_operation("get_category_by_id"))?
            .map(|c| c.name)
            .unwrap_or_else(|| {
                warn!(category_id, "Rule references unknown category");
                format!("#{}", category_id)
            }))
    }

    fn with_category(
        &self,
        rule: CategorizationRule,
        cancel: &CancellationToken,
    ) -> Result<RuleWithCategory> {
        let category_name = self.category_name(rule.category_id, cancel)?;
        Ok(RuleWithCategory {
            rule,
            category_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Memory {
        rules: Mutex<Vec<CategorizationRule>>,
        categories: Vec<Category>,
    }

    impl Memory {
        fn with_categories(names: &[&str]) -> Self {
            Self {
                rules: Mutex::new(Vec::new()),
                categories: names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| Category {
                        id: i as i64 + 1,
                        name: n.to_string(),
                    })
                    .collect(),
            }
        }
    }

    impl RuleStore for Memory {
        fn get_active_categorization_rules(
            &self,
            cancel: &CancellationToken,
        ) -> Result<Vec<CategorizationRule>> {
            cancel.check()?;
            let rules = self.rules.lock().unwrap();
            Ok(rules.iter().filter(|r| r.is_active).cloned().collect())
        }

        fn get_categorization_rule_by_id(
            &self,
            id: i64,
            cancel: &CancellationToken,
        ) -> Result<Option<CategorizationRule>> {
            cancel.check()?;
            let rules = self.rules.lock().unwrap();
            Ok(rules.iter().find(|r| r.id == id).cloned())
        }

        fn get_categorization_rules(
            &self,
            offset: u32,
            limit: u32,
            cancel: &CancellationToken,
        ) -> Result<Vec<CategorizationRule>> {
            cancel.check()?;
            let rules = self.rules.lock().unwrap();
            Ok(rules
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        fn create_categorization_rule(
            &self,
            rule: &NewCategorizationRule,
            cancel: &CancellationToken,
        ) -> Result<CategorizationRule> {
            cancel.check()?;
            let mut rules = self.rules.lock().unwrap();
            let now = Utc::now();
            let created = CategorizationRule {
                id: rules.len() as i64 + 1,
                category_id: rule.category_id,
                pattern: rule.pattern.clone(),
                pattern_type: rule.pattern_type,
                priority: rule.priority,
                is_active: rule.is_active,
                created_at: now,
                updated_at: now,
            };
            rules.push(created.clone());
            Ok(created)
        }

        fn update_categorization_rule(
            &self,
            id: i64,
            update: &RuleUpdate,
            cancel: &CancellationToken,
        ) -> Result<Option<CategorizationRule>> {
            cancel.check()?;
            let mut rules = self.rules.lock().unwrap();
            let Some(rule) = rules.iter_mut().find(|r| r.id == id) else {
                return Ok(None);
            };
            if let Some(c) = update.category_id {
                rule.category_id = c;
            }
            if let Some(p) = &update.pattern {
                rule.pattern = p.clone();
            }
            if let Some(t) = update.pattern_type {
                rule.pattern_type = t;
            }
            if let Some(p) = update.priority {
                rule.priority = p;
            }
            if let Some(a) = update.is_active {
                rule.is_active = a;
            }
            rule.updated_at = Utc::now();
            Ok(Some(rule.clone()))
        }

        fn delete_categorization_rule(&self, id: i64, cancel: &CancellationToken) -> Result<bool> {
            cancel.check()?;
            let mut rules = self.rules.lock().unwrap();
            let before = rules.len();
            rules.retain(|r| r.id != id);
            Ok(rules.len() != before)
        }
    }

    impl CategoryStore for Memory {
        fn get_category_by_id(
            &self,
            id: i64,
            cancel: &CancellationToken,
        ) -> Result<Option<Category>> {
            cancel.check()?;
            Ok(self.categories.iter().find(|c| c.id == id).cloned())
        }
    }

    fn admin() -> (RuleAdministration, Arc<PatternCache>) {
        let store = Arc::new(Memory::with_categories(&["Groceries", "Transport"]));
        let cache = Arc::new(PatternCache::new());
        (
            RuleAdministration::new(store.clone(), store, cache.clone()),
            cache,
        )
    }

    #[test]
    fn test_create_and_get() {
        let (admin, _) = admin();
        let cancel = CancellationToken::new();

        let created = admin
            .create(1, "walmart", PatternType::Exact, 10, &cancel)
            .unwrap();
        assert_eq!(created.category_name, "Groceries");
        assert!(created.rule.is_active);

        let fetched = admin.get(created.rule.id, &cancel).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_create_rejects_bad_patterns() {
        let (admin, _) = admin();
        let cancel = CancellationToken::new();

        let err = admin
            .create(1, "   ", PatternType::Keyword, 0, &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = admin
            .create(1, "([unclosed", PatternType::Regex, 0, &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.is_client_error());

        assert!(admin.list(0, 10, &cancel).unwrap().is_empty());
    }

    #[test]
    fn test_create_requires_existing_category() {
        let (admin, _) = admin();
        let err = admin
            .create(99, "uber", PatternType::Exact, 0, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_update_revalidates_merged_pattern() {
        let (admin, _) = admin();
        let cancel = CancellationToken::new();
        let created = admin
            .create(1, "(shell|bp)+", PatternType::Exact, 0, &cancel)
            .unwrap();

        // Switching the type alone re-validates the existing text as a regex
        let ok = admin
            .update(
                created.rule.id,
                &RuleUpdate {
                    pattern_type: Some(PatternType::Regex),
                    ..Default::default()
                },
                &cancel,
            )
            .unwrap();
        assert_eq!(ok.rule.pattern_type, PatternType::Regex);

        let err = admin
            .update(
                created.rule.id,
                &RuleUpdate {
                    pattern: Some("[".into()),
                    ..Default::default()
                },
                &cancel,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(
            admin.get(created.rule.id, &cancel).unwrap().rule.pattern,
            "(shell|bp)+"
        );
    }

    #[test]
    fn test_update_invalidates_cache() {
        let (admin, cache) = admin();
        let cancel = CancellationToken::new();
        let created = admin
            .create(2, "uber", PatternType::Exact, 0, &cancel)
            .unwrap();
        cache.get_or_compile(&created.rule);
        assert!(cache.contains(created.rule.id));

        let updated = admin
            .update(
                created.rule.id,
                &RuleUpdate {
                    pattern: Some("lyft".into()),
                    category_id: Some(1),
                    ..Default::default()
                },
                &cancel,
            )
            .unwrap();

        assert!(!cache.contains(created.rule.id));
        assert_eq!(updated.rule.pattern, "lyft");
        assert_eq!(updated.category_name, "Groceries");
    }

    #[test]
    fn test_update_unknown_rule() {
        let (admin, _) = admin();
        let err = admin
            .update(
                42,
                &RuleUpdate {
                    priority: Some(1),
                    ..Default::default()
                },
                &CancellationToken::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_delete_is_error_on_missing() {
        let (admin, cache) = admin();
        let cancel = CancellationToken::new();
        let created = admin
            .create(1, "costco", PatternType::Exact, 0, &cancel)
            .unwrap();
        cache.get_or_compile(&created.rule);

        admin.delete(created.rule.id, &cancel).unwrap();
        assert!(!cache.contains(created.rule.id));

        let err = admin.delete(created.rule.id, &cancel).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(matches!(
            admin.get(created.rule.id, &cancel).unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_list_paginates_with_names() {
        let (admin, _) = admin();
        let cancel = CancellationToken::new();
        admin.create(1, "a", PatternType::Exact, 0, &cancel).unwrap();
        admin.create(2, "b", PatternType::Exact, 0, &cancel).unwrap();
        admin.create(1, "c", PatternType::Exact, 0, &cancel).unwrap();

        let page = admin.list(1, 5, &cancel).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].category_name, "Transport");
        assert_eq!(page[1].category_name, "Groceries");
    }

    #[test]
    fn test_cancelled_token() {
        let (admin, _) = admin();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = admin
            .create(1, "walmart", PatternType::Exact, 0, &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
