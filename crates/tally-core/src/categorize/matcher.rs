//! Deterministic rule matching
//!
//! Rules are resolved once into a [`RulePattern`] and cached by rule id. Matching
//! walks the active rules by priority (highest first, ties in storage order) and
//! stops at the first hit.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::models::{
    CategorizationRequest, CategorizationResponse, CategorizationRule, CategorizationSource,
    PatternType,
};
use crate::repository::CategoryStore;

/// Confidence bonus applies to amounts strictly between 0 and this
const SMALL_AMOUNT_LIMIT: f64 = 1000.0;
const SMALL_AMOUNT_BONUS: f64 = 0.05;

/// Base confidence for a rule match of the given type
fn base_confidence(pattern_type: PatternType) -> f64 {
    match pattern_type {
        PatternType::Exact => 0.9,
        PatternType::Keyword => 0.85,
        PatternType::Regex => 0.8,
    }
}

/// Confidence of a rule match: base by pattern type, small-amount bonus, capped at 1.0
pub fn rule_confidence(pattern_type: PatternType, amount: f64) -> f64 {
    let mut confidence = base_confidence(pattern_type);
    if amount > 0.0 && amount < SMALL_AMOUNT_LIMIT {
        confidence += SMALL_AMOUNT_BONUS;
    }
    confidence.min(1.0)
}

/// A rule pattern resolved for matching against lower-cased text
#[derive(Debug, Clone)]
pub enum RulePattern {
    /// Lower-cased substring
    Exact(String),
    /// Lower-cased keywords, all required
    Keyword(Vec<String>),
    /// Case-insensitive regex
    Regex(Regex),
}

impl RulePattern {
    /// Resolve a stored pattern. Only regex patterns can fail.
    pub fn compile(
        pattern_type: PatternType,
        pattern: &str,
    ) -> std::result::Result<Self, regex::Error> {
        Ok(match pattern_type {
            PatternType::Exact => Self::Exact(pattern.to_lowercase()),
            PatternType::Keyword => Self::Keyword(
                pattern
                    .split_whitespace()
                    .map(|k| k.to_lowercase())
                    .collect(),
            ),
            PatternType::Regex => Self::Regex(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()?,
            ),
        })
    }

    /// Match against text produced by [`crate::models::normalized_text`]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Exact(needle) => text.contains(needle.as_str()),
            Self::Keyword(keywords) => keywords.iter().all(|k| text.contains(k.as_str())),
            Self::Regex(re) => re.is_match(text),
        }
    }
}

/// Validate a pattern before it is persisted
///
/// Exact and keyword patterns must not be blank; regex patterns must compile.
pub fn validate_pattern(pattern_type: PatternType, pattern: &str) -> Result<RulePattern> {
    match pattern_type {
        PatternType::Exact | PatternType::Keyword if pattern.trim().is_empty() => {
            Err(Error::Validation(format!(
                "{} pattern must not be empty",
                pattern_type
            )))
        }
        _ => RulePattern::compile(pattern_type, pattern)
            .map_err(|e| Error::Validation(format!("invalid regex '{}': {}", pattern, e))),
    }
}

#[derive(Debug)]
struct CachedPattern {
    pattern: String,
    pattern_type: PatternType,
    /// `None` when the pattern failed to compile (rule is skipped)
    compiled: Option<Arc<RulePattern>>,
}

/// Compiled patterns keyed by rule id
///
/// An entry is rebuilt when the rule's pattern text or type no longer matches what
/// it was compiled from. Rule administration invalidates entries on update/delete.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: RwLock<HashMap<i64, CachedPattern>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled pattern for `rule`, or `None` if it cannot be compiled
    pub fn get_or_compile(&self, rule: &CategorizationRule) -> Option<Arc<RulePattern>> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = entries.get(&rule.id) {
                if entry.pattern == rule.pattern && entry.pattern_type == rule.pattern_type {
                    return entry.compiled.clone();
                }
            }
        }

        let compiled = match RulePattern::compile(rule.pattern_type, &rule.pattern) {
            Ok(p) => Some(Arc::new(p)),
            Err(e) => {
                warn!(
                    rule_id = rule.id,
                    pattern = %rule.pattern,
                    error = %e,
                    "Skipping rule with invalid regex"
                );
                None
            }
        };

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                rule.id,
                CachedPattern {
                    pattern: rule.pattern.clone(),
                    pattern_type: rule.pattern_type,
                    compiled: compiled.clone(),
                },
            );

        compiled
    }

    pub fn invalidate(&self, rule_id: i64) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&rule_id);
    }

    pub fn contains(&self, rule_id: i64) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&rule_id)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evaluates categorization rules against a request
pub struct RuleMatcher {
    categories: Arc<dyn CategoryStore>,
    cache: Arc<PatternCache>,
}

impl RuleMatcher {
    pub fn new(categories: Arc<dyn CategoryStore>, cache: Arc<PatternCache>) -> Self {
        Self { categories, cache }
    }

    /// First active rule (by priority) matching the request, if any
    pub fn match_rules(
        &self,
        rules: &[CategorizationRule],
        request: &CategorizationRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<CategorizationResponse>> {
        let Some(rule) = self.find_match(rules, &request.match_text()) else {
            return Ok(None);
        };

        let category = self
            .categories
            .get_category_by_id(rule.category_id, cancel)
            .map_err(Error::in_operation("get_category_by_id"))?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "category {} for rule {}",
                    rule.category_id, rule.id
                ))
            })?;

        let confidence = rule_confidence(rule.pattern_type, request.amount);
        debug!(
            rule_id = rule.id,
            category = %category.name,
            confidence,
            "Rule matched"
        );

        Ok(Some(CategorizationResponse {
            category_id: category.id,
            category_name: category.name,
            confidence,
            source: CategorizationSource::Rule,
            matched_pattern: Some(rule.pattern.clone()),
            alternative_categories: Vec::new(),
        }))
    }

    /// Highest-priority active rule whose pattern matches `text`
    pub fn find_match<'r>(
        &self,
        rules: &'r [CategorizationRule],
        text: &str,
    ) -> Option<&'r CategorizationRule> {
        let mut active: Vec<&CategorizationRule> = rules.iter().filter(|r| r.is_active).collect();
        // Stable: equal priorities keep storage order
        active.sort_by(|a, b| b.priority.cmp(&a.priority));

        active.into_iter().find(|rule| {
            self.cache
                .get_or_compile(rule)
                .is_some_and(|pattern| pattern.matches(text))
        })
    }
}
