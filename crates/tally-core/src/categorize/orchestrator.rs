//! Categorization pipeline
//!
//! Order: confident rule match → heuristic classifier → "Uncategorized".
//! A rule match at or below the confidence threshold is dropped in favour of the
//! heuristic, even when the heuristic ends up weaker.

use std::sync::Arc;

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::models::{CategorizationRequest, CategorizationResponse};
use crate::repository::RuleStore;

use super::heuristic::HeuristicClassifier;
use super::matcher::RuleMatcher;

/// Default threshold a rule match must exceed to be accepted
pub const DEFAULT_RULE_CONFIDENCE_THRESHOLD: f64 = 0.8;

pub struct CategorizationOrchestrator {
    rules: Arc<dyn RuleStore>,
    matcher: RuleMatcher,
    classifier: HeuristicClassifier,
    rule_confidence_threshold: f64,
}

impl CategorizationOrchestrator {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        matcher: RuleMatcher,
        classifier: HeuristicClassifier,
    ) -> Self {
        Self {
            rules,
            matcher,
            classifier,
            rule_confidence_threshold: DEFAULT_RULE_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_rule_confidence_threshold(mut self, threshold: f64) -> Self {
        self.rule_confidence_threshold = threshold;
        self
    }

    /// Categorize a request. Never fails for "nothing matched".
    pub fn categorize(
        &self,
        request: &CategorizationRequest,
        cancel: &CancellationToken,
    ) -> Result<CategorizationResponse> {
        // 1. Rules, re-read on every call
        let rules = self
            .rules
            .get_active_categorization_rules(cancel)
            .map_err(Error::in_operation("get_active_categorization_rules"))?;

        match self.matcher.match_rules(&rules, request, cancel)? {
            Some(resp) if resp.confidence > self.rule_confidence_threshold => {
                return Ok(resp);
            }
            Some(weak) => debug!(
                confidence = weak.confidence,
                pattern = weak.matched_pattern.as_deref().unwrap_or_default(),
                "Rule match below threshold, trying heuristic"
            ),
            None => debug!("No rule matched '{}'", request.description),
        }

        // 2. Heuristic over similar history
        if let Some(resp) = self.classifier.classify(request, cancel)? {
            return Ok(resp);
        }

        // 3. Nothing found
        debug!("Falling back to Uncategorized for '{}'", request.description);
        Ok(CategorizationResponse::uncategorized())
    }
}
