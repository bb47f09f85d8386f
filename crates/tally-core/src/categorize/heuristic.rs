//! Frequency heuristic over similar historical transactions
//!
//! Not a trained model: the winning category is simply the most frequent one among
//! the transactions the store considers similar, and confidence blends that
//! frequency with how close the amount is to the similar set's average.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::models::{
    AlternativeCategory, CategorizationRequest, CategorizationResponse, CategorizationSource,
    Transaction,
};
use crate::repository::{CategoryStore, TransactionStore};

/// Similarity used when there is nothing to compare against
const NEUTRAL_AMOUNT_SIMILARITY: f64 = 0.5;

/// Category counts among `similar`, most frequent first (ties keep first-seen order)
pub fn rank_categories(similar: &[Transaction]) -> Vec<(i64, usize)> {
    let mut ranked: Vec<(i64, usize)> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for category_id in similar.iter().filter_map(|t| t.category_id) {
        match index.get(&category_id) {
            Some(&i) => ranked[i].1 += 1,
            None => {
                index.insert(category_id, ranked.len());
                ranked.push((category_id, 1));
            }
        }
    }

    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// How close `amount` is to the average of `similar`, in [0, 1]
///
/// Compared on magnitudes since outflows are stored negative.
pub fn amount_similarity(amount: f64, similar: &[Transaction]) -> f64 {
    if similar.is_empty() {
        return NEUTRAL_AMOUNT_SIMILARITY;
    }

    let average = similar.iter().map(|t| t.amount.abs()).sum::<f64>() / similar.len() as f64;
    if !average.is_finite() || average <= f64::EPSILON {
        return NEUTRAL_AMOUNT_SIMILARITY;
    }

    let similarity = 1.0 - (amount.abs() - average).abs() / average;
    if similarity.is_nan() {
        return NEUTRAL_AMOUNT_SIMILARITY;
    }
    similarity.clamp(0.0, 1.0)
}

/// Fallback classifier used when no rule matched confidently
pub struct HeuristicClassifier {
    transactions: Arc<dyn TransactionStore>,
    categories: Arc<dyn CategoryStore>,
    similar_limit: usize,
}

impl HeuristicClassifier {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        categories: Arc<dyn CategoryStore>,
        similar_limit: usize,
    ) -> Self {
        Self {
            transactions,
            categories,
            similar_limit,
        }
    }

    pub fn classify(
        &self,
        request: &CategorizationRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<CategorizationResponse>> {
        let text = request.match_text();
        let similar = self
            .transactions
            .get_similar_transactions(&text, self.similar_limit, cancel)
            .map_err(Error::in_operation("get_similar_transactions"))?;

        let ranked = rank_categories(&similar);
        let Some(&(winner_id, winner_count)) = ranked.first() else {
            debug!(
                similar = similar.len(),
                "No categorized similar transactions for '{}'", text
            );
            return Ok(None);
        };

        let categorized: usize = ranked.iter().map(|(_, count)| count).sum();
        let frequency_confidence = winner_count as f64 / categorized as f64;
        let similarity = amount_similarity(request.amount, &similar);
        let confidence = ((frequency_confidence + similarity) / 2.0).clamp(0.0, 1.0);

        let category = self
            .categories
            .get_category_by_id(winner_id, cancel)
            .map_err(Error::in_operation("get_category_by_id"))?
            .ok_or_else(|| Error::NotFound(format!("category {}", winner_id)))?;

        let mut alternatives = Vec::with_capacity(ranked.len().saturating_sub(1));
        for &(category_id, count) in &ranked[1..] {
            match self
                .categories
                .get_category_by_id(category_id, cancel)
                .map_err(Error::in_operation("get_category_by_id"))?
            {
                Some(alt) => alternatives.push(AlternativeCategory {
                    category_id: alt.id,
                    category_name: alt.name,
                    confidence: count as f64 / categorized as f64,
                }),
                None => warn!(category_id, "Dropping unknown alternative category"),
            }
        }

        debug!(
            category = %category.name,
            frequency_confidence,
            amount_similarity = similarity,
            confidence,
            "Heuristic classified '{}'", text
        );

        Ok(Some(CategorizationResponse {
            category_id: category.id,
            category_name: category.name,
            confidence,
            source: CategorizationSource::Ml,
            matched_pattern: None,
            alternative_categories: alternatives,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    fn tx(id: i64, amount: f64, category_id: Option<i64>) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            description: "STARBUCKS".to_string(),
            merchant: None,
            amount,
            category_id,
        }
    }

    struct Fixture {
        similar: Vec<Transaction>,
    }

    impl TransactionStore for Fixture {
        fn get_similar_transactions(
            &self,
            _text: &str,
            limit: usize,
            cancel: &CancellationToken,
        ) -> Result<Vec<Transaction>> {
            cancel.check()?;
            Ok(self.similar.iter().take(limit).cloned().collect())
        }

        fn get_transactions_by_period(
            &self,
            _user_id: i64,
            _start: NaiveDate,
            _end: NaiveDate,
            _cancel: &CancellationToken,
        ) -> Result<Vec<Transaction>> {
            Ok(Vec::new())
        }
    }

    impl CategoryStore for Fixture {
        fn get_category_by_id(
            &self,
            id: i64,
            _cancel: &CancellationToken,
        ) -> Result<Option<Category>> {
            Ok(match id {
                1 => Some(Category { id, name: "Dining".into() }),
                2 => Some(Category { id, name: "Groceries".into() }),
                _ => None,
            })
        }
    }

    fn classifier(similar: Vec<Transaction>) -> HeuristicClassifier {
        let fixture = Arc::new(Fixture { similar });
        HeuristicClassifier::new(fixture.clone(), fixture, 10)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rank_categories_counts_and_ties() {
        let similar = vec![
            tx(1, -5.0, Some(2)),
            tx(2, -5.0, Some(1)),
            tx(3, -5.0, None),
            tx(4, -5.0, Some(1)),
            tx(5, -5.0, Some(2)),
            tx(6, -5.0, Some(3)),
        ];
        // 2 and 1 tie at two each; 2 was seen first
        assert_eq!(rank_categories(&similar), vec![(2, 2), (1, 2), (3, 1)]);
        assert!(rank_categories(&[tx(1, -5.0, None)]).is_empty());
    }

    #[test]
    fn test_amount_similarity() {
        assert!(approx(amount_similarity(10.0, &[]), 0.5));

        let similar = vec![tx(1, -10.0, None), tx(2, -30.0, None)];
        // average magnitude 20
        assert!(approx(amount_similarity(20.0, &similar), 1.0));
        assert!(approx(amount_similarity(-15.0, &similar), 0.75));
        assert!(approx(amount_similarity(100.0, &similar), 0.0));

        let zeros = vec![tx(1, 0.0, None)];
        assert!(approx(amount_similarity(5.0, &zeros), 0.5));
    }

    #[test]
    fn test_amount_similarity_stays_in_range_for_non_finite_amounts() {
        let similar = vec![tx(1, -10.0, None), tx(2, -30.0, None)];
        assert!(approx(amount_similarity(f64::NAN, &similar), 0.5));
        assert!(approx(amount_similarity(f64::INFINITY, &similar), 0.0));

        // Average overflows to inf
        let huge = vec![tx(1, f64::MAX, None), tx(2, f64::MAX, None)];
        assert!(approx(amount_similarity(5.0, &huge), 0.5));
    }

    #[test]
    fn test_classify_blends_frequency_and_amount() {
        let similar = vec![
            tx(1, -5.0, Some(1)),
            tx(2, -5.0, Some(1)),
            tx(3, -5.0, Some(1)),
            tx(4, -5.0, Some(2)),
        ];
        let request = CategorizationRequest::new("starbucks", -5.0);

        let resp = classifier(similar)
            .classify(&request, &CancellationToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(resp.category_name, "Dining");
        assert_eq!(resp.source, CategorizationSource::Ml);
        // frequency 3/4, amount similarity 1.0
        assert!(approx(resp.confidence, 0.875));
        assert!(resp.matched_pattern.is_none());
        assert_eq!(resp.alternative_categories.len(), 1);
        assert_eq!(resp.alternative_categories[0].category_name, "Groceries");
        assert!(approx(resp.alternative_categories[0].confidence, 0.25));
    }

    #[test]
    fn test_uncategorized_history_yields_nothing() {
        let similar = vec![tx(1, -5.0, None), tx(2, -7.0, None)];
        let request = CategorizationRequest::new("starbucks", -5.0);
        let resp = classifier(similar)
            .classify(&request, &CancellationToken::new())
            .unwrap();
        assert!(resp.is_none());

        let resp = classifier(Vec::new())
            .classify(&request, &CancellationToken::new())
            .unwrap();
        assert!(resp.is_none());
    }

    #[test]
    fn test_confidence_within_bounds() {
        let similar = vec![tx(1, -1.0, Some(1)), tx(2, -1_000_000.0, Some(2))];
        for amount in [-1e12, -3.0, 0.0, 0.5, 42.0, 1e12] {
            let resp = classifier(similar.clone())
                .classify(&CategorizationRequest::new("x", amount), &CancellationToken::new())
                .unwrap()
                .unwrap();
            assert!((0.0..=1.0).contains(&resp.confidence));
        }
    }

    #[test]
    fn test_cancelled_token_propagates() {
        let token = CancellationToken::new();
        token.cancel();
        let err = classifier(vec![tx(1, -5.0, Some(1))])
            .classify(&CategorizationRequest::new("x", 1.0), &token)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
