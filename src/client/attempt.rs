//! Per-query retry state.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::resilience::retries::RetryBudget;

/// Book-keeping for one logical query across its attempts.
#[derive(Debug)]
pub struct RequestAttempt {
    query_id: Uuid,
    tried: Vec<String>,
    excluded: HashSet<String>,
    budget: RetryBudget,
    max_retries: u32,
    started: Instant,
}

impl RequestAttempt {
    pub fn new(max_retries: u32) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            tried: Vec::new(),
            excluded: HashSet::new(),
            budget: RetryBudget::new(max_retries),
            max_retries,
            started: Instant::now(),
        }
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Servers attempted so far, in order.
    pub fn tried(&self) -> &[String] {
        &self.tried
    }

    /// Servers that must not be selected again for this query.
    pub fn excluded(&self) -> &HashSet<String> {
        &self.excluded
    }

    pub fn record_try(&mut self, address: &str) {
        self.tried.push(address.to_string());
    }

    /// Exclude `address` and spend one retry. Returns `false` when the
    /// budget is exhausted and the query must fail.
    pub fn fail_over(&mut self, address: &str) -> bool {
        self.excluded.insert(address.to_string());
        self.budget.try_spend()
    }

    pub fn retries_left(&self) -> u32 {
        self.budget.remaining()
    }

    pub fn retries_used(&self) -> u32 {
        self.max_retries - self.budget.remaining()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_over_spends_budget() {
        let mut attempt = RequestAttempt::new(1);
        attempt.record_try("http://a");
        assert!(attempt.fail_over("http://a"));
        assert_eq!(attempt.retries_used(), 1);
        assert_eq!(attempt.retries_left(), 0);

        attempt.record_try("http://b");
        assert!(!attempt.fail_over("http://b"));
        assert_eq!(attempt.tried(), ["http://a".to_string(), "http://b".to_string()]);
        assert!(attempt.excluded().contains("http://a"));
        assert!(attempt.excluded().contains("http://b"));
    }

    #[test]
    fn test_query_ids_are_unique() {
        assert_ne!(RequestAttempt::new(0).query_id(), RequestAttempt::new(0).query_id());
    }
}
