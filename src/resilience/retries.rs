//! Retry classification.
//!
//! # Responsibilities
//! - Decide whether a failed attempt may be retried against another server
//! - Track the per-query retry budget
//!
//! Transport failures are evidence against the server, so another replica
//! may succeed. Remote, transform and other failures are evidence against the
//! query (or the caller), so retrying elsewhere would only repeat them.

use crate::error::ExecuteError;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Exclude the server and select another one, budget permitting.
    RetryElsewhere,
    /// Surface the error now.
    Fail,
}

/// Classify a failed attempt.
pub fn classify(error: &ExecuteError) -> Disposition {
    if error.is_retryable() {
        Disposition::RetryElsewhere
    } else {
        Disposition::Fail
    }
}

/// Retries left for one query. Only transport failures spend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl RetryBudget {
    pub fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Spend one retry. Returns `false` when the budget was already empty.
    pub fn try_spend(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
