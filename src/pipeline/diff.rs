//! Diff calculation between a fresh scrape and the alert history.
//!
//! A current notice is already known when some history entry either has the
//! same id, or has the same text and was stamped inside the recency window
//! (measured back from "now", not from the current notice). Text that comes
//! back after the window has passed is alerted again.

use chrono::{DateTime, Duration, Utc};

use crate::models::Notice;

/// Default recency window for text matches.
pub const DEFAULT_RECENCY_WINDOW_HOURS: i64 = 24;

/// Outcome of a diff run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    /// Notices not alerted before, in scrape order
    pub new_notices: Vec<Notice>,
    /// Current notices suppressed by an id match
    pub matched_by_id: usize,
    /// Current notices suppressed by a recent text match
    pub matched_by_text: usize,
}

impl DiffResult {
    /// Check if there is anything to alert.
    pub fn has_new(&self) -> bool {
        !self.new_notices.is_empty()
    }

    /// Number of current notices that were already known.
    pub fn known_count(&self) -> usize {
        self.matched_by_id + self.matched_by_text
    }
}

/// Calculator for finding notices that still need an alert.
#[derive(Debug, Clone)]
pub struct DiffCalculator {
    recency_window: Duration,
}

impl Default for DiffCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffCalculator {
    /// Create a diff calculator with the default 24 hour window.
    pub fn new() -> Self {
        Self::with_window(Duration::hours(DEFAULT_RECENCY_WINDOW_HOURS))
    }

    /// Create a diff calculator with a custom recency window.
    pub fn with_window(recency_window: Duration) -> Self {
        Self { recency_window }
    }

    /// Diff `current` against `history` as of `now`.
    pub fn calculate(
        &self,
        current: &[Notice],
        history: &[Notice],
        now: DateTime<Utc>,
    ) -> DiffResult {
        let mut result = DiffResult::default();

        for notice in current {
            if history.iter().any(|h| h.id == notice.id) {
                result.matched_by_id += 1;
            } else if history
                .iter()
                .any(|h| h.text == notice.text && self.is_recent(h, now))
            {
                result.matched_by_text += 1;
            } else {
                result.new_notices.push(notice.clone());
            }
        }

        result
    }

    /// Entries stamped in the future count as recent.
    fn is_recent(&self, entry: &Notice, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.timestamp) <= self.recency_window
    }
}

/// Convenience function: notices in `current` that need an alert right now.
pub fn calculate_diff(current: &[Notice], history: &[Notice]) -> Vec<Notice> {
    DiffCalculator::new()
        .calculate(current, history, Utc::now())
        .new_notices
}
