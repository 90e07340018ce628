//! Storage abstractions for the alert history.
//!
//! The history is a newest-first list of every notice that has been
//! emailed. It is read once at the start of a cycle and written once after a
//! successful dispatch.
//!
//! ## File Layout
//!
//! ```text
//! data/
//! ├── history.json          # Primary: JSON array of notices
//! └── history.backup.json   # Backup copy written on every save
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Notice;

// Re-export for convenience
pub use local::LocalHistoryStore;

/// Trait for history storage backends.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the persisted history. No prior state is an empty history.
    async fn load(&self) -> Result<Vec<Notice>>;

    /// Replace the persisted history with `notices`.
    async fn save(&self, notices: &[Notice]) -> Result<()>;
}

/// Prepend freshly alerted notices to the prior history, keeping at most
/// `max_entries` when a bound is configured.
pub fn merge_history(
    new_notices: &[Notice],
    prior: &[Notice],
    max_entries: Option<usize>,
) -> Vec<Notice> {
    let mut merged = Vec::with_capacity(new_notices.len() + prior.len());
    merged.extend_from_slice(new_notices);
    merged.extend_from_slice(prior);
    if let Some(max) = max_entries {
        merged.truncate(max);
    }
    merged
}
