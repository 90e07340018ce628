//! Notice processing pipeline.
//!
//! - `fingerprint`: short identity for a scraped notice
//! - `classify`: urgency, category, language and priority
//! - `diff`: which notices still need an alert
//! - `cycle`: one full fetch → alert → persist pass

pub mod classify;
pub mod cycle;
pub mod diff;
pub mod fingerprint;

pub use classify::{Classification, build_notice, classify};
pub use cycle::{CycleGuard, CycleOutcome, Monitor};
pub use diff::{DiffCalculator, DiffResult, calculate_diff};
pub use fingerprint::fingerprint;
