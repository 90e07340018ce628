//! Short identity tokens for notices.
//!
//! The discovery instant is part of the input, so the same notice scraped on
//! two different cycles gets two different ids. Cross-cycle dedup therefore
//! relies on the text + recency check in [`super::diff`], not on ids alone.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 16;

/// Derive the id of a notice from its text and the instant it was scraped.
///
/// Identical texts in the same batch share a discovery instant and so share
/// an id.
pub fn fingerprint(text: &str, discovered_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"|");
    hasher.update(
        discovered_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .as_bytes(),
    );
    let mut id = hex::encode(hasher.finalize());
    id.truncate(FINGERPRINT_LEN);
    id
}
