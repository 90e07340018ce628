//! Notice data structures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::classify;

/// Closed set of notice categories, in the order the classifier tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Exam,
    Assignment,
    Schedule,
    Announcement,
    Deadline,
    Other,
}

impl Category {
    /// Upper-case label used in storage and in alert emails.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Exam => "EXAM",
            Category::Assignment => "ASSIGNMENT",
            Category::Schedule => "SCHEDULE",
            Category::Announcement => "ANNOUNCEMENT",
            Category::Deadline => "DEADLINE",
            Category::Other => "OTHER",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Script of a notice's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Gujarati,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Gujarati => "gujarati",
            Language::English => "english",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A list item as it came off the notice page, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotice {
    /// Whitespace-normalized item text
    pub text: String,

    /// Absolute URL of the first link in the item
    pub link: Option<String>,

    /// Whether the page flagged the item as new
    pub page_marked_new: bool,
}

/// A classified notice.
///
/// Built fresh on every cycle; only the ones that were alerted end up in
/// the persisted history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Fingerprint of the text and the discovery instant
    pub id: String,

    /// Display text
    pub text: String,

    /// Absolute URL, `None` when the item had no link
    pub link: Option<String>,

    /// Page-side "new" marker
    pub is_new: bool,

    /// Urgency keyword hit
    pub is_urgent: bool,

    pub category: Category,

    /// When the scrape that produced this record ran
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    /// Priority score in `0..=5`.
    pub fn priority(&self) -> u8 {
        classify::priority_score(self.is_urgent, self.is_new, self.category, &self.text)
    }

    /// Script of the notice text.
    pub fn language(&self) -> Language {
        classify::detect_language(&self.text)
    }
}
