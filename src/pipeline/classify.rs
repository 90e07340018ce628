//! Keyword classification of notice text.
//!
//! All matching is a case-insensitive substring search over the raw text:
//! no stemming and no word boundaries, so "test" also fires inside
//! "latest". Categories are tried in a fixed order and the first hit wins.

use chrono::{DateTime, Utc};

use crate::models::{Category, Language, Notice, RawNotice};

use super::fingerprint::fingerprint;

/// Highest possible priority score.
pub const MAX_PRIORITY: u8 = 5;

const URGENT_KEYWORDS: &[&str] = &[
    "urgent",
    "important",
    "immediate",
    "mandatory",
    "compulsory",
    "last date",
    "deadline",
    "tomorrow",
    "today",
    "તાત્કાલિક",
    "મહત્વપૂર્ણ",
    "અગત્ય",
    "ફરજિયાત",
    "છેલ્લી તારીખ",
    "આવતીકાલે",
    "આજે",
];

/// Category keyword sets in match order.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Exam,
        &["exam", "test", "quiz", "viva", "mid-sem", "પરીક્ષા", "ટેસ્ટ"],
    ),
    (
        Category::Assignment,
        &[
            "assignment",
            "homework",
            "submission",
            "project",
            "practical",
            "સોંપણી",
            "અસાઇનમેન્ટ",
            "પ્રોજેક્ટ",
        ],
    ),
    (
        Category::Schedule,
        &[
            "schedule",
            "timetable",
            "time table",
            "time-table",
            "calendar",
            "postponed",
            "સમયપત્રક",
            "કાર્યક્રમ",
        ],
    ),
    (
        Category::Announcement,
        &[
            "announce",
            "notice",
            "circular",
            "notification",
            "જાહેરાત",
            "સૂચના",
            "પરિપત્ર",
        ],
    ),
    (
        Category::Deadline,
        &[
            "deadline",
            "last date",
            "due date",
            "extended",
            "છેલ્લી તારીખ",
            "અંતિમ તારીખ",
        ],
    ),
];

/// Classifier output for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_urgent: bool,
    pub category: Category,
    pub priority: u8,
}

/// Classify notice text. `is_new` is the page-side marker, which only feeds
/// the priority score.
pub fn classify(text: &str, is_new: bool) -> Classification {
    let is_urgent = is_urgent(text);
    let category = categorize(text);
    Classification {
        is_urgent,
        category,
        priority: priority_score(is_urgent, is_new, category, text),
    }
}

/// Any urgency keyword present.
pub fn is_urgent(text: &str) -> bool {
    let lower = text.to_lowercase();
    URGENT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// First matching category, `Other` when nothing matches.
pub fn categorize(text: &str) -> Category {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Gujarati when any character falls in the Gujarati block.
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|c| ('\u{0A80}'..='\u{0AFF}').contains(&c)) {
        Language::Gujarati
    } else {
        Language::English
    }
}

/// Additive score capped at [`MAX_PRIORITY`]:
/// +2 urgent, +1 page-marked new, +1 deadline, +1 literal "important".
pub fn priority_score(is_urgent: bool, is_new: bool, category: Category, text: &str) -> u8 {
    let mut score = 0u8;
    if is_urgent {
        score += 2;
    }
    if is_new {
        score += 1;
    }
    if category == Category::Deadline {
        score += 1;
    }
    if text.to_lowercase().contains("important") {
        score += 1;
    }
    score.min(MAX_PRIORITY)
}

/// Turn a raw page item into a classified notice discovered at `discovered_at`.
pub fn build_notice(raw: RawNotice, discovered_at: DateTime<Utc>) -> Notice {
    let Classification {
        is_urgent,
        category,
        ..
    } = classify(&raw.text, raw.page_marked_new);

    Notice {
        id: fingerprint(&raw.text, discovered_at),
        text: raw.text,
        link: raw.link,
        is_new: raw.page_marked_new,
        is_urgent,
        category,
        timestamp: discovered_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_checked_before_schedule() {
        let c = classify("Final exam schedule announced", false);
        assert_eq!(c.category, Category::Exam);
        assert!(!c.is_urgent);
        assert_eq!(c.priority, 0);
    }

    #[test]
    fn test_urgent_assignment_before_deadline() {
        let c = classify("URGENT: last date for assignment submission is tomorrow", false);
        assert!(c.is_urgent);
        assert_eq!(c.category, Category::Assignment);
        assert_eq!(c.priority, 2);
    }

    #[test]
    fn test_substring_matches_count() {
        // "mandatory" inside a longer word still marks urgency
        assert!(is_urgent("Non-mandatoryworkshop registration"));
        // "test" inside "latest"
        assert_eq!(categorize("Latest updates from the library"), Category::Exam);
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_urgent("IMMEDIATE action required"));
        assert_eq!(categorize("REVISED TIMETABLE"), Category::Schedule);
    }

    #[test]
    fn test_fallback_other() {
        assert_eq!(categorize("Sports week photos uploaded"), Category::Other);
        assert!(!is_urgent("Sports week photos uploaded"));
    }

    #[test]
    fn test_deadline_category() {
        let c = classify("Fee payment due date extended", true);
        assert_eq!(c.category, Category::Deadline);
        assert!(!c.is_urgent);
        // new + deadline
        assert_eq!(c.priority, 2);
    }

    #[test]
    fn test_gujarati_keywords() {
        let c = classify("પરીક્ષા ફોર્મ ભરવાની છેલ્લી તારીખ", false);
        assert!(c.is_urgent);
        assert_eq!(c.category, Category::Exam);
        assert_eq!(detect_language("પરીક્ષા ફોર્મ"), Language::Gujarati);
        assert_eq!(detect_language("Exam form (પરીક્ષા)"), Language::Gujarati);
        assert_eq!(detect_language("Exam form"), Language::English);
    }

    #[test]
    fn test_classification_is_pure() {
        let text = "Important: mandatory seminar tomorrow";
        assert_eq!(classify(text, true), classify(&text.to_string(), true));
    }

    #[test]
    fn test_priority_saturates() {
        assert_eq!(
            priority_score(true, true, Category::Deadline, "IMPORTANT deadline"),
            MAX_PRIORITY
        );
    }

    #[test]
    fn test_priority_monotonic_in_each_flag() {
        let categories = [Category::Other, Category::Deadline];
        let texts = ["plain", "important"];
        for urgent in [false, true] {
            for new in [false, true] {
                for category in categories {
                    for text in texts {
                        let base = priority_score(urgent, new, category, text);
                        assert!(base <= MAX_PRIORITY);
                        assert!(priority_score(true, new, category, text) >= base);
                        assert!(priority_score(urgent, true, category, text) >= base);
                        assert!(priority_score(urgent, new, Category::Deadline, text) >= base);
                        assert!(priority_score(urgent, new, category, "important") >= base);
                    }
                }
            }
        }
    }

    #[test]
    fn test_build_notice_carries_fields() {
        let at = Utc::now();
        let raw = RawNotice {
            text: "Important circular".to_string(),
            link: Some("https://example.edu/c/1.pdf".to_string()),
            page_marked_new: true,
        };
        let notice = build_notice(raw, at);
        assert_eq!(notice.id, fingerprint("Important circular", at));
        assert_eq!(notice.timestamp, at);
        assert!(notice.is_new);
        assert!(notice.is_urgent);
        assert_eq!(notice.category, Category::Announcement);
        // 2 urgent + 1 new + 1 important
        assert_eq!(notice.priority(), 4);
    }
}
