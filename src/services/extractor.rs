// src/services/extractor.rs

//! Notice extraction from page HTML.
//!
//! Each element matching the item selector becomes one raw notice. Only text
//! nodes contribute to the notice text, so embedded images drop out; the
//! page's "new" badge image is detected separately through the marker
//! selector.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ExtractConfig, RawNotice};
use crate::utils::{normalize_whitespace, resolve_url};

/// Parser turning notice page HTML into raw notice records.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, page_url: &str) -> Result<Vec<RawNotice>>;
}

/// CSS selector based extractor.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    config: ExtractConfig,
}

impl HtmlExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }

    fn parse_item(
        item: &ElementRef,
        link_sel: &Selector,
        new_sel: &Selector,
        base_url: &Url,
    ) -> Option<RawNotice> {
        let text = normalize_whitespace(&item.text().collect::<String>());
        if text.is_empty() {
            return None;
        }

        let link = item
            .select(link_sel)
            .find_map(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty() && !href.starts_with('#'))
            .map(|href| resolve_url(base_url, href));

        let page_marked_new = item.select(new_sel).next().is_some();

        Some(RawNotice {
            text,
            link,
            page_marked_new,
        })
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, html: &str, page_url: &str) -> Result<Vec<RawNotice>> {
        let base_url = Url::parse(page_url)?;
        let item_sel = Self::parse_selector(&self.config.item_selector)?;
        let link_sel = Self::parse_selector(&self.config.link_selector)?;
        let new_sel = Self::parse_selector(&self.config.new_marker_selector)?;

        let document = Html::parse_document(html);
        let notices: Vec<RawNotice> = document
            .select(&item_sel)
            .filter_map(|item| Self::parse_item(&item, &link_sel, &new_sel, &base_url))
            .collect();

        log::debug!("Extracted {} notices from {}", notices.len(), page_url);
        Ok(notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body>
          <ul class="notices">
            <li>
              <a href="circulars/exam-form.pdf">Exam form
                 submission   schedule</a>
              <img src="/images/new.gif" alt="new">
            </li>
            <li><a href="https://cdn.example.org/fees.pdf">Fee notice</a></li>
            <li>Library closed on Friday</li>
            <li>   </li>
            <li><img src="/images/bullet.png"> <a href="#">સૂચના</a></li>
          </ul>
        </body></html>
    "##;

    fn extractor() -> HtmlExtractor {
        HtmlExtractor::new(ExtractConfig::default())
    }

    #[test]
    fn test_extracts_items_in_page_order() {
        let notices = extractor()
            .extract(PAGE, "https://example.edu/notices/index.html")
            .unwrap();

        let texts: Vec<_> = notices.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Exam form submission schedule",
                "Fee notice",
                "Library closed on Friday",
                "સૂચના",
            ]
        );
    }

    #[test]
    fn test_links_are_absolute_or_none() {
        let notices = extractor()
            .extract(PAGE, "https://example.edu/notices/index.html")
            .unwrap();

        assert_eq!(
            notices[0].link.as_deref(),
            Some("https://example.edu/notices/circulars/exam-form.pdf")
        );
        assert_eq!(
            notices[1].link.as_deref(),
            Some("https://cdn.example.org/fees.pdf")
        );
        assert_eq!(notices[2].link, None);
        // Fragment-only anchors are not links
        assert_eq!(notices[3].link, None);
    }

    #[test]
    fn test_new_marker_detection() {
        let notices = extractor()
            .extract(PAGE, "https://example.edu/notices/index.html")
            .unwrap();

        assert!(notices[0].page_marked_new);
        assert!(!notices[1].page_marked_new);
        assert!(!notices[3].page_marked_new);
    }

    #[test]
    fn test_custom_item_selector() {
        let config = ExtractConfig {
            item_selector: "table.circulars tr".to_string(),
            ..ExtractConfig::default()
        };
        let html = r#"
            <table class="circulars">
              <tr><td><a href="/a.pdf">Timetable</a></td></tr>
              <tr><td>Holiday list</td></tr>
            </table>
            <ul><li>Navigation</li></ul>
        "#;
        let notices = HtmlExtractor::new(config)
            .extract(html, "https://example.edu/")
            .unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].link.as_deref(), Some("https://example.edu/a.pdf"));
    }

    #[test]
    fn test_invalid_page_url_is_error() {
        assert!(extractor().extract(PAGE, "not a url").is_err());
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        let notices = extractor()
            .extract("<html></html>", "https://example.edu/")
            .unwrap();
        assert!(notices.is_empty());
    }
}
