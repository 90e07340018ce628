//! Service layer for the notice watcher.
//!
//! - Page fetching (`HttpFetcher`)
//! - Notice extraction (`HtmlExtractor`)
//! - Alert composition (`alert`)
//! - Email delivery (`ResendMailer`, `LogMailer`)

pub mod alert;
mod extractor;
mod fetcher;
mod mailer;

pub use extractor::{Extractor, HtmlExtractor};
pub use fetcher::{Fetcher, HttpFetcher};
pub use mailer::{EmailMessage, LogMailer, Mailer, ResendMailer};
