// src/pipeline/cycle.rs

//! One monitoring cycle: load history, fetch, extract, classify, diff,
//! dispatch, persist.
//!
//! `run_cycle` is the error boundary for a cycle. Recoverable source
//! problems come back as `CycleOutcome::SourceUnavailable`; a failed history
//! load or a failed dispatch comes back as `Err`, and in both cases the
//! persisted history is left untouched so the same notices are retried on the
//! next cycle.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Notice, Settings};
use crate::services::alert::compose_alert;
use crate::services::{
    Extractor, Fetcher, HtmlExtractor, HttpFetcher, LogMailer, Mailer, ResendMailer,
};
use crate::storage::{HistoryStore, LocalHistoryStore, merge_history};
use crate::utils::http::create_async_client;

use super::classify::build_notice;
use super::diff::DiffCalculator;

/// Allows at most one cycle to run at a time.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of a cycle; releases the guard on drop.
#[derive(Debug)]
pub struct CyclePermit {
    busy: Arc<AtomicBool>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard, or `None` if a cycle is already running.
    pub fn try_acquire(&self) -> Option<CyclePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CyclePermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for CyclePermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// What a cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle held the guard
    Skipped,
    /// Fetch or extraction failed; treated as zero notices
    SourceUnavailable { reason: String },
    /// Nothing to alert
    NothingNew { scraped: usize, known: usize },
    /// Alert sent
    Alerted {
        scraped: usize,
        new_count: usize,
        message_id: String,
        /// Whether the merged history reached the primary store
        persisted: bool,
    },
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Skipped => write!(f, "skipped (previous cycle still running)"),
            CycleOutcome::SourceUnavailable { reason } => {
                write!(f, "source unavailable, no notices this cycle ({reason})")
            }
            CycleOutcome::NothingNew { scraped, known } => {
                write!(f, "{scraped} notices scraped, {known} already alerted, nothing new")
            }
            CycleOutcome::Alerted {
                scraped,
                new_count,
                message_id,
                persisted,
            } => write!(
                f,
                "{new_count} of {scraped} notices alerted (message {message_id}){}",
                if *persisted { "" } else { ", history NOT saved" }
            ),
        }
    }
}

/// Runs monitoring cycles against a fixed set of collaborators.
#[derive(Clone)]
pub struct Monitor {
    settings: Arc<Settings>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    mailer: Arc<dyn Mailer>,
    store: Arc<dyn HistoryStore>,
    diff: DiffCalculator,
    guard: CycleGuard,
}

impl Monitor {
    pub fn new(
        settings: Arc<Settings>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        let diff = DiffCalculator::with_window(settings.config.history.recency_window());
        Self {
            settings,
            fetcher,
            extractor,
            mailer,
            store,
            diff,
            guard: CycleGuard::new(),
        }
    }

    /// Wire up the HTTP fetcher, HTML extractor, mail transport and local
    /// history store described by `settings`.
    pub fn from_settings(settings: Settings, dry_run: bool) -> Result<Self> {
        let client = create_async_client(&settings.config.source)?;
        let fetcher = Arc::new(HttpFetcher::new(client.clone()));
        let extractor = Arc::new(HtmlExtractor::new(settings.config.extract.clone()));
        let store = Arc::new(LocalHistoryStore::from_config(&settings.config.history));

        let mailer: Arc<dyn Mailer> = if dry_run || settings.config.mail.dry_run {
            log::info!("Dry run: alerts will be logged, not sent");
            Arc::new(LogMailer)
        } else {
            Arc::new(ResendMailer::from_settings(client, &settings))
        };

        Ok(Self::new(
            Arc::new(settings),
            fetcher,
            extractor,
            mailer,
            store,
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch and extract the notice page, classified as of `now`.
    async fn scrape(&self, now: DateTime<Utc>) -> Result<Vec<Notice>> {
        let url = &self.settings.config.source.url;
        let html = self.fetcher.fetch(url).await?;
        let raw = self.extractor.extract(&html, url)?;
        Ok(raw.into_iter().map(|r| build_notice(r, now)).collect())
    }

    /// Run one cycle unless another one is in progress.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            log::warn!("Cycle requested while another is running, skipping");
            return Ok(CycleOutcome::Skipped);
        };

        let history = self.store.load().await?;
        let now = Utc::now();

        let current = match self.scrape(now).await {
            Ok(notices) => notices,
            Err(e) => {
                log::warn!("Could not read notice page: {}", e);
                return Ok(CycleOutcome::SourceUnavailable {
                    reason: e.to_string(),
                });
            }
        };

        let diff = self.diff.calculate(&current, &history, now);
        log::info!(
            "Scraped {} notices: {} new, {} known by id, {} known by recent text",
            current.len(),
            diff.new_notices.len(),
            diff.matched_by_id,
            diff.matched_by_text
        );

        if !diff.has_new() {
            return Ok(CycleOutcome::NothingNew {
                scraped: current.len(),
                known: diff.known_count(),
            });
        }

        for notice in &diff.new_notices {
            log::info!(
                "New [{}{}] p{} {}",
                notice.category,
                if notice.is_urgent { ", urgent" } else { "" },
                notice.priority(),
                notice.text
            );
        }

        let email = compose_alert(&diff.new_notices, &self.settings, now);
        let message_id = self.mailer.send(&email).await?;

        let merged = merge_history(
            &diff.new_notices,
            &history,
            self.settings.config.history.max_entries,
        );
        let persisted = match self.store.save(&merged).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Alert sent but history not saved: {}", e);
                false
            }
        };

        Ok(CycleOutcome::Alerted {
            scraped: current.len(),
            new_count: diff.new_notices.len(),
            message_id,
            persisted,
        })
    }
}
