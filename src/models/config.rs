//! Application configuration structures.
//!
//! Tunables come from a TOML file; the recipient address and the mail
//! provider credential come from the environment and are checked once at
//! startup.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable holding the alert recipient.
pub const ENV_NOTIFY_EMAIL: &str = "NOTIFY_EMAIL";
/// Environment variable holding the mail provider API key.
pub const ENV_API_KEY: &str = "RESEND_API_KEY";
/// Optional override for `source.url`.
pub const ENV_NOTICE_URL: &str = "NOTICE_URL";
/// Optional override for `mail.from`.
pub const ENV_MAIL_FROM: &str = "MAIL_FROM";
/// Optional override for `mail.reply_to`.
pub const ENV_MAIL_REPLY_TO: &str = "MAIL_REPLY_TO";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Notice page and HTTP behavior
    #[serde(default)]
    pub source: SourceConfig,

    /// Selectors used to pull notices out of the page
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Cycle timing
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// History file locations and dedup window
    #[serde(default)]
    pub history: HistoryConfig,

    /// Sender details for alert emails
    #[serde(default)]
    pub mail: MailConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply the optional environment overrides.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(lookup(ENV_NOTICE_URL)) {
            self.source.url = url;
        }
        if let Some(from) = non_empty(lookup(ENV_MAIL_FROM)) {
            self.mail.from = from;
        }
        if let Some(reply_to) = non_empty(lookup(ENV_MAIL_REPLY_TO)) {
            self.mail.reply_to = Some(reply_to);
        }
        self
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(AppError::config(format!(
                "source.url is empty (set it in the config file or via {ENV_NOTICE_URL})"
            )));
        }
        url::Url::parse(&self.source.url)
            .map_err(|e| AppError::config(format!("source.url is not a valid URL: {e}")))?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::config("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::config("source.timeout_secs must be > 0"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::config("schedule.interval_secs must be > 0"));
        }
        if self.history.recency_window_hours == 0 {
            return Err(AppError::config("history.recency_window_hours must be > 0"));
        }
        if self.history.max_entries == Some(0) {
            return Err(AppError::config("history.max_entries must be > 0 when set"));
        }
        if self.mail.from.trim().is_empty() {
            return Err(AppError::config("mail.from is empty"));
        }
        for selector in [
            &self.extract.item_selector,
            &self.extract.link_selector,
            &self.extract.new_marker_selector,
        ] {
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// Notice page and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Absolute URL of the notice page
    #[serde(default)]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// CSS selectors for notice extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// One match per notice
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// Link element inside an item
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// Element whose presence inside an item marks it as new on the page
    #[serde(default = "defaults::new_marker_selector")]
    pub new_marker_selector: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            item_selector: defaults::item_selector(),
            link_selector: defaults::link_selector(),
            new_marker_selector: defaults::new_marker_selector(),
        }
    }
}

/// Cycle timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between cycle starts
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// History persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Primary history document
    #[serde(default = "defaults::history_path")]
    pub path: PathBuf,

    /// Backup copy written next to the primary on every save
    #[serde(default = "defaults::backup_path")]
    pub backup_path: PathBuf,

    /// Keep only the newest N entries. Unbounded when unset.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Text matches against history newer than this are not re-alerted
    #[serde(default = "defaults::recency_window_hours")]
    pub recency_window_hours: u32,
}

impl HistoryConfig {
    pub fn recency_window(&self) -> Duration {
        Duration::hours(i64::from(self.recency_window_hours))
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: defaults::history_path(),
            backup_path: defaults::backup_path(),
            max_entries: None,
            recency_window_hours: defaults::recency_window_hours(),
        }
    }
}

/// Alert email settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender address
    #[serde(default = "defaults::mail_from")]
    pub from: String,

    /// Reply-To address; the recipient is used when unset
    #[serde(default)]
    pub reply_to: Option<String>,

    /// Base URL of the mail provider API
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Log alerts instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: defaults::mail_from(),
            reply_to: None,
            api_base: defaults::api_base(),
            dry_run: false,
        }
    }
}

/// Secrets read from the environment.
#[derive(Clone)]
pub struct Credentials {
    /// Alert recipient
    pub recipient: String,

    /// Mail provider API key
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("recipient", &self.recipient)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let recipient = non_empty(lookup(ENV_NOTIFY_EMAIL))
            .ok_or_else(|| AppError::config(format!("{ENV_NOTIFY_EMAIL} must be set")))?;
        if !recipient.contains('@') {
            return Err(AppError::config(format!(
                "{ENV_NOTIFY_EMAIL} is not an email address: {recipient}"
            )));
        }
        let api_key = non_empty(lookup(ENV_API_KEY))
            .ok_or_else(|| AppError::config(format!("{ENV_API_KEY} must be set")))?;

        Ok(Self { recipient, api_key })
    }
}

/// Immutable settings handed to the monitor.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub credentials: Credentials,
}

impl Settings {
    /// Combine a file config with the process environment and validate.
    pub fn from_env(config: Config) -> Result<Self> {
        Self::from_lookup(config, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(config: Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = config.with_env_overrides(&lookup);
        config.validate()?;
        let credentials = Credentials::from_lookup(&lookup)?;
        Ok(Self {
            config,
            credentials,
        })
    }

    /// Reply-To address for alerts.
    pub fn reply_to(&self) -> &str {
        self.config
            .mail
            .reply_to
            .as_deref()
            .unwrap_or(&self.credentials.recipient)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; notice-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    pub fn item_selector() -> String {
        "li".into()
    }
    pub fn link_selector() -> String {
        "a[href]".into()
    }
    pub fn new_marker_selector() -> String {
        r#"img[src*="new"], img[alt*="new"], img[alt*="New"]"#.into()
    }

    pub fn interval() -> u64 {
        30 * 60
    }

    pub fn history_path() -> PathBuf {
        PathBuf::from("data/history.json")
    }
    pub fn backup_path() -> PathBuf {
        PathBuf::from("data/history.backup.json")
    }
    pub fn recency_window_hours() -> u32 {
        24
    }

    pub fn mail_from() -> String {
        "Notice Watch <onboarding@resend.dev>".into()
    }
    pub fn api_base() -> String {
        "https://api.resend.com".into()
    }
}
