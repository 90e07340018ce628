// src/models/mod.rs

//! Domain models for the notice watcher.

mod config;
mod notice;

// Re-export all public types
pub use config::{
    Config, Credentials, ExtractConfig, HistoryConfig, MailConfig, ScheduleConfig, Settings,
    SourceConfig,
};
pub use notice::{Category, Language, Notice, RawNotice};
