//! Local filesystem history store.
//!
//! Writes go to a temp file that is renamed over the target, so a crash
//! mid-write leaves the previous document intact. Every save also writes a
//! backup copy; the two writes are independent and neither is rolled back
//! if the other fails.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{HistoryConfig, Notice};
use crate::storage::HistoryStore;

/// JSON file history store with a sibling backup.
#[derive(Debug, Clone)]
pub struct LocalHistoryStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl LocalHistoryStore {
    /// Create a store writing to `path` and `backup_path`.
    pub fn new(path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_path: backup_path.into(),
        }
    }

    /// Create a store from the `[history]` config section.
    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(&config.path, &config.backup_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read and parse a history document.
    async fn read_history(path: &Path) -> Result<Option<Vec<Notice>>> {
        match Self::read_bytes(path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl HistoryStore for LocalHistoryStore {
    async fn load(&self) -> Result<Vec<Notice>> {
        match Self::read_history(&self.path).await {
            Ok(Some(notices)) => {
                log::debug!(
                    "Loaded {} history entries from {}",
                    notices.len(),
                    self.path.display()
                );
                Ok(notices)
            }
            Ok(None) => {
                log::info!(
                    "No history at {}, starting empty",
                    self.path.display()
                );
                Ok(Vec::new())
            }
            Err(primary_err) => {
                log::warn!(
                    "History at {} unreadable ({}), trying backup {}",
                    self.path.display(),
                    primary_err,
                    self.backup_path.display()
                );
                match Self::read_history(&self.backup_path).await {
                    Ok(Some(notices)) => {
                        log::warn!(
                            "Recovered {} history entries from backup",
                            notices.len()
                        );
                        Ok(notices)
                    }
                    Ok(None) => Err(primary_err),
                    Err(backup_err) => {
                        log::error!("History backup also unreadable: {}", backup_err);
                        Err(primary_err)
                    }
                }
            }
        }
    }

    async fn save(&self, notices: &[Notice]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(notices)?;

        let primary = Self::write_bytes(&self.path, &bytes).await;
        let backup = Self::write_bytes(&self.backup_path, &bytes).await;

        if let Err(e) = &backup {
            log::warn!(
                "Failed to write history backup {}: {}",
                self.backup_path.display(),
                e
            );
        }

        match primary {
            Ok(()) => {
                log::info!(
                    "Saved {} history entries to {}",
                    notices.len(),
                    self.path.display()
                );
                Ok(())
            }
            Err(e) => Err(AppError::persist(self.path.display().to_string(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::models::Category;

    fn store_in(tmp: &TempDir) -> LocalHistoryStore {
        LocalHistoryStore::new(
            tmp.path().join("history.json"),
            tmp.path().join("history.backup.json"),
        )
    }

    fn sample(id: &str, text: &str) -> Notice {
        Notice {
            id: id.to_string(),
            text: text.to_string(),
            link: Some("https://example.edu/n/1".to_string()),
            is_new: true,
            is_urgent: false,
            category: Category::Exam,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let notices = vec![sample("a1", "Exam results"), sample("b2", "સૂચના")];

        store.save(&notices).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, notices);
        assert!(store.backup_path().exists());
        assert!(!tmp.path().join("history.tmp").exists());
    }

    #[tokio::test]
    async fn test_document_is_plain_array() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.save(&[sample("a1", "Exam results")]).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["isNew"], true);
    }

    #[tokio::test]
    async fn test_corrupt_primary_recovers_from_backup() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let notices = vec![sample("a1", "Exam results")];
        store.save(&notices).await.unwrap();

        std::fs::write(store.path(), b"{ not json").unwrap();

        assert_eq!(store.load().await.unwrap(), notices);
    }

    #[tokio::test]
    async fn test_corrupt_primary_without_backup_is_error() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        std::fs::write(store.path(), b"[{").unwrap();

        assert!(matches!(store.load().await, Err(AppError::Json(_))));
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = LocalHistoryStore::new(
            tmp.path().join("nested/dir/history.json"),
            tmp.path().join("nested/dir/history.backup.json"),
        );
        store.save(&[sample("a1", "Exam results")]).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_primary_failure_reported_backup_still_written() {
        let tmp = TempDir::new().unwrap();
        // A directory where the primary file should be makes the rename fail
        let primary = tmp.path().join("history.json");
        std::fs::create_dir(&primary).unwrap();
        let store = LocalHistoryStore::new(&primary, tmp.path().join("history.backup.json"));

        let result = store.save(&[sample("a1", "Exam results")]).await;
        assert!(matches!(result, Err(AppError::Persist { .. })));
        assert!(store.backup_path().is_file());
    }

    #[tokio::test]
    async fn test_backup_failure_is_warning_only() {
        let tmp = TempDir::new().unwrap();
        let backup = tmp.path().join("history.backup.json");
        std::fs::create_dir(&backup).unwrap();
        let store = LocalHistoryStore::new(tmp.path().join("history.json"), &backup);
        let notices = vec![sample("a1", "Exam results")];

        store.save(&notices).await.unwrap();
        assert_eq!(store.load().await.unwrap(), notices);
    }
}
