//! Persisted conversation log.
//!
//! Each text-generation exchange is appended as one JSON line; the full log
//! is loaded into memory at startup for listing. Append failures surface to
//! the caller rather than being swallowed.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One stored prompt/response exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub prompt: String,
    pub response: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn new(prompt: &str, response: &str, model: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
            model: model.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// JSONL-backed conversation store.
pub struct ConversationLog {
    path: PathBuf,
    entries: RwLock<Vec<ConversationRecord>>,
}

impl ConversationLog {
    /// Open the log, loading any existing records. A missing file is an
    /// empty log; a malformed file is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str)
                .collect::<Result<Vec<ConversationRecord>, _>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Append one record in memory and on disk.
    pub async fn append(&self, record: ConversationRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut entries = self.entries.write().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        entries.push(record);
        Ok(())
    }

    /// Most recent records, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<ConversationRecord> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = ConversationLog::open(dir.path().join("conversations.jsonl")).unwrap();
        assert_eq!(log.len().await, 0);
    }

    #[tokio::test]
    async fn test_append_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conversations.jsonl");

        let log = ConversationLog::open(&path).unwrap();
        log.append(ConversationRecord::new("hi", "hello", "gpt-4"))
            .await
            .unwrap();
        log.append(ConversationRecord::new("2+2?", "4", "gpt-4"))
            .await
            .unwrap();
        assert_eq!(log.len().await, 2);

        // A fresh open sees both records.
        let reloaded = ConversationLog::open(&path).unwrap();
        assert_eq!(reloaded.len().await, 2);

        let recent = reloaded.recent(10).await;
        assert_eq!(recent[0].prompt, "2+2?");
        assert_eq!(recent[1].prompt, "hi");
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let dir = TempDir::new().unwrap();
        let log = ConversationLog::open(dir.path().join("c.jsonl")).unwrap();

        for i in 0..5 {
            log.append(ConversationRecord::new(&format!("p{}", i), "r", "gpt-4"))
                .await
                .unwrap();
        }

        let recent = log.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].prompt, "p4");
    }

    #[tokio::test]
    async fn test_malformed_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();

        assert!(ConversationLog::open(&path).is_err());
    }
}
