//! File-backed document storage using tokio::fs.
//!
//! Each document's history lives in `<root>/<document_id>.json`. Commits
//! rewrite the file through a temporary sibling and a rename, so a crash
//! mid-write leaves the previous history intact.

use artifact_core::storage::{DocumentStorage, Result, StorageError};
use artifact_core::{DocumentId, Version};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// On-disk history format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredHistory {
    versions: Vec<Version>,
}

/// Native storage implementation for the daemon
pub struct FileStore {
    root: PathBuf,
    /// Serializes read-modify-write commits
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn history_path(&self, document_id: DocumentId) -> PathBuf {
        self.root.join(format!("{document_id}.json"))
    }

    async fn read_history(&self, path: &Path) -> Result<StoredHistory> {
        match fs::read_to_string(path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredHistory::default()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}

#[async_trait]
impl DocumentStorage for FileStore {
    async fn commit(&self, document_id: DocumentId, content: &str, timestamp: u64) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let path = self.history_path(document_id);

        let mut history = self.read_history(&path).await?;
        history.versions.push(Version::at(content, timestamp));
        let index = history.versions.len() - 1;

        let contents = serde_json::to_string_pretty(&history)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        debug!("Wrote version {} to {:?}", index, path);
        Ok(index)
    }

    async fn load(&self, document_id: DocumentId) -> Result<Vec<Version>> {
        let path = self.history_path(document_id);
        Ok(self.read_history(&path).await?.versions)
    }
}
