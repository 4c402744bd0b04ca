//! DocumentStorage trait abstraction for durable version history.
//!
//! Implementations:
//! - `InMemoryStorage` - For testing
//! - `FileStore` (in artifact-daemon) - JSON files on disk

use crate::document::DocumentId;
use crate::version::Version;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable, append-only storage of committed versions.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Persist `content` as the next version of `document_id`.
    ///
    /// Returns the index of the stored version.
    async fn commit(&self, document_id: DocumentId, content: &str, timestamp: u64) -> Result<usize>;

    /// Load every committed version of `document_id`, oldest first.
    ///
    /// Unknown documents have an empty history.
    async fn load(&self, document_id: DocumentId) -> Result<Vec<Version>>;
}

/// In-memory storage for testing.
#[derive(Default)]
pub struct InMemoryStorage {
    documents: RwLock<HashMap<DocumentId, Vec<Version>>>,
    failing: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent commits fail until reset, for testing recovery.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of committed versions for a document.
    pub fn version_count(&self, document_id: DocumentId) -> usize {
        self.documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&document_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStorage for InMemoryStorage {
    async fn commit(&self, document_id: DocumentId, content: &str, timestamp: u64) -> Result<usize> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected failure".into()));
        }

        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        let versions = documents.entry(document_id).or_default();
        versions.push(Version::at(content, timestamp));
        Ok(versions.len() - 1)
    }

    async fn load(&self, document_id: DocumentId) -> Result<Vec<Version>> {
        Ok(self
            .documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&document_id)
            .cloned()
            .unwrap_or_default())
    }
}
