//! Append-only version history for a single artifact.
//!
//! Versions are immutable snapshots addressed by a 0-based position. History is
//! never rewritten: a correction made after navigating back is appended as a new
//! version on top of the log.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("Version not found: index {index} (history has {len} versions)")]
    NotFound { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, VersionError>;

/// An immutable snapshot of artifact content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    content: String,
    /// Creation time in milliseconds since Unix epoch.
    created_at: u64,
}

impl Version {
    /// Snapshot `content` stamped with the current wall-clock time.
    pub fn new(content: impl Into<String>) -> Self {
        Self::at(content, now_millis())
    }

    /// Snapshot `content` with an explicit creation time.
    pub fn at(content: impl Into<String>, created_at: u64) -> Self {
        Self {
            content: content.into(),
            created_at,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

/// Ordered, append-only arena of versions.
#[derive(Debug, Clone, Default)]
pub struct VersionStore {
    versions: Vec<Version>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from history loaded out of durable storage.
    pub fn from_versions(versions: Vec<Version>) -> Self {
        Self { versions }
    }

    /// Append a snapshot, returning its index.
    pub fn append(&mut self, version: Version) -> usize {
        self.versions.push(version);
        self.versions.len() - 1
    }

    /// Get the version at `index`.
    ///
    /// Indices outside `[0, latest_index()]` are `NotFound`; callers clamp.
    pub fn get(&self, index: usize) -> Result<&Version> {
        self.versions.get(index).ok_or(VersionError::NotFound {
            index,
            len: self.versions.len(),
        })
    }

    /// Index of the newest version, or 0 for an empty history.
    pub fn latest_index(&self) -> usize {
        self.versions.len().saturating_sub(1)
    }

    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }
}

/// Current time in milliseconds since Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
