//! Artifact document: identity, kind, version history and live content.
//!
//! The document owns both writers' target (`content`) and the history cursor.
//! It performs no policy of its own; the reconciler and session decide which
//! mutations are allowed.

use crate::version::{Version, VersionStore};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DocumentIdError {
    #[error("Invalid document ID: {0}")]
    Invalid(#[from] uuid::Error),
}

/// Opaque identifier of an artifact document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a new random document ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Content semantics tag. Opaque to reconciliation; selects metadata shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    Text,
    Code,
    Html,
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "code" => Ok(Self::Code),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown artifact kind: {other}")),
        }
    }
}

/// Whether the producer is currently streaming into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Producing,
    #[default]
    Idle,
}

/// A single artifact under edit.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    kind: ArtifactKind,
    versions: VersionStore,
    /// Index of the version being viewed
    cursor: usize,
    /// Live content, written by both the producer and the editor
    content: String,
    status: Status,
    /// Set once the producer finishes, cleared when a new stream announces its kind
    stream_completed: bool,
    visible: bool,
}

impl Document {
    /// Create an empty, hidden document.
    pub fn new(id: DocumentId, kind: ArtifactKind) -> Self {
        Self::from_history(id, kind, Vec::new())
    }

    /// Create a document from previously committed history.
    ///
    /// The cursor starts on the newest version and live content mirrors it.
    pub fn from_history(id: DocumentId, kind: ArtifactKind, history: Vec<Version>) -> Self {
        let versions = VersionStore::from_versions(history);
        let content = versions
            .latest()
            .map(|v| v.content().to_string())
            .unwrap_or_default();
        let visible = !versions.is_empty();

        Self {
            id,
            kind,
            cursor: versions.latest_index(),
            versions,
            content,
            status: Status::Idle,
            stream_completed: false,
            visible,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn versions(&self) -> &VersionStore {
        &self.versions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True when the cursor sits on the newest version.
    ///
    /// An empty history counts as current so the first edit is accepted.
    pub fn is_current_version(&self) -> bool {
        self.versions.is_empty() || self.cursor == self.versions.latest_index()
    }

    pub(crate) fn set_kind(&mut self, kind: ArtifactKind) {
        self.kind = kind;
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.content = content;
    }

    /// Set status, returning true if it changed.
    pub(crate) fn set_status(&mut self, status: Status) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }

    /// True after the producer signalled completion and no new stream began.
    pub fn is_stream_completed(&self) -> bool {
        self.stream_completed
    }

    pub(crate) fn set_stream_completed(&mut self, completed: bool) {
        self.stream_completed = completed;
    }

    pub(crate) fn show(&mut self) {
        self.visible = true;
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.versions.latest_index());
    }

    /// Append a committed version and move the cursor onto it.
    pub(crate) fn push_version(&mut self, version: Version) -> usize {
        let index = self.versions.append(version);
        self.cursor = index;
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document() {
        let doc = Document::new(DocumentId::generate(), ArtifactKind::Html);
        assert_eq!(doc.content(), "");
        assert_eq!(doc.status(), Status::Idle);
        assert!(!doc.is_visible());
        assert!(doc.is_current_version());
    }

    #[test]
    fn test_from_history_starts_at_latest() {
        let history = vec![Version::at("one", 1), Version::at("two", 2)];
        let doc = Document::from_history(DocumentId::generate(), ArtifactKind::Code, history);

        assert_eq!(doc.cursor(), 1);
        assert_eq!(doc.content(), "two");
        assert!(doc.is_visible());
        assert!(doc.is_current_version());
    }

    #[test]
    fn test_cursor_is_clamped_to_history() {
        let history = vec![Version::at("one", 1), Version::at("two", 2)];
        let mut doc = Document::from_history(DocumentId::generate(), ArtifactKind::Text, history);

        doc.set_cursor(7);
        assert_eq!(doc.cursor(), 1);

        doc.set_cursor(0);
        assert!(!doc.is_current_version());
    }

    #[test]
    fn test_push_version_moves_cursor() {
        let mut doc = Document::new(DocumentId::generate(), ArtifactKind::Text);
        assert_eq!(doc.push_version(Version::at("a", 1)), 0);
        assert_eq!(doc.push_version(Version::at("b", 2)), 1);
        assert_eq!(doc.cursor(), 1);
    }

    #[test]
    fn test_document_id_roundtrip() {
        let id = DocumentId::generate();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_document_id_serializes_as_string() {
        let id = DocumentId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let parsed: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_artifact_kind_from_str() {
        assert_eq!("html".parse::<ArtifactKind>().unwrap(), ArtifactKind::Html);
        assert!("sheet".parse::<ArtifactKind>().is_err());
    }
}
