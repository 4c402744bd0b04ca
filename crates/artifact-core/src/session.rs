//! EditingSession: one open artifact, its producer stream and its editor.
//!
//! The session wires the pieces together on a single logical timeline:
//!
//! 1. Producer stream parts are ingested as remote changes and pushed to the
//!    surface tagged `Remote`. They never schedule a save.
//! 2. Local edits are reconciled; accepted ones are scheduled on the
//!    persistence gate and coalesced until the quiet period elapses.
//! 3. When the producer finishes, the live content is committed once.
//! 4. `flush()` commits pending content immediately and must be called on
//!    every exit path.
//!
//! Local edits made while the producer is still streaming are parked on the
//! gate without a timer; the commit at stream end (or an explicit flush)
//! captures them. A remote fragment that arrives while the user is viewing an
//! older version moves the cursor back to the latest version, since the live
//! content now reflects the newest change.

use crate::document::{ArtifactKind, Document, DocumentId, Status};
use crate::events::{ArtifactEvent, EventBus};
use crate::gate::{PersistenceGate, DEFAULT_QUIET_PERIOD};
use crate::ingest::{Ingested, StreamPart};
use crate::metadata::{Metadata, MetadataError, MetadataPatch, MetadataState};
use crate::navigator::{DiffPair, Navigator, VersionChange};
use crate::reconciler::{Change, Provenance, Reconciliation};
use crate::storage::{DocumentStorage, StorageError};
use crate::version::{now_millis, Version};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use web_time::Instant;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inactivity before pending local edits are committed
    pub quiet_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// What the surface shows: the editor or a diff against the previous version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Edit,
    Diff,
}

/// An open editing session for one artifact.
pub struct EditingSession<S: DocumentStorage> {
    storage: Arc<S>,
    document: Document,
    gate: PersistenceGate,
    metadata: MetadataState,
    mode: Mode,
    events: Arc<EventBus>,
}

impl<S: DocumentStorage> EditingSession<S> {
    /// Open a session, loading committed history from storage.
    pub async fn open(
        storage: Arc<S>,
        id: DocumentId,
        kind: ArtifactKind,
        config: SessionConfig,
    ) -> Result<Self> {
        let history = storage.load(id).await?;
        info!("Opened {} ({:?}) with {} version(s)", id, kind, history.len());

        let mut metadata = MetadataState::new();
        metadata.initialize(Metadata::defaults_for(kind));

        Ok(Self {
            storage,
            document: Document::from_history(id, kind, history),
            gate: PersistenceGate::new(config.quiet_period),
            metadata,
            mode: Mode::Edit,
            events: Arc::new(EventBus::new()),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.get()
    }

    /// Content awaiting commit.
    pub fn pending(&self) -> Option<&str> {
        self.gate.pending()
    }

    /// When the debounce timer fires, if one is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.gate.deadline()
    }

    pub fn is_current_version(&self) -> bool {
        self.document.is_current_version()
    }

    /// Content for the surface: live content at the latest version, the stored
    /// snapshot when viewing history.
    pub fn displayed_content(&self) -> &str {
        if self.document.is_current_version() {
            return self.document.content();
        }
        self.document
            .versions()
            .get(self.document.cursor())
            .map(Version::content)
            .unwrap_or_else(|_| self.document.content())
    }

    /// Snapshots for the diff view at the current cursor.
    pub fn diff_pair(&self) -> DiffPair {
        self.navigator().diff_pair(self.document.cursor())
    }

    pub fn can_go_previous(&self) -> bool {
        self.navigator().can_go_previous(self.document.cursor())
    }

    pub fn can_go_next(&self) -> bool {
        self.navigator().can_go_next(self.document.cursor())
    }

    fn navigator(&self) -> Navigator<'_> {
        Navigator::new(self.document.versions())
    }

    // ------------------------------------------------------------------------
    // Producer path
    // ------------------------------------------------------------------------

    /// Ingest one producer stream part.
    ///
    /// Completion of the stream is a commit boundary; a commit failure there is
    /// returned after the live content has been parked for retry. A fragment
    /// that finds the document idle first commits any pending local edit, since
    /// the fragment replaces the live content. A late fragment after completion
    /// is committed on its own.
    pub async fn on_stream_part(&mut self, part: StreamPart) -> Result<Ingested> {
        if part.payload().is_some() && self.document.status() == Status::Idle && self.gate.has_pending() {
            debug!("Fragment for {} would replace a pending edit, flushing", self.document.id());
            self.flush().await?;
        }

        if part.payload().is_some() && !self.document.is_current_version() {
            let latest = self.document.versions().latest_index();
            debug!("Remote fragment while viewing history, moving {} to latest", self.document.id());
            self.document.set_cursor(latest);
            self.emit_navigated();
        }

        let outcome = self.document.ingest(part);

        match outcome {
            Ingested::Content {
                reconciliation,
                started,
                late,
            } => {
                if started {
                    self.emit_status();
                }
                if reconciliation.is_applied() {
                    self.emit_content(Provenance::Remote);
                }
                if late {
                    let content = self.document.content().to_string();
                    self.commit(content).await?;
                }
            }
            Ingested::KindSelected(kind) => {
                if self.metadata.get().map(Metadata::kind) != Some(kind) {
                    self.metadata.reset(Metadata::defaults_for(kind));
                    self.emit_metadata();
                }
            }
            Ingested::Finished { was_producing } => {
                if was_producing {
                    self.emit_status();
                }
                let content = self.document.content().to_string();
                self.commit(content).await?;
            }
        }

        Ok(outcome)
    }

    // ------------------------------------------------------------------------
    // Editor path
    // ------------------------------------------------------------------------

    /// Reconcile a local edit and schedule it for saving.
    pub fn edit(&mut self, content: impl Into<String>) -> Reconciliation {
        self.edit_at(content, Instant::now())
    }

    /// `edit` with an explicit clock, for driving the debounce deterministically.
    pub fn edit_at(&mut self, content: impl Into<String>, now: Instant) -> Reconciliation {
        let reconciliation = self.document.apply(Change::Local(content.into()));

        if reconciliation.needs_save() {
            let content = self.document.content().to_string();
            if self.document.status() == Status::Producing {
                self.gate.park(content);
            } else {
                self.gate.schedule(content, now);
            }
            self.emit_content(Provenance::Local);
        }

        reconciliation
    }

    /// Save from the editor: debounced, or committed immediately.
    pub async fn save_content(
        &mut self,
        content: impl Into<String>,
        debounce: bool,
    ) -> Result<Reconciliation> {
        let reconciliation = self.edit(content);
        if !debounce && reconciliation.is_applied() {
            self.flush().await?;
        }
        Ok(reconciliation)
    }

    /// Commit pending content if its quiet period has elapsed.
    pub async fn poll(&mut self, now: Instant) -> Result<Option<usize>> {
        if !self.gate.is_due(now) {
            return Ok(None);
        }
        self.flush().await
    }

    /// Commit pending content now, cancelling the debounce timer.
    ///
    /// On failure the content stays pending, so calling `flush` again retries.
    pub async fn flush(&mut self) -> Result<Option<usize>> {
        match self.gate.take() {
            Some(content) => self.commit(content).await,
            None => Ok(None),
        }
    }

    async fn commit(&mut self, content: String) -> Result<Option<usize>> {
        let versions = self.document.versions();
        let unchanged = match versions.latest() {
            Some(latest) => latest.content() == content,
            None => content.is_empty(),
        };
        if unchanged {
            debug!("Skipping commit for {}: matches latest version", self.document.id());
            self.gate.clear();
            return Ok(None);
        }

        let id = self.document.id();
        let timestamp = now_millis();

        match self.storage.commit(id, &content, timestamp).await {
            Ok(stored) => {
                let index = self.document.push_version(Version::at(content, timestamp));
                if stored != index {
                    warn!("Storage stored {} at index {} but history expected {}", id, stored, index);
                }
                self.gate.clear();
                info!("Committed version {} of {}", index, id);
                self.events.emit(ArtifactEvent::VersionCommitted {
                    document_id: id,
                    index,
                    timestamp,
                });
                Ok(Some(index))
            }
            Err(e) => {
                error!("Failed to commit {}: {}", id, e);
                self.gate.park(content);
                self.events.emit(ArtifactEvent::CommitFailed {
                    document_id: id,
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    /// Apply a version change action, returning the cursor afterwards.
    ///
    /// Moving the cursor flushes pending edits first.
    pub async fn change_version(&mut self, change: VersionChange) -> Result<usize> {
        if change == VersionChange::Toggle {
            self.mode = match self.mode {
                Mode::Edit => Mode::Diff,
                Mode::Diff => Mode::Edit,
            };
            self.events.emit(ArtifactEvent::ModeChanged {
                document_id: self.document.id(),
                mode: self.mode,
            });
            return Ok(self.document.cursor());
        }

        self.flush().await?;

        let current = self.document.cursor();
        let target = match change {
            VersionChange::Previous => self.navigator().previous(current),
            VersionChange::Next => self.navigator().next(current),
            VersionChange::Latest | VersionChange::Toggle => self.document.versions().latest_index(),
        };

        if target != current {
            self.document.set_cursor(target);
            self.emit_navigated();
        }
        Ok(target)
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    pub fn set_metadata(&mut self, patch: MetadataPatch) -> Result<Metadata> {
        let metadata = self.metadata.set(patch)?;
        self.emit_metadata();
        Ok(metadata)
    }

    pub fn toggle_preview(&mut self) -> Result<Metadata> {
        let metadata = self.metadata.toggle_preview()?;
        self.emit_metadata();
        Ok(metadata)
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    fn emit_content(&self, provenance: Provenance) {
        self.events.emit(ArtifactEvent::ContentApplied {
            document_id: self.document.id(),
            content: self.document.content().to_string(),
            provenance,
            status: self.document.status(),
        });
    }

    fn emit_status(&self) {
        self.events.emit(ArtifactEvent::StatusChanged {
            document_id: self.document.id(),
            status: self.document.status(),
        });
    }

    fn emit_navigated(&self) {
        self.events.emit(ArtifactEvent::Navigated {
            document_id: self.document.id(),
            index: self.document.cursor(),
            is_current_version: self.document.is_current_version(),
        });
    }

    fn emit_metadata(&self) {
        if let Some(metadata) = self.metadata.get() {
            self.events.emit(ArtifactEvent::MetadataChanged {
                document_id: self.document.id(),
                metadata: *metadata,
            });
        }
    }
}
