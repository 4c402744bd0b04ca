//! artifact-core: Reconciliation and versioning engine for streamed artifacts.
//!
//! This crate provides the core functionality for:
//! - Reconciling producer fragments and local edits tagged by provenance
//! - Debouncing local edits into append-only version commits
//! - Navigating version history and selecting diff pairs
//! - Per-kind session metadata
//! - DocumentStorage trait abstraction for durable history

pub mod document;
pub mod events;
pub mod gate;
pub mod ingest;
pub mod metadata;
pub mod navigator;
pub mod reconciler;
pub mod session;
pub mod storage;
pub mod surface;
pub mod version;

pub use document::{ArtifactKind, Document, DocumentId, Status};
pub use events::{ArtifactEvent, EventBus, Subscription};
pub use gate::PersistenceGate;
pub use ingest::{Ingested, StreamPart};
pub use metadata::{Metadata, MetadataPatch, MetadataState};
pub use navigator::{DiffPair, Navigator, VersionChange};
pub use reconciler::{Change, Provenance, Reconciliation, SkipReason};
pub use session::{EditingSession, Mode, SessionConfig, SessionError};
pub use storage::{DocumentStorage, InMemoryStorage, StorageError};
pub use surface::{EditorSurface, Transaction};
pub use version::{Version, VersionStore};
