//! Reconciler: decides whether a change reaches the live content.
//!
//! Both the producer and the human editor write the same live content. Every
//! write is tagged with its provenance so that the two paths can never be
//! mistaken for one another:
//!
//! - `Remote` changes are always applied. They are authoritative generation
//!   progress and must never be fed back into the save path.
//! - `Local` changes are applied only while the cursor is on the newest
//!   version. History is read-only.

use crate::document::Document;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Origin of a content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Typed by the human editor
    Local,
    /// Injected by the streaming producer
    Remote,
}

/// A content change tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Local(String),
    Remote(String),
}

impl Change {
    pub fn provenance(&self) -> Provenance {
        match self {
            Change::Local(_) => Provenance::Local,
            Change::Remote(_) => Provenance::Remote,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Change::Local(content) | Change::Remote(content) => content,
        }
    }

    pub fn into_content(self) -> String {
        match self {
            Change::Local(content) | Change::Remote(content) => content,
        }
    }
}

/// Why a change was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Local edit while viewing a non-current version
    StaleEdit,
}

/// Outcome of reconciling one change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Applied {
        provenance: Provenance,
        /// False when the change was byte-identical to the live content
        changed: bool,
    },
    Skipped(SkipReason),
}

impl Reconciliation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Reconciliation::Applied { .. })
    }

    /// True when this outcome should reach the persistence gate.
    ///
    /// Only local changes that actually altered the live content qualify.
    pub fn needs_save(&self) -> bool {
        matches!(
            self,
            Reconciliation::Applied {
                provenance: Provenance::Local,
                changed: true
            }
        )
    }
}

impl Document {
    /// Reconcile a change against the live content.
    ///
    /// Never fails: a change is either applied or skipped.
    pub fn apply(&mut self, change: Change) -> Reconciliation {
        let provenance = change.provenance();

        if provenance == Provenance::Local && !self.is_current_version() {
            debug!(
                "Skipping local edit on {}: viewing version {} of {}",
                self.id(),
                self.cursor(),
                self.versions().latest_index()
            );
            return Reconciliation::Skipped(SkipReason::StaleEdit);
        }

        let changed = self.content() != change.content();
        if changed {
            self.set_content(change.into_content());
        }

        Reconciliation::Applied {
            provenance,
            changed,
        }
    }
}
