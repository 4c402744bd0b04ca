//! Reference model of the live editing surface.
//!
//! Real editors (code editors, rich text widgets) live outside this crate. This
//! model captures the contract they must honor: every mutation is dispatched as
//! a [`Transaction`] carrying its provenance, and the change listener forwards
//! only non-remote transactions to the save path. Content the surface received
//! from the producer therefore never echoes back as a local edit.

use crate::document::Status;
use crate::reconciler::{Change, Provenance};

/// A single mutation of the surface's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub content: String,
    pub provenance: Provenance,
}

impl Transaction {
    pub fn local(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            provenance: Provenance::Local,
        }
    }

    pub fn remote(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            provenance: Provenance::Remote,
        }
    }
}

/// In-memory editing surface with a provenance-aware change listener.
#[derive(Debug, Clone, Default)]
pub struct EditorSurface {
    text: String,
}

impl EditorSurface {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Dispatch a transaction and run the change listener.
    ///
    /// Returns the local change to hand to the reconciler, if any. Remote
    /// transactions and no-op transactions produce nothing.
    pub fn dispatch(&mut self, tx: Transaction) -> Option<Change> {
        if tx.content == self.text {
            return None;
        }
        self.text = tx.content;

        match tx.provenance {
            Provenance::Local => Some(Change::Local(self.text.clone())),
            Provenance::Remote => None,
        }
    }

    /// Whether a push of `content` should be dispatched to the surface.
    ///
    /// While the producer is streaming every push is dispatched; when idle only
    /// pushes that differ from the current text are. Empty content is ignored
    /// so a not-yet-loaded document does not wipe the surface.
    pub fn accepts(&self, content: &str, status: Status) -> bool {
        !content.is_empty() && (status == Status::Producing || self.text != content)
    }

    /// Receive content pushed from the document as a remote transaction.
    ///
    /// Returns whatever the change listener produced for the push, which is
    /// `None` unless the push leaked through as a local edit.
    pub fn receive(&mut self, content: &str, status: Status) -> Option<Change> {
        if !self.accepts(content, status) {
            return None;
        }
        self.dispatch(Transaction::remote(content))
    }

    /// Simulate the user replacing the text.
    pub fn type_text(&mut self, content: impl Into<String>) -> Option<Change> {
        self.dispatch(Transaction::local(content))
    }
}
