//! Streaming ingest: producer stream parts into remote changes.
//!
//! The producer sends whole-content snapshots, so deltas and full replacements
//! are handled the same way: each payload becomes the new live content.

use crate::document::{ArtifactKind, Document, Status};
use crate::reconciler::{Change, Reconciliation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed stream part: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A single part of the producer's stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StreamPart {
    /// Selects the artifact kind before content arrives
    #[serde(rename = "data-kind")]
    Kind(ArtifactKind),
    #[serde(rename = "data-textDelta")]
    TextDelta(String),
    #[serde(rename = "data-codeDelta")]
    CodeDelta(String),
    #[serde(rename = "data-htmlDelta")]
    HtmlDelta(String),
    /// Producer completed; status returns to idle
    #[serde(rename = "data-finish")]
    Finish,
}

impl StreamPart {
    /// Parse a JSON-encoded stream part.
    pub fn from_json(json: &str) -> Result<Self, IngestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Content payload, if this part carries one.
    pub fn payload(&self) -> Option<&str> {
        match self {
            StreamPart::TextDelta(data) | StreamPart::CodeDelta(data) | StreamPart::HtmlDelta(data) => {
                Some(data)
            }
            StreamPart::Kind(_) | StreamPart::Finish => None,
        }
    }
}

/// What ingesting a stream part did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Content {
        reconciliation: Reconciliation,
        /// True when this fragment moved the document from idle to producing
        started: bool,
        /// True when the fragment arrived after the producer finished
        late: bool,
    },
    KindSelected(ArtifactKind),
    Finished {
        /// False when the document was already idle
        was_producing: bool,
    },
}

impl Document {
    /// Feed one producer stream part into the document.
    ///
    /// A fragment arriving after the producer finished is a late duplicate: it
    /// is applied but leaves the document idle. Only a `data-kind` part opens
    /// a new stream once one has completed.
    pub fn ingest(&mut self, part: StreamPart) -> Ingested {
        match part {
            StreamPart::Kind(kind) => {
                self.set_kind(kind);
                self.set_stream_completed(false);
                Ingested::KindSelected(kind)
            }
            StreamPart::Finish => {
                let was_producing = self.set_status(Status::Idle);
                if !was_producing {
                    debug!("Finish for {} while already idle", self.id());
                }
                self.set_stream_completed(true);
                Ingested::Finished { was_producing }
            }
            StreamPart::TextDelta(data) | StreamPart::CodeDelta(data) | StreamPart::HtmlDelta(data) => {
                let late = self.status() == Status::Idle && self.is_stream_completed();
                let started = if late {
                    debug!("Fragment for {} arrived after completion, applying", self.id());
                    false
                } else {
                    self.set_status(Status::Producing)
                };
                self.show();
                let reconciliation = self.apply(Change::Remote(data));
                Ingested::Content {
                    reconciliation,
                    started,
                    late,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use crate::reconciler::Provenance;

    #[test]
    fn test_parse_stream_parts() {
        let part = StreamPart::from_json(r#"{"type":"data-codeDelta","data":"<html>"}"#).unwrap();
        assert_eq!(part, StreamPart::CodeDelta("<html>".into()));

        let part = StreamPart::from_json(r#"{"type":"data-kind","data":"html"}"#).unwrap();
        assert_eq!(part, StreamPart::Kind(ArtifactKind::Html));

        let part = StreamPart::from_json(r#"{"type":"data-finish"}"#).unwrap();
        assert_eq!(part, StreamPart::Finish);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(StreamPart::from_json(r#"{"type":"data-imageDelta","data":""}"#).is_err());
    }

    #[test]
    fn test_first_fragment_starts_producing_and_shows() {
        let mut doc = Document::new(DocumentId::generate(), ArtifactKind::Html);

        let outcome = doc.ingest(StreamPart::HtmlDelta("<html>".into()));

        assert_eq!(
            outcome,
            Ingested::Content {
                reconciliation: Reconciliation::Applied {
                    provenance: Provenance::Remote,
                    changed: true
                },
                started: true,
                late: false,
            }
        );
        assert_eq!(doc.status(), Status::Producing);
        assert!(doc.is_visible());
    }

    #[test]
    fn test_fragments_replace_content() {
        let mut doc = Document::new(DocumentId::generate(), ArtifactKind::Html);

        for part in ["<html>", "<html><body>", "<html><body>Hi</body></html>"] {
            doc.ingest(StreamPart::CodeDelta(part.into()));
        }
        let outcome = doc.ingest(StreamPart::Finish);

        assert_eq!(outcome, Ingested::Finished { was_producing: true });
        assert_eq!(doc.content(), "<html><body>Hi</body></html>");
        assert_eq!(doc.status(), Status::Idle);
        assert!(doc.versions().is_empty());
    }

    #[test]
    fn test_kind_part_sets_kind() {
        let mut doc = Document::new(DocumentId::generate(), ArtifactKind::Text);
        doc.ingest(StreamPart::Kind(ArtifactKind::Code));
        assert_eq!(doc.kind(), ArtifactKind::Code);
    }

    #[test]
    fn test_finish_while_idle() {
        let mut doc = Document::new(DocumentId::generate(), ArtifactKind::Text);
        assert_eq!(doc.ingest(StreamPart::Finish), Ingested::Finished { was_producing: false });
    }

    #[test]
    fn test_fragment_after_finish_stays_idle() {
        let mut doc = Document::new(DocumentId::generate(), ArtifactKind::Html);
        doc.ingest(StreamPart::HtmlDelta("<p>done".into()));
        doc.ingest(StreamPart::Finish);

        let outcome = doc.ingest(StreamPart::HtmlDelta("<p>done".into()));

        assert_eq!(
            outcome,
            Ingested::Content {
                reconciliation: Reconciliation::Applied {
                    provenance: Provenance::Remote,
                    changed: false
                },
                started: false,
                late: true,
            }
        );
        assert_eq!(doc.status(), Status::Idle);
    }

    #[test]
    fn test_kind_part_opens_new_stream() {
        let mut doc = Document::new(DocumentId::generate(), ArtifactKind::Html);
        doc.ingest(StreamPart::HtmlDelta("first".into()));
        doc.ingest(StreamPart::Finish);

        doc.ingest(StreamPart::Kind(ArtifactKind::Html));
        let outcome = doc.ingest(StreamPart::HtmlDelta("second".into()));

        assert!(matches!(outcome, Ingested::Content { started: true, late: false, .. }));
        assert_eq!(doc.status(), Status::Producing);
    }
}
