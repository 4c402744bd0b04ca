//! Per-kind ephemeral UI metadata.
//!
//! Metadata lives for one editing session only. It is initialized once when the
//! document opens and updated by shallow merge: fields absent from a patch keep
//! their current value.

use crate::document::ArtifactKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Metadata not initialized")]
    NotInitialized,

    #[error("Patch for {patch:?} metadata applied to {current:?} metadata")]
    KindMismatch {
        current: ArtifactKind,
        patch: ArtifactKind,
    },
}

pub type Result<T> = std::result::Result<T, MetadataError>;

/// How an HTML artifact is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Code,
    Preview,
    #[default]
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlMetadata {
    pub view_mode: ViewMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlPatch {
    pub view_mode: Option<ViewMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetadata {
    pub show_console: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodePatch {
    pub show_console: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMetadata {
    pub show_suggestions: bool,
}

impl Default for TextMetadata {
    fn default() -> Self {
        Self {
            show_suggestions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPatch {
    pub show_suggestions: Option<bool>,
}

/// Metadata record for one artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Metadata {
    Text(TextMetadata),
    Code(CodeMetadata),
    Html(HtmlMetadata),
}

impl Metadata {
    /// Default metadata for `kind`.
    pub fn defaults_for(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Text => Metadata::Text(TextMetadata::default()),
            ArtifactKind::Code => Metadata::Code(CodeMetadata::default()),
            ArtifactKind::Html => Metadata::Html(HtmlMetadata::default()),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Metadata::Text(_) => ArtifactKind::Text,
            Metadata::Code(_) => ArtifactKind::Code,
            Metadata::Html(_) => ArtifactKind::Html,
        }
    }
}

/// Partial update for a metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetadataPatch {
    Text(TextPatch),
    Code(CodePatch),
    Html(HtmlPatch),
}

impl MetadataPatch {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            MetadataPatch::Text(_) => ArtifactKind::Text,
            MetadataPatch::Code(_) => ArtifactKind::Code,
            MetadataPatch::Html(_) => ArtifactKind::Html,
        }
    }
}

/// Session-scoped metadata holder.
#[derive(Debug, Clone, Default)]
pub struct MetadataState {
    current: Option<Metadata>,
}

impl MetadataState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install defaults. Only the first call has an effect.
    ///
    /// Returns false if metadata was already initialized.
    pub fn initialize(&mut self, defaults: Metadata) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.current = Some(defaults);
        true
    }

    pub fn get(&self) -> Option<&Metadata> {
        self.current.as_ref()
    }

    /// Shallow-merge `patch` into the current metadata.
    pub fn set(&mut self, patch: MetadataPatch) -> Result<Metadata> {
        let current = self.current.as_mut().ok_or(MetadataError::NotInitialized)?;

        match (current, patch) {
            (Metadata::Html(meta), MetadataPatch::Html(patch)) => {
                if let Some(view_mode) = patch.view_mode {
                    meta.view_mode = view_mode;
                }
            }
            (Metadata::Code(meta), MetadataPatch::Code(patch)) => {
                if let Some(show_console) = patch.show_console {
                    meta.show_console = show_console;
                }
            }
            (Metadata::Text(meta), MetadataPatch::Text(patch)) => {
                if let Some(show_suggestions) = patch.show_suggestions {
                    meta.show_suggestions = show_suggestions;
                }
            }
            (current, patch) => {
                return Err(MetadataError::KindMismatch {
                    current: current.kind(),
                    patch: patch.kind(),
                });
            }
        }

        self.current.ok_or(MetadataError::NotInitialized)
    }

    /// Flip an HTML artifact between preview and code.
    ///
    /// Split switches to preview.
    pub fn toggle_preview(&mut self) -> Result<Metadata> {
        let view_mode = match self.current {
            Some(Metadata::Html(meta)) => meta.view_mode,
            Some(other) => {
                return Err(MetadataError::KindMismatch {
                    current: other.kind(),
                    patch: ArtifactKind::Html,
                });
            }
            None => return Err(MetadataError::NotInitialized),
        };

        let next = match view_mode {
            ViewMode::Preview => ViewMode::Code,
            ViewMode::Code | ViewMode::Split => ViewMode::Preview,
        };
        self.set(MetadataPatch::Html(HtmlPatch {
            view_mode: Some(next),
        }))
    }

    /// Drop the current metadata and install new defaults.
    pub(crate) fn reset(&mut self, defaults: Metadata) {
        self.current = Some(defaults);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_only_once() {
        let mut state = MetadataState::new();
        assert!(state.initialize(Metadata::defaults_for(ArtifactKind::Html)));
        assert!(!state.initialize(Metadata::Html(HtmlMetadata {
            view_mode: ViewMode::Code
        })));

        assert_eq!(
            state.get(),
            Some(&Metadata::Html(HtmlMetadata {
                view_mode: ViewMode::Split
            }))
        );
    }

    #[test]
    fn test_set_before_initialize() {
        let mut state = MetadataState::new();
        let err = state.set(MetadataPatch::Code(CodePatch::default())).unwrap_err();
        assert_eq!(err, MetadataError::NotInitialized);
    }

    #[test]
    fn test_empty_patch_keeps_fields() {
        let mut state = MetadataState::new();
        state.initialize(Metadata::Text(TextMetadata {
            show_suggestions: false,
        }));

        let merged = state.set(MetadataPatch::Text(TextPatch::default())).unwrap();

        assert_eq!(
            merged,
            Metadata::Text(TextMetadata {
                show_suggestions: false
            })
        );
    }

    #[test]
    fn test_set_merges_given_field() {
        let mut state = MetadataState::new();
        state.initialize(Metadata::defaults_for(ArtifactKind::Code));

        let merged = state
            .set(MetadataPatch::Code(CodePatch {
                show_console: Some(true),
            }))
            .unwrap();

        assert_eq!(merged, Metadata::Code(CodeMetadata { show_console: true }));
    }

    #[test]
    fn test_kind_mismatch() {
        let mut state = MetadataState::new();
        state.initialize(Metadata::defaults_for(ArtifactKind::Text));

        let err = state.set(MetadataPatch::Html(HtmlPatch::default())).unwrap_err();

        assert_eq!(
            err,
            MetadataError::KindMismatch {
                current: ArtifactKind::Text,
                patch: ArtifactKind::Html
            }
        );
    }

    #[test]
    fn test_toggle_preview() {
        let mut state = MetadataState::new();
        state.initialize(Metadata::defaults_for(ArtifactKind::Html));

        let view = |m: Metadata| match m {
            Metadata::Html(h) => h.view_mode,
            _ => unreachable!(),
        };

        assert_eq!(view(state.toggle_preview().unwrap()), ViewMode::Preview);
        assert_eq!(view(state.toggle_preview().unwrap()), ViewMode::Code);
        assert_eq!(view(state.toggle_preview().unwrap()), ViewMode::Preview);
    }

    #[test]
    fn test_metadata_serialization() {
        let json = serde_json::to_string(&Metadata::defaults_for(ArtifactKind::Html)).unwrap();
        assert_eq!(json, r#"{"kind":"html","viewMode":"split"}"#);

        let patch: MetadataPatch = serde_json::from_str(r#"{"kind":"code","showConsole":true}"#).unwrap();
        assert_eq!(
            patch,
            MetadataPatch::Code(CodePatch {
                show_console: Some(true)
            })
        );
    }
}
