//! Cursor navigation over version history and diff pair selection.

use crate::version::VersionStore;
use serde::{Deserialize, Serialize};

/// Old-side content shown when diffing the first version.
pub const EMPTY_DOCUMENT_PLACEHOLDER: &str = "";

/// Version change requested from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VersionChange {
    Previous,
    Next,
    /// Jump straight to the newest version
    Latest,
    /// Switch between edit and diff mode
    Toggle,
}

/// The two snapshots handed to a diff renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffPair {
    pub old: String,
    pub new: String,
}

impl DiffPair {
    /// True when rendering this pair yields an empty diff.
    pub fn is_unchanged(&self) -> bool {
        self.old == self.new
    }
}

/// Read-only navigator over a version store.
#[derive(Debug, Clone, Copy)]
pub struct Navigator<'a> {
    versions: &'a VersionStore,
}

impl<'a> Navigator<'a> {
    pub fn new(versions: &'a VersionStore) -> Self {
        Self { versions }
    }

    /// One step back, clamped at 0.
    pub fn previous(&self, current: usize) -> usize {
        current.saturating_sub(1).min(self.versions.latest_index())
    }

    /// One step forward, clamped at the latest index.
    pub fn next(&self, current: usize) -> usize {
        current.saturating_add(1).min(self.versions.latest_index())
    }

    pub fn is_at_latest(&self, current: usize) -> bool {
        current == self.versions.latest_index()
    }

    pub fn can_go_previous(&self, current: usize) -> bool {
        current > 0
    }

    pub fn can_go_next(&self, current: usize) -> bool {
        !self.is_at_latest(current)
    }

    /// Select `(current - 1, current)` for diffing.
    ///
    /// Missing snapshots (below index 0, or an empty history) read as the empty
    /// document placeholder.
    pub fn diff_pair(&self, current: usize) -> DiffPair {
        let old = match current.checked_sub(1) {
            Some(index) => self.content_or_placeholder(index),
            None => EMPTY_DOCUMENT_PLACEHOLDER.to_string(),
        };

        DiffPair {
            old,
            new: self.content_or_placeholder(current),
        }
    }

    fn content_or_placeholder(&self, index: usize) -> String {
        self.versions
            .get(index)
            .map(|v| v.content().to_string())
            .unwrap_or_else(|_| EMPTY_DOCUMENT_PLACEHOLDER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn store(contents: &[&str]) -> VersionStore {
        VersionStore::from_versions(
            contents
                .iter()
                .enumerate()
                .map(|(i, c)| Version::at(*c, i as u64))
                .collect(),
        )
    }

    #[test]
    fn test_previous_and_next_clamp() {
        let versions = store(&["a", "b", "c"]);
        let nav = Navigator::new(&versions);

        assert_eq!(nav.previous(0), 0);
        assert_eq!(nav.next(2), 2);
        assert_eq!(nav.previous(2), 1);
        assert_eq!(nav.next(0), 1);
    }

    #[test]
    fn test_previous_next_inverse_inside_bounds() {
        let versions = store(&["a", "b", "c", "d"]);
        let nav = Navigator::new(&versions);

        for i in 1..=versions.latest_index() {
            assert_eq!(nav.next(nav.previous(i)), i);
        }
    }

    #[test]
    fn test_is_at_latest() {
        let versions = store(&["a", "b"]);
        let nav = Navigator::new(&versions);

        assert!(nav.is_at_latest(1));
        assert!(!nav.is_at_latest(0));
        assert!(!nav.can_go_previous(0));
        assert!(!nav.can_go_next(1));
    }

    #[test]
    fn test_diff_pair_selects_adjacent_versions() {
        let versions = store(&["a", "b", "c"]);
        let nav = Navigator::new(&versions);

        let pair = nav.diff_pair(2);
        assert_eq!(pair.old, "b");
        assert_eq!(pair.new, "c");
    }

    #[test]
    fn test_diff_pair_first_version_uses_placeholder() {
        let versions = store(&["first"]);
        let pair = Navigator::new(&versions).diff_pair(0);

        assert_eq!(pair.old, EMPTY_DOCUMENT_PLACEHOLDER);
        assert_eq!(pair.new, "first");
    }

    #[test]
    fn test_identical_versions_diff_empty() {
        let versions = store(&["same", "same"]);
        assert!(Navigator::new(&versions).diff_pair(1).is_unchanged());
    }

    #[test]
    fn test_empty_history() {
        let versions = VersionStore::new();
        let nav = Navigator::new(&versions);

        assert_eq!(nav.previous(0), 0);
        assert_eq!(nav.next(0), 0);
        assert!(nav.diff_pair(0).is_unchanged());
    }
}
