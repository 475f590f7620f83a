use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of identifiers installed on one machine at scan time.
///
/// Order is irrelevant; the snapshot is replaced wholesale on every
/// committed scan. Normalization happens in the collector, so two
/// textual variants of the same component are distinct identifiers here.
pub type PackageSnapshot = Vec<String>;

/// Additions and removals between two snapshots of the same machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDelta {
    pub new_items: Vec<String>,
    pub removed_items: Vec<String>,
}

impl SnapshotDelta {
    pub fn is_unchanged(&self) -> bool {
        self.new_items.is_empty() && self.removed_items.is_empty()
    }
}

/// Set difference between a previous and a current snapshot.
///
/// Output vectors are sorted so downstream logs and cached batches are
/// deterministic across runs. Duplicates collapse (set semantics).
pub fn diff(previous: &[String], current: &[String]) -> SnapshotDelta {
    let previous_set: BTreeSet<&str> = previous.iter().map(String::as_str).collect();
    let current_set: BTreeSet<&str> = current.iter().map(String::as_str).collect();

    SnapshotDelta {
        new_items: current_set
            .difference(&previous_set)
            .map(|s| s.to_string())
            .collect(),
        removed_items: previous_set
            .difference(&current_set)
            .map(|s| s.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_scan_everything_is_new() {
        let delta = diff(&[], &snap(&["a", "b", "c"]));
        assert_eq!(delta.new_items, snap(&["a", "b", "c"]));
        assert!(delta.removed_items.is_empty());
    }

    #[test]
    fn test_second_scan_detects_additions_and_removals() {
        let delta = diff(&snap(&["a", "b", "c"]), &snap(&["b", "c", "d"]));
        assert_eq!(delta.new_items, snap(&["d"]));
        assert_eq!(delta.removed_items, snap(&["a"]));
    }

    #[test]
    fn test_unchanged_snapshot() {
        let delta = diff(&snap(&["a", "b"]), &snap(&["b", "a"]));
        assert!(delta.is_unchanged());
    }

    #[test]
    fn test_diff_is_antisymmetric() {
        let a = snap(&["curl-7.85.0", "openssl-1.1.1w", "git-2.42.0"]);
        let b = snap(&["curl-7.85.0", "nano-7.2", "git-2.43.0"]);

        let forward = diff(&a, &b);
        let backward = diff(&b, &a);

        assert_eq!(forward.new_items, backward.removed_items);
        assert_eq!(forward.removed_items, backward.new_items);
    }

    #[test]
    fn test_whitespace_variants_are_distinct_identifiers() {
        // Normalization is the collector's job, not the detector's.
        let delta = diff(&snap(&["curl-7.85.0"]), &snap(&["curl-7.85.0 "]));
        assert_eq!(delta.new_items, snap(&["curl-7.85.0 "]));
        assert_eq!(delta.removed_items, snap(&["curl-7.85.0"]));
    }

    #[test]
    fn test_duplicates_collapse() {
        let delta = diff(&[], &snap(&["a", "a", "b"]));
        assert_eq!(delta.new_items, snap(&["a", "b"]));
    }
}
