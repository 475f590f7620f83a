use crate::scanning::domain::{diff, PackageSnapshot, SnapshotDelta};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SNAPSHOT_FILENAME: &str = "installed_packages.json";

/// Detects what changed on a machine since the last committed scan.
///
/// The detector owns the per-machine snapshot files under
/// `<cache_dir>/machines/<machine>/installed_packages.json`. Reading the
/// delta and committing the new snapshot are deliberately separate steps:
/// a dry run consumes the delta and never commits, so the next real scan
/// still sees the same additions.
pub struct DeltaDetector {
    root: PathBuf,
}

impl DeltaDetector {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: cache_dir.into(),
        }
    }

    fn snapshot_path(&self, machine: &str) -> PathBuf {
        self.root
            .join("machines")
            .join(machine)
            .join(SNAPSHOT_FILENAME)
    }

    /// Compare the current snapshot against the last committed one.
    ///
    /// A missing or malformed persisted snapshot degrades to the
    /// first-run policy: everything is new, nothing was removed.
    pub fn compute_delta(&self, machine: &str, current: &[String]) -> SnapshotDelta {
        let previous = self.load_snapshot(machine).unwrap_or_default();
        let delta = diff(&previous, current);

        if !delta.new_items.is_empty() {
            info!(machine, count = delta.new_items.len(), "new packages detected");
        }
        if !delta.removed_items.is_empty() {
            info!(machine, count = delta.removed_items.len(), "packages removed");
        }
        if delta.is_unchanged() {
            info!(machine, "no changes in installed packages");
        }

        delta
    }

    /// Persist the current snapshot as the new baseline.
    ///
    /// Write failures are logged and swallowed: the scan already has its
    /// results, the cost is a full re-check next run.
    pub fn commit_snapshot(&self, machine: &str, current: &[String]) {
        let path = self.snapshot_path(machine);
        if let Err(e) = self.write_snapshot(&path, current) {
            warn!(machine, path = %path.display(), error = %e, "failed to persist snapshot");
        } else {
            debug!(machine, count = current.len(), "snapshot committed");
        }
    }

    fn load_snapshot(&self, machine: &str) -> Option<PackageSnapshot> {
        let path = self.snapshot_path(machine);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!(machine, error = %e, "no cached snapshot, treating all packages as new");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(machine, error = %e, "malformed snapshot, treating all packages as new");
                None
            }
        }
    }

    fn write_snapshot(&self, path: &Path, current: &[String]) -> crate::shared::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(current)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
