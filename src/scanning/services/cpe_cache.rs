use crate::scanning::domain::CpeEntry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const CACHE_FILENAME: &str = "cpe_cache.json";

/// Global component-name to CPE translation cache.
///
/// Shields the mapping service from redundant calls: a component that
/// resolved once keeps its CPEs across machines and scans. The backing
/// file is a single JSON object (component name to entry list); the
/// in-memory map is the source of truth during a run and every mutation
/// writes the file back best-effort. An unreadable or unwritable file
/// never fails a scan, it only costs the caching benefit.
pub struct CpeCache {
    path: PathBuf,
    entries: DashMap<String, Vec<CpeEntry>>,
}

impl CpeCache {
    /// Load the cache from `<cache_dir>/cpe_cache.json`.
    ///
    /// A missing file starts an empty cache. A malformed file is logged
    /// and also starts empty (the next successful write replaces it).
    pub fn open(cache_dir: &Path) -> Self {
        let path = cache_dir.join(CACHE_FILENAME);
        let entries = DashMap::new();

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, Vec<CpeEntry>>>(&content) {
                Ok(data) => {
                    for (name, cpes) in data {
                        entries.insert(name, cpes);
                    }
                    debug!(path = %path.display(), components = entries.len(), "CPE cache loaded");
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "malformed CPE cache, starting fresh");
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no CPE cache file yet");
            }
        }

        Self { path, entries }
    }

    /// Valid CPEs previously produced for a component.
    ///
    /// Empty means "needs generation": either never resolved, or every
    /// cached CPE was invalidated by a definitive not-found.
    pub fn lookup(&self, component: &str) -> Vec<String> {
        self.entries
            .get(component)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.valid)
                    .map(|e| e.cpe.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cache freshly generated CPEs, all marked valid.
    ///
    /// Per component the supplied list replaces any prior entry set
    /// wholesale, so storing the same batch twice is idempotent.
    pub fn store(&self, batch: &BTreeMap<String, Vec<String>>) {
        if batch.is_empty() {
            return;
        }
        for (component, cpes) in batch {
            let entries = cpes.iter().map(CpeEntry::valid).collect();
            self.entries.insert(component.clone(), entries);
        }
        info!(components = batch.len(), "CPE cache updated");
        self.persist();
    }

    /// Flip `valid = false` for every entry matching a CPE string.
    ///
    /// This is keyed by CPE across all components because the caller
    /// learned invalidity from the vulnerability database and only knows
    /// the CPE string. Returns the number of entries flipped.
    pub fn invalidate(&self, cpe: &str) -> usize {
        let mut flipped = 0;
        for mut item in self.entries.iter_mut() {
            for entry in item.value_mut().iter_mut() {
                if entry.cpe == cpe && entry.valid {
                    entry.valid = false;
                    flipped += 1;
                }
            }
        }
        if flipped > 0 {
            info!(cpe, entries = flipped, "marked CPE invalid");
            self.persist();
        }
        flipped
    }

    /// The subset of components whose `lookup` is empty.
    pub fn filter_needing_generation(&self, components: &[String]) -> Vec<String> {
        let needing: Vec<String> = components
            .iter()
            .filter(|c| self.lookup(c).is_empty())
            .cloned()
            .collect();
        info!(
            needing = needing.len(),
            total = components.len(),
            "components needing CPE generation"
        );
        needing
    }

    fn persist(&self) {
        let data: BTreeMap<String, Vec<CpeEntry>> = self
            .entries
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect();

        let result = serde_json::to_string_pretty(&data)
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, json)?;
                Ok(())
            });

        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "failed to persist CPE cache");
        }
    }

    #[cfg(test)]
    pub fn component_count(&self) -> usize {
        self.entries.len()
    }
}
