use crate::shared::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Removes every cache artifact under `cache_dir`, forcing the next scan
/// to rebuild from scratch. Returns a label for each artifact removed.
///
/// Missing files are not an error; flushing an empty cache directory
/// simply returns an empty list.
pub fn flush_caches(cache_dir: &Path) -> Result<Vec<String>> {
    let mut flushed = Vec::new();

    let translation_cache = cache_dir.join("cpe_cache.json");
    if remove_file_if_present(&translation_cache)? {
        flushed.push("CPE translation cache".to_string());
    }

    // SQLite database plus its WAL sidecar files.
    let mut removed_db = false;
    for name in ["vulnerability_cache.db", "vulnerability_cache.db-wal", "vulnerability_cache.db-shm"] {
        removed_db |= remove_file_if_present(&cache_dir.join(name))?;
    }
    if removed_db {
        flushed.push("vulnerability database".to_string());
    }

    let machines_dir = cache_dir.join("machines");
    if machines_dir.is_dir() {
        for entry in fs::read_dir(&machines_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let machine = entry.file_name().to_string_lossy().into_owned();
            let mut removed_any = false;
            removed_any |= remove_file_if_present(&entry.path().join("installed_packages.json"))?;
            removed_any |= remove_file_if_present(&entry.path().join("vulnerability_report.json"))?;
            if removed_any {
                flushed.push(format!("snapshot for {machine}"));
            }
        }
    }

    Ok(flushed)
}

fn remove_file_if_present(path: &Path) -> Result<bool> {
    if path.is_file() {
        fs::remove_file(path)?;
        debug!(path = %path.display(), "removed cache file");
        Ok(true)
    } else {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flush_empty_directory() {
        let temp = TempDir::new().unwrap();
        let flushed = flush_caches(temp.path()).unwrap();
        assert!(flushed.is_empty());
    }

    #[test]
    fn test_flush_removes_all_artifacts() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("cpe_cache.json"), "{}").unwrap();
        std::fs::write(temp.path().join("vulnerability_cache.db"), "").unwrap();
        std::fs::write(temp.path().join("vulnerability_cache.db-wal"), "").unwrap();
        let machine_dir = temp.path().join("machines/web01");
        std::fs::create_dir_all(&machine_dir).unwrap();
        std::fs::write(machine_dir.join("installed_packages.json"), "[]").unwrap();
        std::fs::write(machine_dir.join("vulnerability_report.json"), "{}").unwrap();

        let flushed = flush_caches(temp.path()).unwrap();

        assert_eq!(flushed.len(), 3);
        assert!(flushed.contains(&"CPE translation cache".to_string()));
        assert!(flushed.contains(&"vulnerability database".to_string()));
        assert!(flushed.contains(&"snapshot for web01".to_string()));
        assert!(!temp.path().join("cpe_cache.json").exists());
        assert!(!machine_dir.join("installed_packages.json").exists());
    }

    #[test]
    fn test_flush_is_idempotent() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("cpe_cache.json"), "{}").unwrap();

        let first = flush_caches(temp.path()).unwrap();
        let second = flush_caches(temp.path()).unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_flush_leaves_unrelated_files_alone() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("notes.txt"), "keep me").unwrap();

        flush_caches(temp.path()).unwrap();

        assert!(temp.path().join("notes.txt").exists());
    }
}
