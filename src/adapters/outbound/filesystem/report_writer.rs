use crate::scanning::domain::MachineReport;
use crate::shared::{Result, ScanError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Persists per-machine vulnerability reports under the cache directory.
pub struct ReportWriter {
    root: PathBuf,
}

impl ReportWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn report_path(&self, machine: &str) -> PathBuf {
        self.root
            .join("machines")
            .join(machine)
            .join("vulnerability_report.json")
    }

    /// Writes the report as pretty JSON, overwriting any previous report
    /// for the same machine. Returns the path written.
    pub fn write(&self, report: &MachineReport) -> Result<PathBuf> {
        let path = self.report_path(&report.machine);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ScanError::ReportWriteError {
                path: path.clone(),
                details: e.to_string(),
            })?;
        }

        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).map_err(|e| ScanError::ReportWriteError {
            path: path.clone(),
            details: e.to_string(),
        })?;

        info!(machine = %report.machine, path = %path.display(), "report written");
        Ok(path)
    }
}

/// True when a previous report exists for the machine.
pub fn report_exists(root: &Path, machine: &str) -> bool {
    root.join("machines")
        .join(machine)
        .join("vulnerability_report.json")
        .is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::domain::CveRecord;
    use tempfile::TempDir;

    fn sample_report() -> MachineReport {
        let mut report = MachineReport::new("web01", chrono::Utc::now());
        report.add_findings(
            "cpe:2.3:a:curl:curl:7.85.0:*:*:*:*:*:*:*",
            vec![CveRecord::new("CVE-2023-0001", "heap overflow", None)],
        );
        report
    }

    #[test]
    fn test_write_creates_nested_directories() {
        let temp = TempDir::new().unwrap();
        let writer = ReportWriter::new(temp.path());

        let path = writer.write(&sample_report()).unwrap();

        assert!(path.is_file());
        assert!(path.ends_with("machines/web01/vulnerability_report.json"));
        assert!(report_exists(temp.path(), "web01"));
    }

    #[test]
    fn test_written_report_round_trips() {
        let temp = TempDir::new().unwrap();
        let writer = ReportWriter::new(temp.path());

        let path = writer.write(&sample_report()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let parsed: MachineReport = serde_json::from_str(&content).unwrap();

        assert_eq!(parsed.machine, "web01");
        assert_eq!(parsed.total_findings(), 1);
    }

    #[test]
    fn test_rewrite_overwrites_previous_report() {
        let temp = TempDir::new().unwrap();
        let writer = ReportWriter::new(temp.path());

        writer.write(&sample_report()).unwrap();
        let empty = MachineReport::new("web01", chrono::Utc::now());
        let path = writer.write(&empty).unwrap();

        let parsed: MachineReport =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.total_findings(), 0);
    }

    #[test]
    fn test_report_exists_false_for_unknown_machine() {
        let temp = TempDir::new().unwrap();
        assert!(!report_exists(temp.path(), "db01"));
    }
}
