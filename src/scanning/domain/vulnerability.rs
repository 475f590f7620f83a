use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One CVE as returned by the vulnerability database and persisted in
/// the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CveRecord {
    pub cve_id: String,
    pub description: String,
    pub published: Option<DateTime<Utc>>,
}

impl CveRecord {
    pub fn new(
        cve_id: impl Into<String>,
        description: impl Into<String>,
        published: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            cve_id: cve_id.into(),
            description: description.into(),
            published,
        }
    }
}

/// Vulnerability result set for one machine, grouped by CPE.
///
/// This is the produced interface of the scanning core: serialized as-is
/// to `vulnerability_report.json`. Only CPEs with at least one finding
/// appear; a queried-but-clean CPE lives in the durable store, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineReport {
    pub machine: String,
    pub generated_at: DateTime<Utc>,
    pub findings: BTreeMap<String, Vec<CveRecord>>,
}

impl MachineReport {
    pub fn new(machine: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            machine: machine.into(),
            generated_at,
            findings: BTreeMap::new(),
        }
    }

    /// Record findings for a CPE. Empty record sets are dropped.
    pub fn add_findings(&mut self, cpe: impl Into<String>, records: Vec<CveRecord>) {
        if !records.is_empty() {
            self.findings.insert(cpe.into(), records);
        }
    }

    pub fn total_findings(&self) -> usize {
        self.findings.values().map(Vec::len).sum()
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_sets_are_dropped() {
        let mut report = MachineReport::new("m1", Utc::now());
        report.add_findings("cpe:2.3:a:curl:curl:7.85.0:*:*:*:*:*:*:*", vec![]);
        assert!(!report.has_findings());
        assert_eq!(report.total_findings(), 0);
    }

    #[test]
    fn test_total_findings_counts_across_cpes() {
        let mut report = MachineReport::new("m1", Utc::now());
        report.add_findings(
            "cpe:2.3:a:curl:curl:7.85.0:*:*:*:*:*:*:*",
            vec![
                CveRecord::new("CVE-2023-0001", "first", None),
                CveRecord::new("CVE-2023-0002", "second", None),
            ],
        );
        report.add_findings(
            "cpe:2.3:a:openssl:openssl:1.1.1w:*:*:*:*:*:*:*",
            vec![CveRecord::new("CVE-2023-0003", "third", None)],
        );
        assert_eq!(report.total_findings(), 3);
        assert!(report.has_findings());
    }

    #[test]
    fn test_report_serializes_findings_by_cpe() {
        let mut report = MachineReport::new("web01", Utc::now());
        report.add_findings(
            "cpe:2.3:a:curl:curl:7.85.0:*:*:*:*:*:*:*",
            vec![CveRecord::new("CVE-2023-38545", "SOCKS5 heap overflow", None)],
        );
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("web01"));
        assert!(json.contains("CVE-2023-38545"));
        assert!(json.contains("cpe:2.3:a:curl:curl:7.85.0"));
    }
}
