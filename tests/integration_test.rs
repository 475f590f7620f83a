//! Integration tests for the full scan pipeline.
//!
//! The package collector reads real listing files from a temporary
//! directory; the two network ports are replaced with in-process fakes
//! so the pipeline from raw listing to written report runs end to end
//! without touching the network.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cpescan::ports::outbound::{
    CpeGenerator, DatabaseError, GenerationMode, PlanProbe, ProbeError, VulnerabilityDatabase,
};
use cpescan::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const CURL_CPE: &str = "cpe:2.3:a:curl:curl:7.81.0:*:*:*:*:*:*:*";
const BASH_CPE: &str = "cpe:2.3:a:gnu:bash:5.2.26:*:*:*:*:*:*:*";

struct StubGenerator {
    mapping: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StubGenerator {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            mapping: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CpeGenerator for StubGenerator {
    async fn generate(
        &self,
        components: &[String],
        _mode: GenerationMode,
    ) -> cpescan::shared::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(components
            .iter()
            .map(|c| self.mapping.get(c).cloned().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

struct FreeTierProbe;

#[async_trait]
impl PlanProbe for FreeTierProbe {
    async fn probe_premium(&self) -> std::result::Result<(), ProbeError> {
        Err(ProbeError::PermissionDenied {
            details: "probe returned 403".to_string(),
        })
    }
}

struct StubDatabase {
    vulnerable: HashMap<String, Vec<CveRecord>>,
    not_found: Vec<String>,
    calls: AtomicUsize,
}

impl StubDatabase {
    fn new() -> Self {
        Self {
            vulnerable: HashMap::new(),
            not_found: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn with_records(mut self, cpe: &str, records: Vec<CveRecord>) -> Self {
        self.vulnerable.insert(cpe.to_string(), records);
        self
    }

    fn with_not_found(mut self, cpe: &str) -> Self {
        self.not_found.push(cpe.to_string());
        self
    }
}

#[async_trait]
impl VulnerabilityDatabase for StubDatabase {
    async fn search_by_cpe(
        &self,
        cpe: &str,
    ) -> std::result::Result<Vec<CveRecord>, DatabaseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.not_found.iter().any(|c| c == cpe) {
            return Err(DatabaseError::NotFound {
                cpe: cpe.to_string(),
            });
        }
        Ok(self.vulnerable.get(cpe).cloned().unwrap_or_default())
    }

    async fn search_modified_between(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> std::result::Result<Vec<CveRecord>, DatabaseError> {
        Ok(vec![])
    }
}

/// Writes an apt-style listing and returns the machine pointing at it.
fn machine_with_listing(dir: &TempDir, name: &str, listing: &str) -> MachineConfig {
    let path = dir.path().join(format!("{name}.txt"));
    std::fs::write(&path, listing).unwrap();
    MachineConfig {
        name: name.to_string(),
        host: "192.0.2.10".to_string(),
        kind: MachineKind::Linux,
        packages_file: Some(path),
        hardware_model: None,
    }
}

fn build_use_case(
    cache_dir: &std::path::Path,
    generator: StubGenerator,
    database: StubDatabase,
) -> ScanMachineUseCase<FileCollector, StubGenerator, FreeTierProbe, StubDatabase> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    ScanMachineUseCase::new(
        FileCollector,
        generator,
        FreeTierProbe,
        database,
        DeltaDetector::new(cache_dir),
        CpeCache::open(cache_dir),
        VulnerabilityStore::open(&cache_dir.join("vulnerability_cache.db")).unwrap(),
        Arc::new(QuotaGovernor::new(QuotaLimits::default(), clock.clone())),
        clock,
    )
    .with_lookup_pause(Duration::ZERO)
}

#[tokio::test]
async fn test_listing_to_report_pipeline() {
    let temp = TempDir::new().unwrap();
    let machine = machine_with_listing(
        &temp,
        "web01",
        "Listing... Done\ncurl/jammy-updates,now 7.81.0 amd64 [installed]\n",
    );

    let use_case = build_use_case(
        temp.path(),
        StubGenerator::new(&[("curl-7.81.0", CURL_CPE)]),
        StubDatabase::new().with_records(
            CURL_CPE,
            vec![CveRecord::new("CVE-2023-38545", "SOCKS5 heap overflow", None)],
        ),
    );

    let response = use_case
        .execute(&ScanRequest::new(machine))
        .await
        .unwrap();

    assert!(response.has_findings());
    assert_eq!(response.stats.installed, 1);
    assert_eq!(response.report.findings[CURL_CPE].len(), 1);

    let writer = ReportWriter::new(temp.path());
    let path = writer.write(&response.report).unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(written["machine"], "web01");
    assert!(written["findings"][CURL_CPE].is_array());
}

#[tokio::test]
async fn test_repeat_scan_is_fully_cached() {
    let temp = TempDir::new().unwrap();
    let machine = machine_with_listing(&temp, "web01", "bash.x86_64 5.2.26 @anaconda\n");

    let use_case = build_use_case(
        temp.path(),
        StubGenerator::new(&[("bash-5.2.26", BASH_CPE)]),
        StubDatabase::new(),
    );

    use_case
        .execute(&ScanRequest::new(machine.clone()))
        .await
        .unwrap();
    let second = use_case.execute(&ScanRequest::new(machine)).await.unwrap();

    assert_eq!(second.stats.new_packages, 0);
    assert_eq!(second.stats.generated, 0);
    assert_eq!(use_case.generator().calls.load(Ordering::SeqCst), 1);
    assert_eq!(use_case.database().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_caches_survive_process_restart() {
    let temp = TempDir::new().unwrap();
    let machine = machine_with_listing(&temp, "web01", "bash.x86_64 5.2.26 @anaconda\n");

    {
        let use_case = build_use_case(
            temp.path(),
            StubGenerator::new(&[("bash-5.2.26", BASH_CPE)]),
            StubDatabase::new(),
        );
        use_case
            .execute(&ScanRequest::new(machine.clone()))
            .await
            .unwrap();
    }

    // Fresh instances over the same cache directory: everything hits.
    let use_case = build_use_case(temp.path(), StubGenerator::new(&[]), StubDatabase::new());
    let response = use_case.execute(&ScanRequest::new(machine)).await.unwrap();

    assert_eq!(response.stats.new_packages, 0);
    assert_eq!(use_case.generator().calls.load(Ordering::SeqCst), 0);
    assert_eq!(use_case.database().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_not_found_invalidation_is_durable() {
    let temp = TempDir::new().unwrap();
    let machine = machine_with_listing(&temp, "web01", "curl/jammy 7.81.0 amd64\n");

    let use_case = build_use_case(
        temp.path(),
        StubGenerator::new(&[("curl-7.81.0", CURL_CPE)]),
        StubDatabase::new().with_not_found(CURL_CPE),
    );
    let response = use_case
        .execute(&ScanRequest::new(machine))
        .await
        .unwrap();
    assert_eq!(response.stats.invalidated, 1);

    // The invalid flag reached the cache file on disk.
    let raw = std::fs::read_to_string(temp.path().join("cpe_cache.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["curl-7.81.0"][0]["valid"], false);
}

#[tokio::test]
async fn test_flush_then_rescan_regenerates() {
    let temp = TempDir::new().unwrap();
    let machine = machine_with_listing(&temp, "web01", "curl/jammy 7.81.0 amd64\n");

    {
        let use_case = build_use_case(
            temp.path(),
            StubGenerator::new(&[("curl-7.81.0", CURL_CPE)]),
            StubDatabase::new(),
        );
        use_case
            .execute(&ScanRequest::new(machine.clone()))
            .await
            .unwrap();
    }

    let flushed = cpescan::adapters::outbound::filesystem::flush_caches(temp.path()).unwrap();
    assert!(!flushed.is_empty());

    let use_case = build_use_case(
        temp.path(),
        StubGenerator::new(&[("curl-7.81.0", CURL_CPE)]),
        StubDatabase::new(),
    );
    let response = use_case
        .execute(&ScanRequest::new(machine))
        .await
        .unwrap();

    // Everything is treated as new again.
    assert_eq!(response.stats.new_packages, 1);
    assert_eq!(response.stats.generated, 1);
    assert_eq!(use_case.database().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_report_written_per_machine() {
    let temp = TempDir::new().unwrap();
    let web = machine_with_listing(&temp, "web01", "curl/jammy 7.81.0 amd64\n");
    let db = machine_with_listing(&temp, "db01", "bash.x86_64 5.2.26 @anaconda\n");

    let use_case = build_use_case(
        temp.path(),
        StubGenerator::new(&[("curl-7.81.0", CURL_CPE), ("bash-5.2.26", BASH_CPE)]),
        StubDatabase::new().with_records(
            CURL_CPE,
            vec![CveRecord::new("CVE-2023-38545", "SOCKS5 heap overflow", None)],
        ),
    );
    let writer = ReportWriter::new(temp.path());

    for machine in [web, db] {
        let response = use_case
            .execute(&ScanRequest::new(machine))
            .await
            .unwrap();
        writer.write(&response.report).unwrap();
    }

    let web_report: MachineReport = serde_json::from_str(
        &std::fs::read_to_string(temp.path().join("machines/web01/vulnerability_report.json"))
            .unwrap(),
    )
    .unwrap();
    let db_report: MachineReport = serde_json::from_str(
        &std::fs::read_to_string(temp.path().join("machines/db01/vulnerability_report.json"))
            .unwrap(),
    )
    .unwrap();

    assert!(web_report.has_findings());
    assert!(!db_report.has_findings());
}

#[tokio::test]
async fn test_missing_listing_file_fails_collection() {
    let temp = TempDir::new().unwrap();
    let machine = MachineConfig {
        name: "ghost".to_string(),
        host: "192.0.2.99".to_string(),
        kind: MachineKind::Linux,
        packages_file: Some(PathBuf::from("/nonexistent/listing.txt")),
        hardware_model: None,
    };

    let use_case = build_use_case(temp.path(), StubGenerator::new(&[]), StubDatabase::new());
    let result = use_case.execute(&ScanRequest::new(machine)).await;

    assert!(result.is_err());
}
