use crate::scanning::domain::MachineReport;

/// Counters describing what one scan actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Packages in the current inventory.
    pub installed: usize,
    /// Packages added since the last committed snapshot.
    pub new_packages: usize,
    /// Packages removed since the last committed snapshot.
    pub removed_packages: usize,
    /// Components sent to the mapping service this scan.
    pub generated: usize,
    /// Components left unresolved because the call budget was exhausted.
    pub skipped_quota: usize,
    /// CPE lookups skipped after a transient database failure.
    pub skipped_transient: usize,
    /// CPEs invalidated after a definitive not-found response.
    pub invalidated: usize,
}

/// Result of one machine scan.
#[derive(Debug)]
pub struct ScanResponse {
    pub report: MachineReport,
    pub stats: ScanStats,
}

impl ScanResponse {
    pub fn has_findings(&self) -> bool {
        self.report.has_findings()
    }
}
