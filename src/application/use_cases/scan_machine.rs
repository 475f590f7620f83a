use crate::application::dto::{ScanRequest, ScanResponse, ScanStats};
use crate::ports::outbound::{
    Clock, CpeGenerator, GenerationMode, PackageCollector, PlanProbe, VulnerabilityDatabase,
};
use crate::scanning::domain::{is_valid_cpe, MachineReport};
use crate::scanning::services::{CpeCache, DeltaDetector, QuotaGovernor};
use crate::shared::Result;
use crate::storage::VulnerabilityStore;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Pause between uncached vulnerability lookups. The public database
/// documents roughly fifty requests per rolling thirty seconds; pacing
/// well under that keeps long scans off the throttle entirely.
const LOOKUP_PAUSE: Duration = Duration::from_millis(600);

/// ScanMachineUseCase - scans one machine end to end
///
/// Collection, delta detection, CPE resolution, and vulnerability
/// lookup, with every cache consulted before any external call. One
/// instance is shared across the whole fleet run so the translation
/// cache, the durable store, and the call-budget governor carry over
/// from machine to machine.
///
/// # Type Parameters
/// * `C` - PackageCollector implementation
/// * `G` - CpeGenerator implementation
/// * `P` - PlanProbe implementation
/// * `D` - VulnerabilityDatabase implementation
pub struct ScanMachineUseCase<C, G, P, D>
where
    C: PackageCollector,
    G: CpeGenerator,
    P: PlanProbe,
    D: VulnerabilityDatabase,
{
    collector: C,
    generator: G,
    probe: P,
    database: D,
    delta: DeltaDetector,
    cpe_cache: CpeCache,
    store: VulnerabilityStore,
    quota: Arc<QuotaGovernor>,
    clock: Arc<dyn Clock>,
    lookup_pause: Duration,
}

impl<C, G, P, D> ScanMachineUseCase<C, G, P, D>
where
    C: PackageCollector,
    G: CpeGenerator,
    P: PlanProbe,
    D: VulnerabilityDatabase,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        collector: C,
        generator: G,
        probe: P,
        database: D,
        delta: DeltaDetector,
        cpe_cache: CpeCache,
        store: VulnerabilityStore,
        quota: Arc<QuotaGovernor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            collector,
            generator,
            probe,
            database,
            delta,
            cpe_cache,
            store,
            quota,
            clock,
            lookup_pause: LOOKUP_PAUSE,
        }
    }

    /// Replaces the pacing pause between uncached lookups.
    pub fn with_lookup_pause(mut self, pause: Duration) -> Self {
        self.lookup_pause = pause;
        self
    }

    pub fn quota(&self) -> &QuotaGovernor {
        &self.quota
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn database(&self) -> &D {
        &self.database
    }

    pub async fn execute(&self, request: &ScanRequest) -> Result<ScanResponse> {
        let machine = &request.machine;
        let mut stats = ScanStats::default();

        let installed = self.collector.collect_packages(machine)?;
        stats.installed = installed.len();

        let delta = self.delta.compute_delta(&machine.name, &installed);
        stats.new_packages = delta.new_items.len();
        stats.removed_packages = delta.removed_items.len();

        let to_check: Vec<String> = if request.force_check {
            installed.clone()
        } else {
            delta.new_items.clone()
        };
        info!(
            machine = %machine.name,
            installed = stats.installed,
            checking = to_check.len(),
            force_check = request.force_check,
            "starting scan"
        );

        // Hardware collection failures degrade to a package-only scan.
        let hardware = match self.collector.collect_hardware(machine) {
            Ok(hardware) => hardware,
            Err(e) => {
                warn!(machine = %machine.name, error = %e, "hardware collection failed");
                None
            }
        };

        self.resolve_cpes(&to_check, GenerationMode::Package, &mut stats)
            .await;
        if let Some(ref model) = hardware {
            self.resolve_cpes(
                std::slice::from_ref(model),
                GenerationMode::Hardware,
                &mut stats,
            )
            .await;
        }

        // Deduplicate: shared libraries on many packages map to one CPE.
        let mut unique_cpes = BTreeSet::new();
        for component in to_check.iter().chain(hardware.iter()) {
            unique_cpes.extend(self.cpe_cache.lookup(component));
        }

        let mut report = MachineReport::new(machine.name.clone(), self.clock.now());
        self.check_cpes(&unique_cpes, &mut report, &mut stats).await;

        if request.dry_run {
            info!(machine = %machine.name, "dry run, snapshot not committed");
        } else {
            self.delta.commit_snapshot(&machine.name, &installed);
        }

        info!(
            machine = %machine.name,
            findings = report.total_findings(),
            "scan complete"
        );
        Ok(ScanResponse { report, stats })
    }

    /// Generates CPEs for the components missing from the translation
    /// cache, gated by the call-budget governor. Generation failures are
    /// not fatal: uncached components simply stay unresolved this scan.
    async fn resolve_cpes(
        &self,
        components: &[String],
        mode: GenerationMode,
        stats: &mut ScanStats,
    ) {
        let pending = self.cpe_cache.filter_needing_generation(components);
        if pending.is_empty() {
            return;
        }

        self.quota.ensure_tier(&self.probe).await;
        if !self.quota.acquire() {
            warn!(
                components = pending.len(),
                "mapping-service call budget exhausted, components left unresolved"
            );
            stats.skipped_quota += pending.len();
            return;
        }

        let output = match self.generator.generate(&pending, mode).await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "CPE generation failed, components left unresolved");
                return;
            }
        };
        stats.generated += pending.len();

        let cpe_lines = extract_cpe_lines(&output);
        if cpe_lines.len() != pending.len() {
            warn!(
                expected = pending.len(),
                received = cpe_lines.len(),
                "mapping service returned a mismatched line count, pairing positionally"
            );
        }

        let mut batch: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (component, cpe) in pending.iter().zip(cpe_lines) {
            if is_valid_cpe(&cpe) {
                batch.entry(component.clone()).or_default().push(cpe);
            } else {
                warn!(%component, %cpe, "discarding malformed generated CPE");
            }
        }
        self.cpe_cache.store(&batch);
    }

    /// Looks up each CPE against the durable store, hitting the external
    /// database only for CPEs never queried before.
    async fn check_cpes(
        &self,
        cpes: &BTreeSet<String>,
        report: &mut MachineReport,
        stats: &mut ScanStats,
    ) {
        let pb = ProgressBar::new(cpes.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("   {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} - {msg}")
                .expect("Failed to set progress bar template")
                .progress_chars("=>-"),
        );

        for cpe in cpes {
            pb.set_message(cpe.clone());
            let was_cached = self.store.is_cached(cpe).unwrap_or(false);

            match self
                .store
                .get_vulnerabilities(cpe, &self.database, self.clock.now())
                .await
            {
                Ok(records) => report.add_findings(cpe.clone(), records),
                Err(e) if e.is_not_found() => {
                    let flipped = self.cpe_cache.invalidate(cpe);
                    info!(%cpe, flipped, "CPE unknown to the database, invalidated");
                    stats.invalidated += 1;
                }
                Err(e) if e.is_transient() => {
                    warn!(%cpe, error = %e, "transient database failure, lookup skipped");
                    stats.skipped_transient += 1;
                }
                Err(e) => {
                    warn!(%cpe, error = %e, "vulnerability lookup failed");
                }
            }

            pb.inc(1);
            if !was_cached && !self.lookup_pause.is_zero() {
                tokio::time::sleep(self.lookup_pause).await;
            }
        }
        pb.finish_and_clear();
    }
}

/// Keeps the lines that look like CPE identifiers, in order. Prose the
/// mapping service wraps around its answer is dropped.
fn extract_cpe_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("cpe:"))
        .map(str::to_string)
        .collect()
}
