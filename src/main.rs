mod adapters;
mod application;
mod cli;
mod config;
mod inventory;
mod ports;
mod scanning;
mod shared;
mod storage;

use adapters::outbound::collector::FileCollector;
use adapters::outbound::console::Console;
use adapters::outbound::filesystem::{flush_caches, ReportWriter};
use adapters::outbound::network::{GeminiClient, NvdClient};
use application::dto::ScanRequest;
use application::use_cases::ScanMachineUseCase;
use cli::Args;
use config::Settings;
use inventory::{MachineConfig, MachineKind};
use ports::outbound::{Clock, SystemClock};
use scanning::services::{CpeCache, DeltaDetector, QuotaGovernor, QuotaLimits};
use shared::{ExitCode, Result, ScanError};
use std::path::Path;
use std::process;
use std::sync::Arc;
use storage::VulnerabilityStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code.as_i32()),
        Err(e) => {
            eprintln!("\nAn error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run() -> Result<ExitCode> {
    let args = Args::parse_args();

    let config_file = match args.config.as_deref() {
        Some(path) => Some(config::load_config_from_path(path)?),
        None => config::discover_config(Path::new("."))?,
    };
    let settings = Settings::resolve(config_file)?;

    std::fs::create_dir_all(&settings.cache_dir)?;

    if args.flush_cache {
        let flushed = flush_caches(&settings.cache_dir)?;
        Console::section("Cache flush");
        if flushed.is_empty() {
            Console::info("nothing to flush");
        }
        for label in &flushed {
            Console::success(&format!("removed {}", label));
        }
    }

    let machines = select_machines(inventory::load_inventory(&args.inventory)?, &args.machines)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let database = NvdClient::new(settings.nvd_api_key.clone())?;

    // Hard stop before any per-machine work: scanning against an
    // unreachable database would burn the mapping quota for nothing.
    database
        .connectivity_check()
        .await
        .map_err(|e| ScanError::ConnectivityCheckFailed {
            details: e.to_string(),
        })?;

    let store = VulnerabilityStore::open(&settings.cache_dir.join("vulnerability_cache.db"))?;

    if args.refresh {
        let updated = store.refresh_modified(&database, clock.now()).await?;
        Console::section("Refresh");
        Console::info(&format!("{} stored CVE descriptions updated", updated));
    }

    let mut limits = QuotaLimits::default();
    if let Some(per_minute) = settings.quota_per_minute {
        limits.per_minute = per_minute;
    }
    if let Some(per_day) = settings.quota_per_day {
        limits.per_day = per_day;
    }

    let generator = GeminiClient::new(settings.gemini_api_key.clone(), settings.model.clone())?;
    let probe = GeminiClient::new(settings.gemini_api_key.clone(), settings.model.clone())?;

    let use_case = ScanMachineUseCase::new(
        FileCollector,
        generator,
        probe,
        database,
        DeltaDetector::new(&settings.cache_dir),
        CpeCache::open(&settings.cache_dir),
        store,
        Arc::new(QuotaGovernor::new(limits, clock.clone())),
        clock,
    );
    let writer = ReportWriter::new(&settings.cache_dir);

    let mut any_findings = false;
    let mut any_failures = false;

    for machine in &machines {
        Console::section(&format!("Scanning {}", machine.name));

        if machine.kind == MachineKind::Windows {
            Console::warning("Windows machines are not supported yet, skipping");
            continue;
        }

        let request = ScanRequest::new(machine.clone())
            .with_force_check(args.force_check)
            .with_dry_run(args.dry_run);

        match use_case.execute(&request).await {
            Ok(response) => {
                summarize(&machine.name, &response);
                if response.has_findings() {
                    any_findings = true;
                }
                writer.write(&response.report)?;
            }
            Err(e) => {
                Console::error(&format!("scan failed: {}", e));
                any_failures = true;
            }
        }
    }

    let status = use_case.quota().status();
    Console::section("Quota");
    Console::info(&format!(
        "{:?} tier: {}/{} calls today, {}/{} in the last minute",
        status.tier,
        status.calls_today,
        status.daily_limit,
        status.calls_last_minute,
        status.minute_limit
    ));

    if any_failures {
        Ok(ExitCode::ApplicationError)
    } else if any_findings {
        Ok(ExitCode::VulnerabilitiesDetected)
    } else {
        Ok(ExitCode::Success)
    }
}

fn select_machines(
    mut machines: Vec<MachineConfig>,
    filter: &[String],
) -> Result<Vec<MachineConfig>> {
    if filter.is_empty() {
        return Ok(machines);
    }
    for name in filter {
        if !machines.iter().any(|m| &m.name == name) {
            anyhow::bail!("Machine '{}' is not in the inventory.", name);
        }
    }
    machines.retain(|m| filter.contains(&m.name));
    Ok(machines)
}

fn summarize(machine: &str, response: &application::dto::ScanResponse) {
    let stats = &response.stats;
    Console::info(&format!(
        "{} installed, {} new, {} removed",
        stats.installed, stats.new_packages, stats.removed_packages
    ));
    if stats.skipped_quota > 0 {
        Console::warning(&format!(
            "{} components left unresolved (call budget exhausted)",
            stats.skipped_quota
        ));
    }
    if stats.skipped_transient > 0 {
        Console::warning(&format!(
            "{} lookups skipped after transient failures",
            stats.skipped_transient
        ));
    }

    if response.has_findings() {
        for (cpe, records) in &response.report.findings {
            Console::finding(cpe, records.len());
        }
    } else {
        Console::success(&format!("{}: no known vulnerabilities", machine));
    }
}
