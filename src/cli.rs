use clap::Parser;
use std::path::PathBuf;

/// Scan a fleet of machines for known vulnerabilities
#[derive(Parser, Debug)]
#[command(name = "cpescan")]
#[command(version)]
#[command(
    about = "Scan a fleet of machines for known vulnerabilities",
    long_about = None
)]
pub struct Args {
    /// Path to the machine inventory file
    #[arg(short, long, default_value = "inventory.toml")]
    pub inventory: PathBuf,

    /// Path to the configuration file (defaults to auto-discovery)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Remove all cached data before scanning
    #[arg(long)]
    pub flush_cache: bool,

    /// Check every installed package, not just packages new since the last scan
    #[arg(long)]
    pub force_check: bool,

    /// Run the full pipeline without committing package snapshots
    #[arg(long)]
    pub dry_run: bool,

    /// Refresh stored CVE descriptions modified in the last 24 hours
    #[arg(long)]
    pub refresh: bool,

    /// Scan only the named machine (may be repeated)
    #[arg(short, long = "machine", value_name = "NAME")]
    pub machines: Vec<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
