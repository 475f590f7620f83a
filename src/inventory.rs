//! Machine inventory support.
//!
//! The fleet to scan is described by a TOML inventory file with one
//! `[machines.<name>]` table per machine. Windows machines may be
//! listed but are skipped with a warning at scan time.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::shared::{Result, ScanError};

/// Operating system family of an inventoried machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineKind {
    Linux,
    Windows,
}

/// One machine in the fleet inventory.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineConfig {
    #[serde(default)]
    pub name: String,
    pub host: String,
    #[serde(default = "default_kind")]
    pub kind: MachineKind,
    /// Exported package-manager listing for this machine.
    pub packages_file: Option<PathBuf>,
    /// Hardware model descriptor, checked alongside the packages.
    pub hardware_model: Option<String>,
}

fn default_kind() -> MachineKind {
    MachineKind::Linux
}

#[derive(Debug, Deserialize)]
struct InventoryFile {
    machines: BTreeMap<String, MachineConfig>,
}

/// Loads and validates the inventory file at `path`.
///
/// Machines are returned in name order so scan output is stable
/// across runs.
pub fn load_inventory(path: &Path) -> Result<Vec<MachineConfig>> {
    if !path.is_file() {
        return Err(ScanError::InventoryNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read inventory file: {}", path.display()))?;

    let parsed: InventoryFile =
        toml::from_str(&content).map_err(|e| ScanError::InventoryParseError {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

    let mut machines = Vec::with_capacity(parsed.machines.len());
    for (name, mut machine) in parsed.machines {
        machine.name = name;
        machines.push(machine);
    }

    validate_inventory(&machines)?;
    Ok(machines)
}

fn validate_inventory(machines: &[MachineConfig]) -> Result<()> {
    if machines.is_empty() {
        bail!("Inventory contains no machines.\n\nHint: add at least one [machines.<name>] table.");
    }
    for machine in machines {
        if machine.host.trim().is_empty() {
            bail!(
                "Invalid inventory: machines.{}.host must not be empty.",
                machine.name
            );
        }
    }
    Ok(())
}
