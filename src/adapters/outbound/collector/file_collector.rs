use super::sanitize_package_listing;
use crate::inventory::MachineConfig;
use crate::ports::outbound::PackageCollector;
use crate::shared::{Result, ScanError};
use std::fs;
use tracing::debug;

/// Collects package inventories from listing files on disk.
///
/// Each machine's inventory entry points at a file holding the raw
/// output of its package manager (`apt list --installed` and friends),
/// exported by whatever transport the fleet uses. The raw listing is
/// sanitized into `name-version` identifiers before it leaves here.
pub struct FileCollector;

impl PackageCollector for FileCollector {
    fn collect_packages(&self, machine: &MachineConfig) -> Result<Vec<String>> {
        let path = machine
            .packages_file
            .as_ref()
            .ok_or_else(|| ScanError::CollectionFailed {
                machine: machine.name.clone(),
                details: "no packages_file configured".to_string(),
            })?;

        let raw = fs::read_to_string(path).map_err(|e| ScanError::CollectionFailed {
            machine: machine.name.clone(),
            details: format!("{}: {}", path.display(), e),
        })?;

        let packages = sanitize_package_listing(&raw);
        debug!(machine = %machine.name, count = packages.len(), "collected packages");
        Ok(packages)
    }

    fn collect_hardware(&self, machine: &MachineConfig) -> Result<Option<String>> {
        Ok(machine.hardware_model.clone())
    }
}
