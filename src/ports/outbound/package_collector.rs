use crate::inventory::MachineConfig;
use crate::shared::Result;

/// Source of the raw inventory for one machine.
///
/// Remote session mechanics (SSH, WinRM, agents) live entirely behind
/// this port. Implementations are responsible for normalization: the
/// identifiers they return are compared verbatim by the delta detector.
pub trait PackageCollector: Send + Sync {
    /// All currently installed packages, as `name-version` identifiers.
    fn collect_packages(&self, machine: &MachineConfig) -> Result<Vec<String>>;

    /// An optional hardware model descriptor for the machine.
    fn collect_hardware(&self, machine: &MachineConfig) -> Result<Option<String>>;
}
