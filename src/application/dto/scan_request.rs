use crate::inventory::MachineConfig;

/// Input for one machine scan.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub machine: MachineConfig,
    /// Check every installed package, not just the delta.
    pub force_check: bool,
    /// Run the full pipeline but leave the snapshot uncommitted.
    pub dry_run: bool,
}

impl ScanRequest {
    pub fn new(machine: MachineConfig) -> Self {
        Self {
            machine,
            force_check: false,
            dry_run: false,
        }
    }

    pub fn with_force_check(mut self, force_check: bool) -> Self {
        self.force_check = force_check;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
