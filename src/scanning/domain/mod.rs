pub mod cpe;
pub mod snapshot;
pub mod vulnerability;

pub use cpe::{is_valid_cpe, CpeEntry};
pub use snapshot::{diff, PackageSnapshot, SnapshotDelta};
pub use vulnerability::{CveRecord, MachineReport};
