/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces the scanning core uses to reach
/// external systems (package collection, CPE generation, the vulnerability
/// database) and ambient facilities (wall-clock time).
pub mod clock;
pub mod cpe_generator;
pub mod package_collector;
pub mod plan_probe;
pub mod vulnerability_database;

pub use clock::{Clock, SystemClock};
pub use cpe_generator::{CpeGenerator, GenerationMode};
pub use package_collector::PackageCollector;
pub use plan_probe::{PlanProbe, ProbeError};
pub use vulnerability_database::{DatabaseError, VulnerabilityDatabase};
