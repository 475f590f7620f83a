/// Ports module defining interfaces for hexagonal architecture
///
/// Only outbound (driven) ports exist in this crate: the scan orchestrator
/// is driven directly by the CLI, while every external collaborator
/// (package collector, CPE mapping service, vulnerability database, clock)
/// sits behind one of these interfaces.
pub mod outbound;
