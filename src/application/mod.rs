/// Application layer - Use cases and DTOs
///
/// Orchestrates the scanning core: collection, delta detection, CPE
/// resolution, and vulnerability lookup for one machine at a time.
pub mod dto;
pub mod use_cases;
