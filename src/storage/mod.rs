/// Durable vulnerability store - SQLite-backed cache-aside layer
///
/// The presence of a `cpe_index` row is the authoritative "already
/// queried" signal; `vulnerabilities` rows hold the CVE records found
/// for each indexed CPE (possibly zero).
mod error;
mod schema;
mod vuln_store;

pub use error::StoreError;
pub use vuln_store::VulnerabilityStore;
