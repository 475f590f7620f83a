/// Bundled package collector
///
/// Remote session mechanics are out of scope for the scanning core, so
/// the adapter shipped here reads exported package-manager listings from
/// local files named in the inventory. The sanitizer is shared with any
/// future remote collector: normalization of raw listings is the
/// collector's responsibility, not the delta detector's.
pub mod file_collector;
pub mod sanitize;

pub use file_collector::FileCollector;
pub use sanitize::sanitize_package_listing;
