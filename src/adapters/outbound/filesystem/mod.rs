/// Filesystem adapters - report output and cache maintenance
pub mod flush;
pub mod report_writer;

pub use flush::flush_caches;
pub use report_writer::{report_exists, ReportWriter};
