use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems and cron jobs to distinguish between
/// different types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - scan completed and no vulnerabilities were found
    Success = 0,
    /// Scan completed and at least one vulnerability was found
    VulnerabilitiesDetected = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (connectivity check failed, unreadable inventory, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::VulnerabilitiesDetected => write!(f, "Vulnerabilities Detected (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for fleet scanning.
///
/// Uses thiserror to derive Display and Error traits automatically.
/// Cache-layer failures never appear here: they degrade in place and
/// only cost the caching benefit of the next run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Inventory file not found: {path}\n\nHint: pass --inventory with the path to your machine inventory")]
    InventoryNotFound { path: PathBuf },

    #[error("Failed to parse inventory file: {path}\nDetails: {details}")]
    InventoryParseError { path: PathBuf, details: String },

    #[error("Vulnerability database unreachable: {details}")]
    ConnectivityCheckFailed { details: String },

    #[error("Package collection failed for {machine}: {details}")]
    CollectionFailed { machine: String, details: String },

    #[error("Failed to write report: {path}\nDetails: {details}")]
    ReportWriteError { path: PathBuf, details: String },
}
