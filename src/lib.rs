//! cpescan - fleet vulnerability scanner
//!
//! This library maps installed packages and hardware to CPE 2.3
//! identifiers and checks them against a vulnerability database,
//! following hexagonal architecture principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`scanning`): Delta detection, CPE validation,
//!   the translation cache, and the call-budget governor
//! - **Application Layer** (`application`): Use cases and DTOs
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Storage** (`storage`): The durable vulnerability store
//! - **Shared** (`shared`): Common utilities and error types
//!
//! Every cache is consulted before any external call: the per-machine
//! snapshot narrows the work to new packages, the translation cache
//! avoids repeated mapping-service calls, and the durable store avoids
//! repeated database queries.

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod inventory;
pub mod ports;
pub mod scanning;
pub mod shared;
pub mod storage;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::adapters::outbound::collector::FileCollector;
    pub use crate::adapters::outbound::filesystem::ReportWriter;
    pub use crate::adapters::outbound::network::{GeminiClient, NvdClient};
    pub use crate::application::dto::{ScanRequest, ScanResponse, ScanStats};
    pub use crate::application::use_cases::ScanMachineUseCase;
    pub use crate::inventory::{load_inventory, MachineConfig, MachineKind};
    pub use crate::ports::outbound::{Clock, SystemClock};
    pub use crate::scanning::domain::{CveRecord, MachineReport};
    pub use crate::scanning::services::{
        CpeCache, DeltaDetector, QuotaGovernor, QuotaLimits,
    };
    pub use crate::shared::{ExitCode, Result, ScanError};
    pub use crate::storage::VulnerabilityStore;
}
