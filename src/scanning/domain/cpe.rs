use serde::{Deserialize, Serialize};
use tracing::warn;

/// One cached CPE for a component, with its validity flag.
///
/// `valid: false` records a definitive "this CPE does not exist in the
/// vulnerability database" outcome so the CPE is never retried. A CPE
/// that merely has not been queried yet is simply absent.
///
/// Historical cache files stored bare CPE strings; those deserialize as
/// `valid: true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CpeEntryRepr")]
pub struct CpeEntry {
    pub cpe: String,
    pub valid: bool,
}

impl CpeEntry {
    pub fn valid(cpe: impl Into<String>) -> Self {
        Self {
            cpe: cpe.into(),
            valid: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CpeEntryRepr {
    Tagged {
        cpe: String,
        #[serde(default = "default_valid")]
        valid: bool,
    },
    Legacy(String),
}

fn default_valid() -> bool {
    true
}

impl From<CpeEntryRepr> for CpeEntry {
    fn from(repr: CpeEntryRepr) -> Self {
        match repr {
            CpeEntryRepr::Tagged { cpe, valid } => CpeEntry { cpe, valid },
            CpeEntryRepr::Legacy(cpe) => CpeEntry { cpe, valid: true },
        }
    }
}

/// Validate that a string follows the CPE 2.3 shape.
///
/// Checks the `cpe:2.3:` prefix, the component count, and non-empty
/// vendor/product fields. An `UNKNOWN` vendor is accepted (the mapping
/// service falls back to it) but logged, since it rarely matches
/// anything in the database.
pub fn is_valid_cpe(cpe: &str) -> bool {
    if !cpe.starts_with("cpe:2.3:") {
        return false;
    }

    let parts: Vec<&str> = cpe.split(':').collect();
    if parts.len() < 11 {
        return false;
    }

    let vendor = parts[3];
    let product = parts[4];
    if vendor.is_empty() || product.is_empty() {
        return false;
    }

    if vendor == "UNKNOWN" {
        warn!(cpe, "CPE with UNKNOWN vendor");
    }

    true
}
