use crate::scanning::domain::CveRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error taxonomy for the external vulnerability database.
///
/// The distinction matters: `NotFound` is terminal for a CPE (it gets
/// invalidated in the translation cache and never retried), while the
/// transient variants must leave no trace so the same CPE is retried
/// on a future scan.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("no record for CPE {cpe}")]
    NotFound { cpe: String },

    #[error("rate limited by the vulnerability database")]
    RateLimited,

    #[error("vulnerability database unavailable: {details}")]
    Unavailable { details: String },

    #[error("vulnerability database request failed: {details}")]
    RequestFailed { details: String },
}

impl DatabaseError {
    /// Transient errors may be retried on a future scan and must not
    /// mark anything invalid or cached.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DatabaseError::RateLimited | DatabaseError::Unavailable { .. }
        )
    }
}

/// Client for the external CVE database.
#[async_trait]
pub trait VulnerabilityDatabase: Send + Sync {
    /// Return all CVE records matching an exact CPE string.
    async fn search_by_cpe(&self, cpe: &str) -> Result<Vec<CveRecord>, DatabaseError>;

    /// Return CVE records modified inside a time window, used by the
    /// best-effort refresh pass.
    async fn search_modified_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CveRecord>, DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DatabaseError::RateLimited.is_transient());
        assert!(DatabaseError::Unavailable {
            details: "503".to_string()
        }
        .is_transient());
        assert!(!DatabaseError::NotFound {
            cpe: "cpe:2.3:a:x:y:1:*:*:*:*:*:*:*".to_string()
        }
        .is_transient());
        assert!(!DatabaseError::RequestFailed {
            details: "bad json".to_string()
        }
        .is_transient());
    }
}
