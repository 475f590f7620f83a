use async_trait::async_trait;
use thiserror::Error;

/// Outcome classes of the plan-tier probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The account cannot reach the paid-only capability. This is the
    /// expected signal for a free-tier key, not a failure.
    #[error("premium capability not available: {details}")]
    PermissionDenied { details: String },

    /// Anything else (network failure, unexpected status). Treated
    /// conservatively as free tier, with the error kept for diagnostics.
    #[error("tier probe failed: {details}")]
    Other { details: String },
}

/// Probe for the mapping-service plan tier.
///
/// Issues one inexpensive call against a capability known to exist only
/// on paid plans. Success implies unlimited quota.
#[async_trait]
pub trait PlanProbe: Send + Sync {
    async fn probe_premium(&self) -> Result<(), ProbeError>;
}
