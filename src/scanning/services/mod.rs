pub mod cpe_cache;
pub mod delta;
pub mod quota;

pub use cpe_cache::CpeCache;
pub use delta::DeltaDetector;
pub use quota::{PlanTier, QuotaGovernor, QuotaLimits, QuotaStatus};
