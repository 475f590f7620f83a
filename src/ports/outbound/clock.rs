use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// The quota governor and the vulnerability store both take their
/// timestamps through this port so tests can run on simulated time
/// instead of sleeping through real sliding windows.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
