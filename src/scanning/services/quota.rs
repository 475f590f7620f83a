use crate::ports::outbound::{Clock, PlanProbe, ProbeError};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info, warn};

const MINUTE_HORIZON_SECS: i64 = 60;
const DAY_HORIZON_SECS: i64 = 60 * 60 * 24;

/// Access level of the mapping-service credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTier {
    /// Paid plan: no call budget, check and record short-circuit.
    Paid,
    /// Free plan: per-minute and per-day ceilings apply.
    Free,
}

/// Call ceilings for the free tier. Pluggable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub per_minute: usize,
    pub per_day: usize,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            per_minute: 5,
            per_day: 20,
        }
    }
}

/// Snapshot of the governor for diagnostics and status output.
#[derive(Debug, Clone)]
pub struct QuotaStatus {
    pub tier: PlanTier,
    pub calls_today: usize,
    pub daily_limit: usize,
    pub calls_last_minute: usize,
    pub minute_limit: usize,
    pub probe_error: Option<String>,
}

#[derive(Debug)]
struct TierDetection {
    tier: PlanTier,
    probe_error: Option<String>,
}

#[derive(Debug, Default)]
struct CallWindows {
    minute: VecDeque<DateTime<Utc>>,
    day: VecDeque<DateTime<Utc>>,
}

/// Process-wide budget governor for mapping-service calls.
///
/// Two sliding windows (60 seconds, 24 hours) of call timestamps, held
/// in memory only and discarded at process exit. Shared across every
/// scan in the process; `acquire` runs check-then-record as one critical
/// section so concurrent scans cannot race past the ceiling.
pub struct QuotaGovernor {
    limits: QuotaLimits,
    clock: Arc<dyn Clock>,
    tier: OnceLock<TierDetection>,
    windows: Mutex<CallWindows>,
}

impl QuotaGovernor {
    pub fn new(limits: QuotaLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clock,
            tier: OnceLock::new(),
            windows: Mutex::new(CallWindows::default()),
        }
    }

    /// Resolve the plan tier, probing at most once per process lifetime.
    ///
    /// Probe success means a paid plan. A permission error is the
    /// expected free-tier signal; any other error is treated as free
    /// with the error kept for `status()`.
    pub async fn ensure_tier(&self, probe: &dyn PlanProbe) -> PlanTier {
        if let Some(detection) = self.tier.get() {
            return detection.tier;
        }

        let detection = match probe.probe_premium().await {
            Ok(()) => {
                info!("paid plan detected, call quota unlimited");
                TierDetection {
                    tier: PlanTier::Paid,
                    probe_error: None,
                }
            }
            Err(ProbeError::PermissionDenied { details }) => {
                info!(%details, "free plan detected, call quota limited");
                TierDetection {
                    tier: PlanTier::Free,
                    probe_error: None,
                }
            }
            Err(ProbeError::Other { details }) => {
                warn!(%details, "tier probe inconclusive, assuming free plan");
                TierDetection {
                    tier: PlanTier::Free,
                    probe_error: Some(details),
                }
            }
        };

        // If two scans raced here the first result wins and the loser's
        // probe outcome is dropped.
        let _ = self.tier.set(detection);
        self.tier.get().map(|d| d.tier).unwrap_or(PlanTier::Free)
    }

    fn tier(&self) -> PlanTier {
        // Before detection the governor behaves as free tier.
        self.tier.get().map(|d| d.tier).unwrap_or(PlanTier::Free)
    }

    /// Whether a call is currently within budget.
    ///
    /// Pure read: timestamps outside each horizon are ignored, not
    /// evicted, so repeated calls without an intervening `record_call`
    /// are idempotent.
    pub fn can_proceed(&self) -> bool {
        if self.tier() == PlanTier::Paid {
            return true;
        }

        let now = self.clock.now();
        let windows = self.windows.lock().expect("quota windows lock");
        let last_minute = count_within(&windows.minute, now, MINUTE_HORIZON_SECS);
        let today = count_within(&windows.day, now, DAY_HORIZON_SECS);

        last_minute < self.limits.per_minute && today < self.limits.per_day
    }

    /// Record one issued call in both windows.
    ///
    /// Does not check the budget; callers pair it with `can_proceed` or
    /// use `acquire`.
    pub fn record_call(&self) {
        if self.tier() == PlanTier::Paid {
            return;
        }

        let now = self.clock.now();
        let mut windows = self.windows.lock().expect("quota windows lock");
        evict_older_than(&mut windows.minute, now, MINUTE_HORIZON_SECS);
        evict_older_than(&mut windows.day, now, DAY_HORIZON_SECS);
        windows.minute.push_back(now);
        windows.day.push_back(now);
        debug!(
            last_minute = windows.minute.len(),
            today = windows.day.len(),
            "mapping-service call recorded"
        );
    }

    /// Check and record under one lock.
    ///
    /// This is the entry point for concurrent scans: two callers cannot
    /// both observe "one slot left" and then both record.
    pub fn acquire(&self) -> bool {
        if self.tier() == PlanTier::Paid {
            return true;
        }

        let now = self.clock.now();
        let mut windows = self.windows.lock().expect("quota windows lock");
        evict_older_than(&mut windows.minute, now, MINUTE_HORIZON_SECS);
        evict_older_than(&mut windows.day, now, DAY_HORIZON_SECS);

        if windows.minute.len() >= self.limits.per_minute || windows.day.len() >= self.limits.per_day
        {
            return false;
        }

        windows.minute.push_back(now);
        windows.day.push_back(now);
        true
    }

    pub fn status(&self) -> QuotaStatus {
        let now = self.clock.now();
        let windows = self.windows.lock().expect("quota windows lock");
        QuotaStatus {
            tier: self.tier(),
            calls_today: count_within(&windows.day, now, DAY_HORIZON_SECS),
            daily_limit: self.limits.per_day,
            calls_last_minute: count_within(&windows.minute, now, MINUTE_HORIZON_SECS),
            minute_limit: self.limits.per_minute,
            probe_error: self.tier.get().and_then(|d| d.probe_error.clone()),
        }
    }
}

fn count_within(window: &VecDeque<DateTime<Utc>>, now: DateTime<Utc>, horizon_secs: i64) -> usize {
    let cutoff = now - Duration::seconds(horizon_secs);
    window.iter().filter(|ts| **ts > cutoff).count()
}

fn evict_older_than(window: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>, horizon_secs: i64) {
    let cutoff = now - Duration::seconds(horizon_secs);
    while let Some(front) = window.front() {
        if *front <= cutoff {
            window.pop_front();
        } else {
            break;
        }
    }
}
