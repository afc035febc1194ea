//! In-memory quota tracker — last known remote budget plus cooldown timers.
//!
//! Every routing decision is made from a snapshot taken under a short read
//! lock; outcomes are written back under a short write lock after the
//! network call completes. No guard is ever held across an `.await`.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

/// Cooldowns and safety margin applied to remote usage.
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    /// Minimum gap between integer-generation calls.
    pub call_cooldown: Duration,
    /// Minimum gap between quota checks while the quota is negative.
    pub quota_cooldown: Duration,
    /// Remote is used only while `quota > margin_factor * n`.
    pub margin_factor: i64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            call_cooldown: Duration::from_millis(10),
            quota_cooldown: Duration::from_millis(60_000),
            margin_factor: 2,
        }
    }
}

/// Why a request was served locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalReason {
    /// Remaining quota is within the reserved margin.
    QuotaReserve,
    /// The previous remote call was too recent.
    CallCooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Local(LocalReason),
    Remote,
}

#[derive(Debug, Default)]
struct QuotaState {
    remote_quota: i64,
    last_quota_check: Option<Instant>,
    last_remote_call: Option<Instant>,
    quota_checked_at: Option<DateTime<Utc>>,
    remote_called_at: Option<DateTime<Utc>>,
}

/// Thread-safe quota estimate and cooldown bookkeeping.
pub struct QuotaTracker {
    policy: QuotaPolicy,
    state: RwLock<QuotaState>,
}

impl QuotaTracker {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self {
            policy,
            state: RwLock::new(QuotaState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, QuotaState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, QuotaState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Last known remaining budget. Negative means exhausted.
    pub fn quota(&self) -> i64 {
        self.read().remote_quota
    }

    /// The cached quota, if it is negative and was read less than
    /// `quota_cooldown` ago. `None` means a fresh check is allowed.
    pub fn cooling_quota(&self) -> Option<i64> {
        let state = self.read();
        match state.last_quota_check {
            Some(at) if state.remote_quota < 0 && at.elapsed() < self.policy.quota_cooldown => {
                Some(state.remote_quota)
            }
            _ => None,
        }
    }

    /// Store a freshly parsed quota reading.
    pub fn record_quota(&self, quota: i64) {
        let mut state = self.write();
        state.remote_quota = quota;
        state.last_quota_check = Some(Instant::now());
        state.quota_checked_at = Some(Utc::now());
    }

    /// Decide where a batch of `n` values should come from.
    pub fn route(&self, n: usize) -> Route {
        let state = self.read();
        let reserve = self.policy.margin_factor.saturating_mul(n as i64);
        if state.remote_quota <= reserve {
            return Route::Local(LocalReason::QuotaReserve);
        }
        match state.last_remote_call {
            Some(at) if at.elapsed() < self.policy.call_cooldown => {
                Route::Local(LocalReason::CallCooldown)
            }
            _ => Route::Remote,
        }
    }

    /// Note a successful integer-generation call.
    pub fn record_remote_call(&self) {
        let mut state = self.write();
        state.last_remote_call = Some(Instant::now());
        state.remote_called_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> QuotaSnapshot {
        let state = self.read();
        QuotaSnapshot {
            remote_quota: state.remote_quota,
            quota_checked_at: state.quota_checked_at,
            remote_called_at: state.remote_called_at,
        }
    }
}

/// Point-in-time view of the tracker, for logs and dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaSnapshot {
    pub remote_quota: i64,
    pub quota_checked_at: Option<DateTime<Utc>>,
    pub remote_called_at: Option<DateTime<Utc>>,
}
