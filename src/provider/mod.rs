//! Randomness provider — decides per request whether random.org is asked
//! or the local generator answers.
//!
//! Remote usage is throttled two ways: a batch of `n` is only sent while
//! the known quota exceeds `2 * n`, and consecutive generation calls are
//! spaced by a short cooldown. Either condition routes to the local
//! generator. Network and parse failures are never turned into local
//! values; they reach the caller.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::adapters::{AddressResolver, LocalRng, Transport};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};

pub mod endpoints;
pub mod quota;

pub use endpoints::{BatchRequest, NumberBase, MAX_BATCH, MAX_VALUE, MIN_VALUE};
pub use quota::{LocalReason, QuotaPolicy, QuotaSnapshot, QuotaTracker, Route};

/// Where a batch was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    Remote,
    Local,
}

pub struct RandomProvider {
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn AddressResolver>,
    local: Arc<dyn LocalRng>,
    quota_url: String,
    integers_url: String,
    request_timeout: Option<Duration>,
    tracker: QuotaTracker,
    /// Set once address resolution and the first quota fetch both succeed.
    address: OnceCell<Ipv4Addr>,
}

impl RandomProvider {
    pub fn new(
        config: &ProviderConfig,
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn AddressResolver>,
        local: Arc<dyn LocalRng>,
    ) -> Self {
        Self {
            transport,
            resolver,
            local,
            quota_url: config.quota_url.clone(),
            integers_url: config.integers_url.clone(),
            request_timeout: config.request_timeout(),
            tracker: QuotaTracker::new(config.policy()),
            address: OnceCell::new(),
        }
    }

    // ── Initialization ──────────────────────────────────────────────

    /// Resolve the local IPv4 address and read the initial quota.
    ///
    /// Concurrent first callers share one attempt. A failure leaves the
    /// provider uninitialized so the call can be retried; after success
    /// further calls return immediately.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.address
            .get_or_try_init(|| async {
                let address = self.resolve_ipv4().await?;
                let quota = self.fetch_quota(address).await?;
                info!(%address, quota, "🎲 Random provider ready");
                Ok::<_, ProviderError>(address)
            })
            .await?;
        Ok(())
    }

    async fn resolve_ipv4(&self) -> Result<Ipv4Addr> {
        let addresses = self
            .resolver
            .resolve_local_addresses()
            .await
            .map_err(|e| ProviderError::AddressResolution(e.to_string()))?;

        addresses
            .iter()
            .find_map(|ip| match ip {
                IpAddr::V4(v4) => Some(*v4),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| {
                warn!(candidates = addresses.len(), "No IPv4 address among local addresses");
                ProviderError::AddressResolution(format!(
                    "no IPv4 address among {} local address(es)",
                    addresses.len()
                ))
            })
    }

    pub fn is_ready(&self) -> bool {
        self.address.initialized()
    }

    // ── Quota ───────────────────────────────────────────────────────

    /// Last known remaining budget. Negative means exhausted.
    pub fn quota(&self) -> i64 {
        self.tracker.quota()
    }

    /// Re-read the remote quota.
    ///
    /// While the last reading is negative and younger than the quota
    /// cooldown, the cached value is returned without a network call.
    pub async fn refresh_quota(&self) -> Result<i64> {
        let address = *self.address.get().ok_or(ProviderError::NotInitialized)?;
        self.fetch_quota(address).await
    }

    async fn fetch_quota(&self, address: Ipv4Addr) -> Result<i64> {
        if let Some(cached) = self.tracker.cooling_quota() {
            debug!(quota = cached, "Quota exhausted and cooling down — skipping check");
            return Ok(cached);
        }

        let url = endpoints::quota_url(&self.quota_url, address);
        let body = self
            .transport
            .fetch_text(&url, self.request_timeout)
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Quota check failed");
                ProviderError::from(e)
            })?;

        let quota = endpoints::parse_quota(&body)?;
        self.tracker.record_quota(quota);
        info!(quota, "Quota refreshed");
        Ok(quota)
    }

    // ── Generation ──────────────────────────────────────────────────

    /// One integer in `[min, max]`.
    ///
    /// When the local path is selected this draws a fresh local value
    /// rather than taking the first element of a one-element local batch.
    /// Both are uniform; only the code path differs.
    pub async fn next(&self, min: i64, max: i64) -> Result<i64> {
        let (source, values) = self.generate(min, max, 1, NumberBase::Decimal).await?;
        match (source, values.first()) {
            (Source::Remote, Some(v)) => Ok(*v),
            _ => {
                let req = BatchRequest::clamped(min, max, 1, NumberBase::Decimal)?;
                Ok(self.local.uniform_int(req.min, req.max))
            }
        }
    }

    /// `n` integers in `[min, max]`, all from random.org or all local.
    ///
    /// Bounds clamp to `[-1e9, 1e9]` and `n` to `[1, 10_000]` silently.
    pub async fn next_batch(
        &self,
        min: i64,
        max: i64,
        n: usize,
        base: NumberBase,
    ) -> Result<Vec<i64>> {
        let (_, values) = self.generate(min, max, n, base).await?;
        Ok(values)
    }

    pub(crate) async fn generate(
        &self,
        min: i64,
        max: i64,
        n: usize,
        base: NumberBase,
    ) -> Result<(Source, Vec<i64>)> {
        if !self.is_ready() {
            return Err(ProviderError::NotInitialized);
        }
        let req = BatchRequest::clamped(min, max, n, base)?;

        match self.tracker.route(req.n) {
            Route::Local(reason) => {
                debug!(
                    ?reason,
                    quota = self.tracker.quota(),
                    n = req.n,
                    min = req.min,
                    max = req.max,
                    "Serving batch locally"
                );
                Ok((Source::Local, self.local.uniform_ints(req.min, req.max, req.n)))
            }
            Route::Remote => {
                let values = self.fetch_integers(&req).await?;
                Ok((Source::Remote, values))
            }
        }
    }

    async fn fetch_integers(&self, req: &BatchRequest) -> Result<Vec<i64>> {
        let url = endpoints::integers_url(&self.integers_url, req);
        debug!(url = %url, n = req.n, "Requesting integers from random.org");

        let body = self
            .transport
            .fetch_text(&url, self.request_timeout)
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Integer generation failed");
                ProviderError::from(e)
            })?;

        self.tracker.record_remote_call();
        endpoints::parse_integers(&body, req)
    }

    // ── Introspection ───────────────────────────────────────────────

    pub fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot {
            ready: self.is_ready(),
            address: self.address.get().copied(),
            quota: self.tracker.snapshot(),
        }
    }
}

/// Serializable view of the provider state.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSnapshot {
    pub ready: bool,
    pub address: Option<Ipv4Addr>,
    #[serde(flatten)]
    pub quota: QuotaSnapshot,
}
