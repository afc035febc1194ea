//! Background quota poller — keeps the remote budget estimate current.
//!
//! Without it the quota is only read at initialization. Failures are
//! logged and the next tick tries again; the provider's own cooldown
//! still applies while the quota is negative.

use std::sync::Arc;

use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::ProviderError;
use crate::provider::RandomProvider;

/// Refresh the quota every `interval`, forever. The first refresh happens
/// one full interval after start since `ensure_ready` just read it.
pub async fn run_quota_poller(provider: Arc<RandomProvider>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "📡 Quota poller starting");

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // Skip the immediate tick

    loop {
        ticker.tick().await;
        poll_once(&provider).await;
    }
}

/// One refresh attempt. Returns the quota when the check succeeded.
pub async fn poll_once(provider: &RandomProvider) -> Option<i64> {
    match provider.refresh_quota().await {
        Ok(quota) if quota < 0 => {
            warn!(quota, "Quota exhausted — requests served locally");
            Some(quota)
        }
        Ok(quota) => Some(quota),
        Err(ProviderError::NotInitialized) => {
            warn!("Quota poll skipped — provider not initialized");
            None
        }
        Err(e) => {
            warn!(error = %e, retryable = e.is_retryable(), "Quota poll failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::StdRngSource;
    use crate::adapters::resolver::StaticResolver;
    use crate::adapters::Transport;
    use crate::config::ProviderConfig;
    use crate::error::TransportError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    /// Quota endpoint whose answer drops by 100 on every call.
    struct DrainingQuota {
        remaining: AtomicI64,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for DrainingQuota {
        async fn fetch_text(
            &self,
            url: &str,
            _timeout: Option<Duration>,
        ) -> Result<String, TransportError> {
            assert!(url.contains("/quota/"), "poller must only hit the quota endpoint");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.remaining.fetch_sub(100, Ordering::SeqCst).to_string())
        }
    }

    fn provider(transport: Arc<DrainingQuota>) -> Arc<RandomProvider> {
        Arc::new(RandomProvider::new(
            &ProviderConfig::default(),
            transport,
            Arc::new(StaticResolver::new(vec!["192.0.2.1".parse().unwrap()])),
            Arc::new(StdRngSource::new()),
        ))
    }

    #[tokio::test]
    async fn test_poll_before_ready_is_skipped() {
        let transport = Arc::new(DrainingQuota {
            remaining: AtomicI64::new(1_000),
            calls: AtomicUsize::new(0),
        });
        let p = provider(transport.clone());
        assert_eq!(poll_once(&p).await, None);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_refreshes_on_interval() {
        let transport = Arc::new(DrainingQuota {
            remaining: AtomicI64::new(1_000),
            calls: AtomicUsize::new(0),
        });
        let p = provider(transport.clone());
        p.ensure_ready().await.unwrap();
        assert_eq!(p.quota(), 1_000);

        let handle = tokio::spawn(run_quota_poller(Arc::clone(&p), Duration::from_secs(60)));

        // Let the poller consume its immediate tick.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_secs(125)).await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(p.quota(), 800);
        handle.abort();
    }
}
