//! Collaborator traits — the provider's only view of the outside world.
//!
//! The provider calls adapters; adapters never see the provider or its
//! quota state. Swapping the network, address discovery or local
//! generator means implementing one of these traits.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

pub mod http;
pub mod local;
pub mod resolver;

// ── Transport ───────────────────────────────────────────────────────

/// Fetches a URL and returns its body as text.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`. A `timeout` bounds the whole request; expiry must be
    /// reported as [`TransportError::Timeout`].
    async fn fetch_text(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<String, TransportError>;
}

// ── Address discovery ───────────────────────────────────────────────

/// Lists addresses of the local host. The provider picks the first IPv4 one.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve_local_addresses(&self) -> std::io::Result<Vec<IpAddr>>;
}

// ── Local generation ────────────────────────────────────────────────

/// Uniform integer source used when the remote service is not consulted.
pub trait LocalRng: Send + Sync {
    /// A uniformly distributed value in `[min, max]`. Callers guarantee `min <= max`.
    fn uniform_int(&self, min: i64, max: i64) -> i64;

    /// `n` independent draws from `[min, max]`.
    fn uniform_ints(&self, min: i64, max: i64, n: usize) -> Vec<i64> {
        (0..n).map(|_| self.uniform_int(min, max)).collect()
    }
}
