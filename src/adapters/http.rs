//! Reqwest-backed transport.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Transport;
use crate::error::TransportError;

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client (proxies, client-wide timeouts, TLS roots).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Timeouts carry the elapsed time. Client-level and connect limits
    /// apply even when no per-request timeout is set.
    fn classify(e: reqwest::Error, elapsed: Duration) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(elapsed)
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch_text(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<String, TransportError> {
        let start = Instant::now();
        debug!(url, "HTTP GET start");

        let mut request = self.client.get(url);
        if let Some(t) = timeout {
            request = request.timeout(t);
        }

        let resp = request.send().await.map_err(|e| {
            warn!(url, error = %e, "HTTP GET failed");
            Self::classify(e, start.elapsed())
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Self::classify(e, start.elapsed()))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(url, status = status.as_u16(), elapsed_ms, "HTTP GET rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        debug!(url, status = status.as_u16(), elapsed_ms, "HTTP GET done");
        Ok(body)
    }
}
