//! Random integers from random.org, with a quota-aware fallback to a
//! local pseudo-random generator.
//!
//! ```no_run
//! use std::sync::Arc;
//! use randomint::adapters::{http::ReqwestTransport, local::StdRngSource, resolver::SystemResolver};
//! use randomint::{NumberBase, ProviderConfig, RandomProvider};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig::default();
//! let provider = RandomProvider::new(
//!     &config,
//!     Arc::new(ReqwestTransport::new(&config.user_agent)?),
//!     Arc::new(SystemResolver::new()),
//!     Arc::new(StdRngSource::new()),
//! );
//! provider.ensure_ready().await?;
//! let die = provider.next(1, 6).await?;
//! let batch = provider.next_batch(0, 99, 10, NumberBase::Decimal).await?;
//! # Ok(()) }
//! ```

pub mod adapters;
pub mod config;
pub mod discovery;
pub mod error;
pub mod provider;

pub use config::{ConfigError, ProviderConfig};
pub use error::{Endpoint, ProviderError, TransportError};
pub use provider::{NumberBase, ProviderSnapshot, RandomProvider};
