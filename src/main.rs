//! randomint — print random integers from random.org.
//!
//! Usage: `randomint [MIN MAX [COUNT [BASE]]] [--watch SECS]`
//!
//! Falls back to a local generator while the random.org quota is low or
//! between calls closer than the service's minimum interval. With
//! `--watch`, keeps printing a batch every SECS seconds until Ctrl-C.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use randomint::adapters::http::ReqwestTransport;
use randomint::adapters::local::StdRngSource;
use randomint::adapters::resolver::{StaticResolver, SystemResolver};
use randomint::adapters::AddressResolver;
use randomint::discovery::poller;
use randomint::provider::{MAX_VALUE, MIN_VALUE};
use randomint::{NumberBase, ProviderConfig, RandomProvider};

/// Parsed command line.
struct Args {
    min: i64,
    max: i64,
    count: usize,
    base: NumberBase,
    watch: Option<Duration>,
}

impl Args {
    fn parse<I: Iterator<Item = String>>(mut raw: I) -> Result<Self> {
        let mut positional = Vec::new();
        let mut watch = None;
        while let Some(arg) = raw.next() {
            if arg == "--watch" {
                let secs: u64 = raw
                    .next()
                    .context("--watch needs a number of seconds")?
                    .parse()
                    .context("--watch expects whole seconds")?;
                if secs == 0 {
                    bail!("--watch interval must be at least 1 second");
                }
                watch = Some(Duration::from_secs(secs));
            } else {
                positional.push(arg);
            }
        }

        let (min, max) = match positional.len() {
            0 => (MIN_VALUE, MAX_VALUE),
            1 => bail!("MIN given without MAX"),
            _ => (
                positional[0].parse().context("MIN must be an integer")?,
                positional[1].parse().context("MAX must be an integer")?,
            ),
        };
        let count = match positional.get(2) {
            Some(c) => c.parse().context("COUNT must be a positive integer")?,
            None => 1,
        };
        let base = match positional.get(3).map(String::as_str) {
            None | Some("10") => NumberBase::Decimal,
            Some("2") => NumberBase::Binary,
            Some("8") => NumberBase::Octal,
            Some("16") => NumberBase::Hexadecimal,
            Some(other) => bail!("unsupported base {other}: use 2, 8, 10 or 16"),
        };
        if positional.len() > 4 {
            bail!("too many arguments");
        }

        Ok(Self {
            min,
            max,
            count,
            base,
            watch,
        })
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "randomint=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ProviderConfig::load().context("Failed to load configuration")?;
    init_logging(config.log_json);

    let args = Args::parse(std::env::args().skip(1))?;
    debug!(version = env!("CARGO_PKG_VERSION"), ?config, "Starting randomint");

    // ── Collaborators ───────────────────────────────────────────────
    let transport = ReqwestTransport::new(&config.user_agent)
        .context("Failed to build HTTP client")?;
    let resolver: Arc<dyn AddressResolver> = match config.public_address {
        Some(addr) => {
            info!(%addr, "Using configured public address");
            Arc::new(StaticResolver::new(vec![addr.into()]))
        }
        None => Arc::new(SystemResolver::new()),
    };

    let provider = Arc::new(RandomProvider::new(
        &config,
        Arc::new(transport),
        resolver,
        Arc::new(StdRngSource::new()),
    ));
    provider
        .ensure_ready()
        .await
        .context("Failed to initialize random provider")?;

    let Some(every) = args.watch else {
        print_batch(&provider, &args).await?;
        debug!(snapshot = %serde_json::to_string(&provider.snapshot())?, "Done");
        return Ok(());
    };

    // ── Watch mode ──────────────────────────────────────────────────
    if let Some(interval) = config.quota_poll_interval() {
        tokio::spawn(poller::run_quota_poller(Arc::clone(&provider), interval));
    }

    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = print_batch(&provider, &args).await {
                    warn!(error = %e, "Batch failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(snapshot = %serde_json::to_string(&provider.snapshot())?, "Interrupted");
                return Ok(());
            }
        }
    }
}

async fn print_batch(provider: &RandomProvider, args: &Args) -> Result<()> {
    let values = if args.count == 1 && args.base == NumberBase::Decimal {
        vec![provider.next(args.min, args.max).await?]
    } else {
        provider
            .next_batch(args.min, args.max, args.count, args.base)
            .await?
    };
    for v in values {
        println!("{v}");
    }
    Ok(())
}
