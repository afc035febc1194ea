//! random.org plain-text endpoints: request URLs, limits and strict body parsing.
//!
//! API reference: <https://www.random.org/clients/http/>

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::{Endpoint, ProviderError, Result};

/// Smallest value the service will generate.
pub const MIN_VALUE: i64 = -1_000_000_000;
/// Largest value the service will generate.
pub const MAX_VALUE: i64 = 1_000_000_000;
/// Most integers the service returns per request.
pub const MAX_BATCH: usize = 10_000;

/// Radix of the numbers in an integers response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberBase {
    Binary,
    Octal,
    #[default]
    Decimal,
    Hexadecimal,
}

impl NumberBase {
    pub fn radix(self) -> u32 {
        match self {
            NumberBase::Binary => 2,
            NumberBase::Octal => 8,
            NumberBase::Decimal => 10,
            NumberBase::Hexadecimal => 16,
        }
    }
}

/// A batch request after clamping into the service's hard limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRequest {
    pub min: i64,
    pub max: i64,
    pub n: usize,
    pub base: NumberBase,
}

impl BatchRequest {
    /// Silently coerce out-of-range inputs. `min > max` is still rejected
    /// since no generator can sample an empty range.
    pub fn clamped(min: i64, max: i64, n: usize, base: NumberBase) -> Result<Self> {
        let min = min.clamp(MIN_VALUE, MAX_VALUE);
        let max = max.clamp(MIN_VALUE, MAX_VALUE);
        if min > max {
            return Err(ProviderError::InvalidRange { min, max });
        }
        Ok(Self {
            min,
            max,
            n: n.clamp(1, MAX_BATCH),
            base,
        })
    }
}

// ── URLs ────────────────────────────────────────────────────────────

pub fn quota_url(base_url: &str, address: Ipv4Addr) -> String {
    format!("{}?{}&format=plain", base_url, address)
}

pub fn integers_url(base_url: &str, req: &BatchRequest) -> String {
    format!(
        "{}?num={}&min={}&max={}&col=1&base={}&format=plain",
        base_url,
        req.n,
        req.min,
        req.max,
        req.base.radix()
    )
}

// ── Parsing ─────────────────────────────────────────────────────────

/// A quota body is exactly one decimal integer, optionally surrounded by whitespace.
pub fn parse_quota(body: &str) -> Result<i64> {
    let token = body.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(ProviderError::parse(Endpoint::Quota, snippet(body)));
    }
    token
        .parse::<i64>()
        .map_err(|e| ProviderError::parse(Endpoint::Quota, format!("{}: {}", e, snippet(body))))
}

/// One integer per line in `req.base`, blank lines ignored. The batch is
/// rejected whole if any line is malformed or outside `[req.min, req.max]`,
/// or if the count is not `req.n`.
pub fn parse_integers(body: &str, req: &BatchRequest) -> Result<Vec<i64>> {
    let mut values = Vec::with_capacity(req.n);
    for (lineno, line) in body.split('\n').enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let value = i64::from_str_radix(line, req.base.radix()).map_err(|e| {
            ProviderError::parse(
                Endpoint::Integers,
                format!("line {}: {:?}: {}", lineno + 1, snippet(line), e),
            )
        })?;
        if !(req.min..=req.max).contains(&value) {
            return Err(ProviderError::parse(
                Endpoint::Integers,
                format!(
                    "line {}: {} outside [{}, {}]",
                    lineno + 1,
                    value,
                    req.min,
                    req.max
                ),
            ));
        }
        values.push(value);
    }

    if values.len() != req.n {
        return Err(ProviderError::parse(
            Endpoint::Integers,
            format!("expected {} values, got {}", req.n, values.len()),
        ));
    }
    Ok(values)
}

fn snippet(s: &str) -> String {
    s.chars().take(120).collect()
}
