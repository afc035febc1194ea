//! Local pseudo-random fallback generator.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::LocalRng;

/// `StdRng` seeded from the thread RNG, shared behind a mutex.
pub struct StdRngSource {
    inner: Mutex<StdRng>,
}

impl StdRngSource {
    pub fn new() -> Self {
        let seed = rand::thread_rng().gen::<[u8; 32]>();
        Self::from_seed(seed)
    }

    /// Deterministic source, for reproducible runs and tests.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: Mutex::new(StdRng::from_seed(seed)),
        }
    }
}

impl Default for StdRngSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRng for StdRngSource {
    fn uniform_int(&self, min: i64, max: i64) -> i64 {
        let mut rng = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(min..=max)
    }

    fn uniform_ints(&self, min: i64, max: i64, n: usize) -> Vec<i64> {
        let mut rng = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        (0..n).map(|_| rng.gen_range(min..=max)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_in_range() {
        let rng = StdRngSource::new();
        for v in rng.uniform_ints(-3, 3, 1_000) {
            assert!((-3..=3).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let rng = StdRngSource::new();
        assert_eq!(rng.uniform_int(42, 42), 42);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = StdRngSource::from_seed([7; 32]);
        let b = StdRngSource::from_seed([7; 32]);
        assert_eq!(a.uniform_ints(0, 1_000_000, 16), b.uniform_ints(0, 1_000_000, 16));
    }

    #[test]
    fn test_full_service_range() {
        let rng = StdRngSource::new();
        let v = rng.uniform_int(-1_000_000_000, 1_000_000_000);
        assert!((-1_000_000_000..=1_000_000_000).contains(&v));
    }
}
