//! Deterministic per-trace sampling decision (resolves the reference's
//! `shouldSample` always-true behavior into an actually honored rate).

use std::sync::atomic::{AtomicU64, Ordering};

/// Granularity of the deterministic draw; larger values give a finer-grained
/// approximation of `sample_rate` without pulling in a random-number crate.
const RESOLUTION: u64 = 1_000_000;

/// Decides, once per trace, whether it should be recorded.
pub struct Sampler {
    rate: f64,
    counter: AtomicU64,
}

impl Sampler {
    /// Values at or above 1 and values at or below 0 both normalize to
    /// "always sample"; only values strictly between 0 and 1 are honored
    /// as a partial rate.
    pub fn new(rate: f64) -> Self {
        let rate = if rate <= 0.0 || rate >= 1.0 { 1.0 } else { rate };
        Self {
            rate,
            counter: AtomicU64::new(0),
        }
    }

    /// Draws the next deterministic sample decision. Spreads acceptances
    /// evenly across the call stream rather than clustering them.
    pub fn should_sample(&self) -> bool {
        if self.rate >= 1.0 {
            return true;
        }

        let threshold = (self.rate * RESOLUTION as f64) as u64;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        (n % RESOLUTION) < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_one_always_samples() {
        let sampler = Sampler::new(1.0);
        assert!((0..100).all(|_| sampler.should_sample()));
    }

    #[test]
    fn rate_zero_normalizes_to_always_sample() {
        let sampler = Sampler::new(0.0);
        assert!((0..100).all(|_| sampler.should_sample()));
    }

    #[test]
    fn negative_rate_normalizes_to_always_sample() {
        let sampler = Sampler::new(-3.0);
        assert!((0..100).all(|_| sampler.should_sample()));
    }

    #[test]
    fn rate_above_one_normalizes_to_always_sample() {
        let sampler = Sampler::new(4.0);
        assert!(sampler.should_sample());
    }

    #[test]
    fn half_rate_samples_exactly_half_of_a_resolution_sized_stream() {
        let sampler = Sampler::new(0.5);
        let accepted = (0..1000).filter(|_| sampler.should_sample()).count();
        // Over any prefix whose length divides RESOLUTION evenly, a 0.5
        // rate accepts exactly half: the draw is `n % RESOLUTION < threshold`.
        assert_eq!(accepted, 500);
    }
}
