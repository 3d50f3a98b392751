//! Weighted random backend selection
//!
//! The cumulative weights are computed once; every pick is a binary search
//! over them driven by the selector's own random generator.

use std::fmt;
use std::sync::Mutex;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::{Error, Result};

/// Chooses an index with probability proportional to its weight
pub struct WeightedSelector {
    index: WeightedIndex<u64>,
    len: usize,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl WeightedSelector {
    /// Build from positive weights and an injected generator
    pub fn new(weights: &[u32], rng: Box<dyn RngCore + Send>) -> Result<Self> {
        let index = WeightedIndex::new(weights.iter().map(|&w| u64::from(w))).map_err(|e| {
            Error::Configuration {
                message: format!("invalid backend weights {:?}: {}", weights, e),
                source: Some(e.into()),
            }
        })?;

        Ok(Self {
            index,
            len: weights.len(),
            rng: Mutex::new(rng),
        })
    }

    /// Generator seeded from operating system entropy
    pub fn from_entropy(weights: &[u32]) -> Result<Self> {
        Self::new(weights, Box::new(StdRng::from_entropy()))
    }

    /// Deterministic generator for reproducible selection
    pub fn seeded(weights: &[u32], seed: u64) -> Result<Self> {
        Self::new(weights, Box::new(StdRng::seed_from_u64(seed)))
    }

    /// Weighted-random index in `[0, len)`
    pub fn pick(&self) -> usize {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.index.sample(&mut **rng)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for WeightedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedSelector")
            .field("index", &self.index)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAWS: usize = 100_000;

    fn frequencies(selector: &WeightedSelector) -> Vec<f64> {
        let mut counts = vec![0usize; selector.len()];
        for _ in 0..DRAWS {
            counts[selector.pick()] += 1;
        }
        counts.iter().map(|&c| c as f64 / DRAWS as f64).collect()
    }

    #[test]
    fn test_uniform_weights_converge() {
        let selector = WeightedSelector::seeded(&[20, 20, 20, 20], 7).unwrap();
        for freq in frequencies(&selector) {
            assert!((freq - 0.25).abs() < 0.01, "frequency {} too far from 0.25", freq);
        }
    }

    #[test]
    fn test_explicit_weights_converge() {
        let weights = [1u32, 3, 6];
        let selector = WeightedSelector::seeded(&weights, 42).unwrap();
        let total: u32 = weights.iter().sum();
        for (freq, weight) in frequencies(&selector).iter().zip(weights) {
            let expected = weight as f64 / total as f64;
            assert!(
                (freq - expected).abs() < 0.01,
                "frequency {} too far from {}",
                freq,
                expected
            );
        }
    }

    #[test]
    fn test_single_backend_always_zero() {
        let selector = WeightedSelector::from_entropy(&[5]).unwrap();
        for _ in 0..100 {
            assert_eq!(selector.pick(), 0);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = WeightedSelector::seeded(&[1, 2, 3], 99).unwrap();
        let b = WeightedSelector::seeded(&[1, 2, 3], 99).unwrap();
        let seq_a: Vec<usize> = (0..50).map(|_| a.pick()).collect();
        let seq_b: Vec<usize> = (0..50).map(|_| b.pick()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        assert!(matches!(
            WeightedSelector::from_entropy(&[]),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            WeightedSelector::from_entropy(&[0, 0]),
            Err(Error::Configuration { .. })
        ));
    }
}
