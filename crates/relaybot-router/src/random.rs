//! Randomness for the shortcut replies, injectable so tests stay deterministic.

use rand::Rng;

/// Source of the numbers behind "how many" answers and coin flips.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `[low, high]`, both inclusive.
    fn number_in(&self, low: u32, high: u32) -> u32;

    /// Fair coin: `true` is heads.
    fn coin_flip(&self) -> bool;
}

/// Process-wide thread-local generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn number_in(&self, low: u32, high: u32) -> u32 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        rand::rng().random_range(low..=high)
    }

    fn coin_flip(&self) -> bool {
        rand::rng().random_bool(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_in_range() {
        let rng = ThreadRandom;
        for _ in 0..1000 {
            let n = rng.number_in(1, 100);
            assert!((1..=100).contains(&n));
        }
    }

    #[test]
    fn test_number_in_degenerate_range() {
        assert_eq!(ThreadRandom.number_in(7, 7), 7);
        let n = ThreadRandom.number_in(10, 1);
        assert!((1..=10).contains(&n));
    }

    #[test]
    fn test_coin_flip_hits_both_sides() {
        let flips: Vec<bool> = (0..200).map(|_| ThreadRandom.coin_flip()).collect();
        assert!(flips.iter().any(|&f| f));
        assert!(flips.iter().any(|&f| !f));
    }
}
