//! Shared generators and constants for all benchmarks
#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Filter sizes in distinct hashes.
pub const SIZES: &[usize] = &[1_000, 10_000, 100_000, 1_000_000];

/// False positive rates for the block filters.
pub const FP_RATES: &[f64] = &[0.1, 0.01, 0.001];

/// Reproducible random hashes.
pub fn random_hashes(count: usize, seed: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen()).collect()
}

/// Hashes from a stream other than [`random_hashes`] with `seed`, for misses.
pub fn absent_hashes(count: usize, seed: u64) -> Vec<u64> {
    random_hashes(count, seed ^ 0xa5a5_a5a5_a5a5_a5a5)
}

/// Human-readable size label.
pub fn format_size(n: usize) -> String {
    match n {
        n if n >= 1_000_000 => format!("{}M", n / 1_000_000),
        n if n >= 1_000 => format!("{}K", n / 1_000),
        n => n.to_string(),
    }
}
