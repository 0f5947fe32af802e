//! Sizing math for the filter family.
//!
//! # Block filter false positive model
//!
//! A split block Bloom filter sets one bit in each of the eight 32-bit words of a
//! single 256-bit block. With `n` keys spread over `B` blocks the number of keys
//! landing in a block is Poisson distributed with mean `λ = 256 n / bits`. A
//! block holding `i` keys has a given word bit set with probability
//! `1 - (31/32)^i`, so a lookup in it succeeds with probability
//! `(1 - (31/32)^i)^8`. Two distinct keys that agree on all 32 bits used inside
//! the block always collide, which adds `i · 2^-32`. The expected false positive
//! probability is the Poisson-weighted sum of both terms:
//!
//! ```text
//! fpp = Σ_i  Pois(i; λ) · ( (1 - (31/32)^i)^8 + i · 2^-32 )
//! ```
//!
//! [`block_fpp`] evaluates the sum; [`bytes_needed`] and [`block_capacity`]
//! invert it with an exponential then binary search.
//!
//! # Taffy block generations
//!
//! Generation `g` of a taffy block filter targets `fpp · (6/π²) / (g+1)²`. Since
//! `Σ 1/(g+1)² = π²/6`, the union bound over all generations stays within `fpp`.
//!
//! # References
//!
//! - Putze, Sanders, Singler (2007). "Cache-, Hash- and Space-Efficient Bloom Filters"

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use crate::error::{FilterError, Result};
use std::f64::consts::{LN_2, PI};

/// Bytes in one block.
pub const BLOCK_BYTES: u64 = 32;

/// Bits in one block word.
const WORD_BITS: f64 = 32.0;

/// Words in one block.
const BLOCK_WORDS: f64 = 8.0;

/// Hash bits consumed inside a block.
const HASH_BITS: f64 = 32.0;

/// Terms of the Poisson sum. The mean never exceeds 768 (see `block_fpp`).
const POISSON_TERMS: u32 = 10_000;

/// Largest byte budget a 32-bit block index can address.
pub const MAX_BLOCK_FILTER_BYTES: u64 = u32::MAX as u64 * BLOCK_BYTES;

/// Scale applied to every taffy block generation's target (`6/π²`).
pub const TAFFY_FPP_SCALE: f64 = 6.0 / (PI * PI);

/// Reject false positive rates outside `(0, 1)`, including NaN.
///
/// # Examples
///
/// ```
/// use taffycraft::core::params::validate_fpp;
///
/// assert!(validate_fpp(0.01).is_ok());
/// assert!(validate_fpp(0.0).is_err());
/// assert!(validate_fpp(1.0).is_err());
/// assert!(validate_fpp(f64::NAN).is_err());
/// ```
pub fn validate_fpp(fpp: f64) -> Result<()> {
    if fpp > 0.0 && fpp < 1.0 {
        Ok(())
    } else {
        Err(FilterError::fp_rate_out_of_bounds(fpp))
    }
}

/// Expected false positive probability of a `bytes`-byte block filter holding
/// `ndv` distinct hashes.
///
/// Returns 0 for an empty filter and 1 for a zero-sized or hopelessly
/// overloaded one (more than three keys per bit).
///
/// # Examples
///
/// ```
/// use taffycraft::core::params::block_fpp;
///
/// assert_eq!(block_fpp(0, 1024), 0.0);
/// assert_eq!(block_fpp(10, 0), 1.0);
/// let p = block_fpp(1000, 1200);
/// assert!(p > 0.001 && p < 0.05);
/// ```
#[must_use]
pub fn block_fpp(ndv: u64, bytes: u64) -> f64 {
    fpp_f64(ndv as f64, bytes as f64)
}

fn fpp_f64(ndv: f64, bytes: f64) -> f64 {
    if ndv == 0.0 {
        return 0.0;
    }
    if bytes <= 0.0 {
        return 1.0;
    }
    if ndv / (bytes * 8.0) > 3.0 {
        return 1.0;
    }

    let lam = BLOCK_WORDS * WORD_BITS / ((bytes * 8.0) / ndv);
    let log_lam = lam.ln();
    let log_one_collide = -HASH_BITS * LN_2;
    let miss = 1.0 - 1.0 / WORD_BITS;

    let mut result = 0.0;
    let mut log_factorial = 0.0;
    let mut miss_pow = 1.0;
    for i in 0..POISSON_TERMS {
        let fi = f64::from(i);
        if i > 0 {
            log_factorial += fi.ln();
            miss_pow *= miss;
        }
        let log_p = fi * log_lam - lam - log_factorial;
        let log_f_inner = BLOCK_WORDS * (1.0 - miss_pow).ln();
        let log_collide = fi.ln() + log_one_collide;
        result += (log_p + log_f_inner).exp() + (log_p + log_collide).exp();
    }
    result.min(1.0)
}

/// Smallest block filter size, in bytes, whose expected false positive
/// probability after `ndv` inserts is at most `fpp`.
///
/// The result is a multiple of [`BLOCK_BYTES`] and at least one block.
///
/// # Errors
///
/// - [`FilterError::FalsePositiveRateOutOfBounds`] if `fpp` is not in `(0, 1)`
/// - [`FilterError::InvalidFilterSize`] if the size exceeds [`MAX_BLOCK_FILTER_BYTES`]
///
/// # Examples
///
/// ```
/// use taffycraft::core::params::{block_fpp, bytes_needed};
///
/// let bytes = bytes_needed(123_456, 0.01).unwrap();
/// assert_eq!(bytes % 32, 0);
/// assert!(block_fpp(123_456, bytes) <= 0.01);
/// assert!(block_fpp(123_456, bytes - 32) > 0.01);
/// ```
pub fn bytes_needed(ndv: u64, fpp: f64) -> Result<u64> {
    validate_fpp(fpp)?;
    let ndv = ndv as f64;

    let mut result: u64 = 1;
    while fpp_f64(ndv, result as f64) > fpp {
        if result > MAX_BLOCK_FILTER_BYTES {
            return Err(FilterError::invalid_filter_size(result));
        }
        result *= 2;
    }
    if result <= BLOCK_BYTES {
        return Ok(BLOCK_BYTES);
    }

    let mut lo: u64 = 0;
    while lo + 1 < result {
        let mid = lo + (result - lo) / 2;
        if fpp_f64(ndv, mid as f64) <= fpp {
            result = mid;
        } else {
            lo = mid;
        }
    }

    let rounded = result.div_ceil(BLOCK_BYTES) * BLOCK_BYTES;
    if rounded > MAX_BLOCK_FILTER_BYTES {
        return Err(FilterError::invalid_filter_size(rounded));
    }
    Ok(rounded)
}

/// Largest number of distinct hashes a `bytes`-byte block filter can hold while
/// keeping its expected false positive probability below `fpp`.
///
/// # Errors
///
/// [`FilterError::FalsePositiveRateOutOfBounds`] if `fpp` is not in `(0, 1)`.
///
/// # Examples
///
/// ```
/// use taffycraft::core::params::{block_capacity, bytes_needed};
///
/// let bytes = bytes_needed(10_000, 0.01).unwrap();
/// let cap = block_capacity(bytes, 0.01).unwrap();
/// assert!(cap >= 10_000);
/// ```
pub fn block_capacity(bytes: u64, fpp: f64) -> Result<u64> {
    validate_fpp(fpp)?;
    let bytes = bytes as f64;

    let mut result: u64 = 1;
    while fpp_f64(result as f64, bytes) < fpp {
        result *= 2;
    }
    if result == 1 {
        return Ok(0);
    }

    let mut lo: u64 = 0;
    while lo + 1 < result {
        let mid = lo + (result - lo) / 2;
        if fpp_f64(mid as f64, bytes) < fpp {
            lo = mid;
        } else {
            result = mid;
        }
    }
    Ok(lo)
}

/// Target false positive probability of taffy block generation `generation`.
#[must_use]
pub fn taffy_generation_fpp(fpp: f64, generation: u32) -> f64 {
    let g = f64::from(generation) + 1.0;
    fpp * TAFFY_FPP_SCALE / (g * g)
}

/// Side size, as a power of two, of a taffy cuckoo filter with a `bytes` budget.
///
/// Each side has `2^log` buckets of four 2-byte slots; the result is at least 1.
#[must_use]
pub fn cuckoo_log_side_size(bytes: u64) -> u32 {
    let sides = bytes as f64 / 2.0 / 4.0 / 2.0;
    let log = sides.log2();
    if log > 1.0 {
        log as u32
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fpp_edges() {
        assert_eq!(block_fpp(0, 0), 0.0);
        assert_eq!(block_fpp(1, 0), 1.0);
        assert_eq!(block_fpp(1000, 32), 1.0);
    }

    #[test]
    fn test_fpp_monotone_in_bytes() {
        let mut last = 1.0;
        for kb in [1u64, 2, 4, 8, 16, 32] {
            let p = block_fpp(10_000, kb * 1024);
            assert!(p <= last, "fpp grew from {} to {} at {} KiB", last, p, kb);
            last = p;
        }
    }

    #[test]
    fn test_fpp_monotone_in_ndv() {
        let mut last = 0.0;
        for ndv in [10u64, 100, 1000, 10_000] {
            let p = block_fpp(ndv, 16 * 1024);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_bytes_needed_minimum() {
        assert_eq!(bytes_needed(0, 0.01).unwrap(), BLOCK_BYTES);
        assert_eq!(bytes_needed(1, 0.5).unwrap(), BLOCK_BYTES);
    }

    #[test]
    fn test_bytes_needed_is_tight() {
        for &(ndv, fpp) in &[(1000u64, 0.01), (50_000, 0.001), (123_456, 0.01)] {
            let bytes = bytes_needed(ndv, fpp).unwrap();
            assert_eq!(bytes % BLOCK_BYTES, 0);
            assert!(block_fpp(ndv, bytes) <= fpp);
            assert!(block_fpp(ndv, bytes - BLOCK_BYTES) > fpp);
        }
    }

    #[test]
    fn test_bytes_needed_rejects_bad_fpp() {
        for fpp in [0.0, -0.5, 1.0, 2.0, f64::NAN] {
            assert!(matches!(
                bytes_needed(100, fpp),
                Err(FilterError::FalsePositiveRateOutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn test_bits_per_key_reasonable() {
        // around ten bits per key at 1%
        let bytes = bytes_needed(100_000, 0.01).unwrap();
        let bits_per_key = (bytes * 8) as f64 / 100_000.0;
        assert!(bits_per_key > 8.0 && bits_per_key < 14.0, "{}", bits_per_key);
    }

    #[test]
    fn test_capacity_inverts_bytes_needed() {
        let bytes = bytes_needed(20_000, 0.005).unwrap();
        let cap = block_capacity(bytes, 0.005).unwrap();
        assert!(cap >= 20_000);
        assert!(block_fpp(cap, bytes) < 0.005);
        assert!(block_fpp(cap + 1, bytes) >= 0.005);
    }

    #[test]
    fn test_capacity_tiny_filter() {
        assert_eq!(block_capacity(0, 0.01).unwrap(), 0);
    }

    #[test]
    fn test_generation_targets_sum_below_fpp() {
        let total: f64 = (0..64).map(|g| taffy_generation_fpp(0.01, g)).sum();
        assert!(total < 0.01);
        assert!(total > 0.0099);
    }

    #[test]
    fn test_cuckoo_log_side_size() {
        assert_eq!(cuckoo_log_side_size(0), 1);
        assert_eq!(cuckoo_log_side_size(1), 1);
        assert_eq!(cuckoo_log_side_size(64), 2);
        assert_eq!(cuckoo_log_side_size(1 << 20), 16);
    }
}
