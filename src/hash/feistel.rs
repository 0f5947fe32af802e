//! Invertible permutation of `w`-bit values.
//!
//! A two-round asymmetric Feistel network. The value is split into a low half of
//! `s = w / 2` bits and a high half of `t = w - s` bits; each round mixes one
//! half into the other with a strong multiply-shift hash. Because every round is
//! an XOR of one half with a function of the other, [`Feistel::permute_backward`]
//! recovers the input of [`Feistel::permute_forward`] exactly.
//!
//! The cuckoo filters use the permutation to turn the top bits of a hash into a
//! (bucket, fingerprint) pair that can later be turned back into those bits when
//! the table grows.
//!
//! # Examples
//!
//! ```
//! use taffycraft::hash::Feistel;
//!
//! let f = Feistel::new([1, 2, 3, 4]);
//! let x = 0x2_5aa5;
//! let y = f.permute_forward(18, x);
//! assert!(y < 1 << 18);
//! assert_eq!(f.permute_backward(18, y), x);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::util::bitops::low_bits;

/// Feistel network keyed by two multiply-add pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feistel {
    keys: [[u64; 2]; 2],
}

/// Top `w` bits of the `s + t`-bit value `x`.
#[inline(always)]
fn high_bits(s: u32, t: u32, w: u32, x: u64) -> u64 {
    low_bits(w, x >> (s + t - w))
}

/// Hash the low `w` bits of `x` to `s + t - w` bits.
#[inline(always)]
fn subhash(s: u32, t: u32, w: u32, x: u64, k: [u64; 2]) -> u64 {
    high_bits(
        s,
        t,
        s + t - w,
        low_bits(w, x)
            .wrapping_mul(low_bits(s + t, k[0]))
            .wrapping_add(low_bits(s + t, k[1])),
    )
}

impl Feistel {
    /// Build a permutation from four key words.
    #[must_use]
    pub const fn new(entropy: [u64; 4]) -> Self {
        Self {
            keys: [[entropy[0], entropy[1]], [entropy[2], entropy[3]]],
        }
    }

    /// Permute the low `w` bits of `x`. Bits above `w` are ignored.
    #[must_use]
    pub fn permute_forward(&self, w: u32, x: u64) -> u64 {
        let s = w / 2;
        let t = w - s;

        let l0 = low_bits(s, x);
        let r0 = low_bits(t, x >> s);

        let l1 = r0;
        let r1 = l0 ^ subhash(s, t, t, r0, self.keys[0]);

        let l2 = r1;
        let r2 = l1 ^ subhash(s, t, s, r1, self.keys[1]);

        (r2 << s) | l2
    }

    /// Inverse of [`Feistel::permute_forward`] for the same `w`.
    #[must_use]
    pub fn permute_backward(&self, w: u32, x: u64) -> u64 {
        let s = w / 2;
        let t = w - s;

        let l2 = low_bits(s, x);
        let r2 = low_bits(t, x >> s);

        let r1 = l2;
        let l1 = r2 ^ subhash(s, t, s, r1, self.keys[1]);

        let r0 = l1;
        let l0 = r1 ^ subhash(s, t, t, r0, self.keys[0]);

        (r0 << s) | l0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const KEYS: [u64; 4] = [
        0x2ba7_538e_e123_4073,
        0xfcc3_7775_39b1_47d6,
        0x6086_c563_5763_47e7,
        0x52ef_f34e_e176_4465,
    ];

    #[test]
    fn test_round_trip_every_width() {
        let f = Feistel::new(KEYS);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for w in 1..=64 {
            for _ in 0..200 {
                let x = low_bits(w, rng.gen());
                let y = f.permute_forward(w, x);
                assert_eq!(low_bits(w, y), y, "output wider than {} bits", w);
                assert_eq!(f.permute_backward(w, y), x, "width {}", w);
            }
        }
    }

    #[test]
    fn test_bijective_small_width() {
        let f = Feistel::new(KEYS);
        let w = 12;
        let mut seen = vec![false; 1 << w];
        for x in 0..(1u64 << w) {
            let y = f.permute_forward(w, x) as usize;
            assert!(!seen[y], "collision at {}", y);
            seen[y] = true;
        }
    }

    #[test]
    fn test_keys_change_output() {
        let a = Feistel::new(KEYS);
        let b = Feistel::new([KEYS[0] ^ 1, KEYS[1], KEYS[2] ^ 0x10, KEYS[3]]);
        let differing = (0..1000u64)
            .filter(|&x| a.permute_forward(30, x) != b.permute_forward(30, x))
            .count();
        assert!(differing > 900);
    }
}
