//! Splitting one 64-bit hash into the pieces each filter needs.
//!
//! All functions are pure: the same hash and capacity always give the same
//! location. The cuckoo layout additionally supports moving a stored entry to a
//! larger capacity without the original hash ([`widen`]).
//!
//! # Block filters
//!
//! ```text
//!  63            32 31             0
//! ┌────────────────┬────────────────┐
//! │  block index   │  8 bit offsets │
//! └────────────────┴────────────────┘
//! ```
//!
//! # Cuckoo filters
//!
//! ```text
//!  63                                              0
//! ┌──────────────────────────┬────────┬────────────┐
//! │ prefix: log_side + 10    │ tail 5 │  unused    │
//! └──────────────────────────┴────────┴────────────┘
//!        │ Feistel (per side)
//!        ▼
//! ┌───────────────┬─────────────┐
//! │ bucket index  │ fingerprint │
//! └───────────────┴─────────────┘
//! ```

#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::feistel::Feistel;
use crate::util::bitops::{fast_range32, low_bits};

/// Odd multipliers selecting one bit per block word.
pub const BLOCK_SEEDS: [u32; 8] = [
    0x47b6_137b,
    0x4497_4d91,
    0x8824_ad5b,
    0xa2b7_289d,
    0x7054_95c7,
    0x2df1_424b,
    0x9efc_4947,
    0x5c6b_fb31,
];

const BLOCK_REHASH_32: u64 = 0xd101_2a3a_7a1f_4a8a;
const CUCKOO_REHASH_32: u64 = 0x05c2_c3e0_ffb4_49c7;

/// Block containing `hash` in a filter of `num_blocks` blocks.
#[inline]
#[must_use]
pub fn block_index(hash: u64, num_blocks: u32) -> usize {
    fast_range32((hash >> 32) as u32, num_blocks) as usize
}

/// One bit per 32-bit word of a block.
#[inline]
#[must_use]
pub fn block_mask(hash: u64) -> [u32; 8] {
    let lo = hash as u32;
    let mut mask = [0u32; 8];
    for (word, seed) in mask.iter_mut().zip(BLOCK_SEEDS) {
        *word = 1 << (lo.wrapping_mul(seed) >> 27);
    }
    mask
}

/// Widen a 32-bit hash for block filters, which index with the upper half.
///
/// The low half is kept as is so the bit offsets still see the caller's bits.
#[inline]
#[must_use]
pub const fn widen_block_hash32(hash: u32) -> u64 {
    ((BLOCK_REHASH_32.wrapping_mul(hash as u64) >> 32) << 32) | hash as u64
}

/// Widen a 32-bit hash for cuckoo filters, which consume bits from the top.
#[inline]
#[must_use]
pub const fn widen_cuckoo_hash32(hash: u32) -> u64 {
    ((hash as u64) << 32) | (CUCKOO_REHASH_32.wrapping_mul(hash as u64) >> 32)
}

/// Width of a cuckoo fingerprint.
pub const HEAD_BITS: u32 = 10;
/// Maximum number of hash bits carried in a tail.
pub const TAIL_BITS: u32 = 5;
/// Width of the encoded tail field, including its terminator bit.
pub const TAIL_FIELD_BITS: u32 = TAIL_BITS + 1;
/// Encoded tail holding no bits.
pub const EMPTY_TAIL: u16 = 1 << TAIL_BITS;
const TAIL_MASK: u16 = (1 << TAIL_FIELD_BITS) - 1;
const HEAD_MASK: u64 = (1 << HEAD_BITS) - 1;

/// Largest side size (as a power of two) a 64-bit hash can address with a full tail.
pub const MAX_LOG_SIDE_SIZE: u32 = 64 - HEAD_BITS - TAIL_BITS - 1;

/// Number of bits stored in an encoded tail.
#[inline]
#[must_use]
pub const fn tail_len(tail: u16) -> u32 {
    TAIL_BITS - tail.trailing_zeros()
}

/// True if the bit string encoded by `x` is a prefix of the one encoded by `y`.
///
/// Both arguments must be nonzero encoded tails.
///
/// # Examples
///
/// ```
/// use taffycraft::hash::split::{is_prefix_of, EMPTY_TAIL};
///
/// // "1" is a prefix of "10"
/// assert!(is_prefix_of(0b110000, 0b101000));
/// // the empty string is a prefix of everything
/// assert!(is_prefix_of(EMPTY_TAIL, 0b101011));
/// assert!(!is_prefix_of(0b101000, 0b110000));
/// ```
#[inline]
#[must_use]
pub const fn is_prefix_of(x: u16, y: u16) -> bool {
    let c = x.trailing_zeros();
    let h = y.trailing_zeros();
    let i = ((x ^ y) as u32).leading_zeros();
    c >= h && i >= 31 - c
}

/// A cuckoo slot: 10-bit fingerprint above a 6-bit encoded tail.
///
/// The all-zero slot is empty; occupied slots always have a nonzero tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Slot(u16);

impl Slot {
    /// The empty slot.
    pub const EMPTY: Self = Self(0);

    /// Pack a fingerprint and an encoded tail.
    #[inline]
    #[must_use]
    pub const fn new(fingerprint: u16, tail: u16) -> Self {
        Self((fingerprint << TAIL_FIELD_BITS) | (tail & TAIL_MASK))
    }

    /// The stored fingerprint.
    #[inline]
    #[must_use]
    pub const fn fingerprint(self) -> u16 {
        self.0 >> TAIL_FIELD_BITS
    }

    /// The encoded tail; zero for an empty slot.
    #[inline]
    #[must_use]
    pub const fn tail(self) -> u16 {
        self.0 & TAIL_MASK
    }

    /// True if nothing is stored here.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.tail() == 0
    }

    /// Same fingerprint with another tail.
    #[inline]
    #[must_use]
    pub const fn with_tail(self, tail: u16) -> Self {
        Self::new(self.fingerprint(), tail)
    }

    /// True if this slot represents every hash that `query` could come from.
    #[inline]
    #[must_use]
    pub const fn matches(self, query: Self) -> bool {
        !self.is_empty()
            && self.fingerprint() == query.fingerprint()
            && is_prefix_of(self.tail(), query.tail())
    }
}

/// A slot together with the bucket it belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Path {
    /// Bucket index within one side.
    pub bucket: u64,
    /// Fingerprint and tail.
    pub slot: Slot,
}

impl Path {
    /// The permuted prefix, `(bucket << 10) | fingerprint`.
    #[inline]
    #[must_use]
    pub const fn permuted(self) -> u64 {
        (self.bucket << HEAD_BITS) | self.slot.fingerprint() as u64
    }
}

/// Location of `hash` on a side with `2^log_side_size` buckets.
#[inline]
#[must_use]
pub fn to_path(hash: u64, feistel: &Feistel, log_side_size: u32) -> Path {
    let w = log_side_size + HEAD_BITS;
    let hashed = feistel.permute_forward(w, hash >> (64 - w));
    let raw_tail = low_bits(TAIL_BITS, hash >> (64 - w - TAIL_BITS)) as u16;
    Path {
        bucket: hashed >> HEAD_BITS,
        slot: Slot::new((hashed & HEAD_MASK) as u16, raw_tail * 2 + 1),
    }
}

/// Top `log_side_size + 10` bits of every hash that maps to `path`, left aligned.
#[inline]
#[must_use]
pub fn from_path_no_tail(path: Path, feistel: &Feistel, log_side_size: u32) -> u64 {
    let w = log_side_size + HEAD_BITS;
    feistel.permute_backward(w, path.permuted()) << (64 - w)
}

/// Prefixes and tails that `path` becomes at a larger side size.
///
/// Tail bits move into the prefix one per doubling. When the tail runs out,
/// every value of the missing prefix bits is produced, each with an empty tail,
/// so no hash the entry stood for is lost. Each item is a left aligned hash
/// prefix plus the encoded tail to store with it.
pub fn widen(
    path: Path,
    feistel: &Feistel,
    from_log: u32,
    to_log: u32,
) -> impl Iterator<Item = (u64, u16)> {
    debug_assert!(to_log >= from_log);
    let grow = to_log - from_log;
    let tail = path.slot.tail();
    let len = tail_len(tail);
    let tail_bits = u64::from(tail & tail.wrapping_sub(1));
    let prefix = from_path_no_tail(path, feistel, from_log)
        | (tail_bits << (64 - from_log - HEAD_BITS - TAIL_FIELD_BITS));
    let (count, new_tail) = if len >= grow {
        (1u64, (tail << grow) & TAIL_MASK)
    } else {
        (1u64 << (grow - len), EMPTY_TAIL)
    };
    let shift = 64 - to_log - HEAD_BITS;
    (0..count).map(move |i| (prefix | (i << shift), new_tail))
}
