//! Bit manipulation helpers shared by the filters.
//!
//! Most functions compile to one or two instructions. They are `const fn` so
//! the filter modules can use them in constant tables.
//!
//! # Usage
//!
//! - masking a value to its low `w` bits ([`low_bits`])
//! - reducing a 32-bit value into `[0, n)` without division ([`fast_range32`])
//! - reducing a 64-bit value into `[0, n)` ([`fast_range64`])
//! - searching packed 10-bit lanes ([`has_zero10`], [`has_value10`])

#![allow(clippy::cast_possible_truncation)]

/// Keep the low `w` bits of `x`.
///
/// `w >= 64` returns `x` unchanged.
///
/// # Examples
///
/// ```
/// use taffycraft::util::bitops::low_bits;
///
/// assert_eq!(low_bits(4, 0xff), 0x0f);
/// assert_eq!(low_bits(0, 0xff), 0);
/// assert_eq!(low_bits(64, u64::MAX), u64::MAX);
/// ```
#[inline(always)]
#[must_use]
pub const fn low_bits(w: u32, x: u64) -> u64 {
    if w >= 64 {
        x
    } else {
        x & ((1u64 << w) - 1)
    }
}

/// Map a 32-bit value uniformly onto `[0, n)` with a multiply and shift.
///
/// # Examples
///
/// ```
/// use taffycraft::util::bitops::fast_range32;
///
/// assert_eq!(fast_range32(0, 10), 0);
/// assert_eq!(fast_range32(u32::MAX, 10), 9);
/// ```
#[inline(always)]
#[must_use]
pub const fn fast_range32(x: u32, n: u32) -> u32 {
    ((x as u64 * n as u64) >> 32) as u32
}

/// Map a 64-bit value uniformly onto `[0, n)` with a widening multiply.
///
/// # Examples
///
/// ```
/// use taffycraft::util::bitops::fast_range64;
///
/// assert_eq!(fast_range64(0, 1000), 0);
/// assert_eq!(fast_range64(u64::MAX, 1000), 999);
/// ```
#[inline(always)]
#[must_use]
pub const fn fast_range64(x: u64, n: u64) -> u64 {
    ((x as u128 * n as u128) >> 64) as u64
}

/// One set bit at the bottom of each of four 10-bit lanes.
const LANE_LOW: u64 = 0x4010_0401;
/// The top bit of each of four 10-bit lanes.
const LANE_HIGH: u64 = 0x80_2008_0200;

/// True if any of the four 10-bit lanes in the low 40 bits of `x` is zero.
///
/// # Examples
///
/// ```
/// use taffycraft::util::bitops::has_zero10;
///
/// assert!(has_zero10(0));
/// assert!(!has_zero10(0x4010_0401));
/// assert!(has_zero10(0x4010_0001));
/// ```
#[inline(always)]
#[must_use]
pub const fn has_zero10(x: u64) -> bool {
    (x.wrapping_sub(LANE_LOW) & !x & LANE_HIGH) != 0
}

/// True if any of the four 10-bit lanes in the low 40 bits of `x` equals `n`.
///
/// `n` must fit in 10 bits.
#[inline(always)]
#[must_use]
pub const fn has_value10(x: u64, n: u64) -> bool {
    has_zero10(x ^ LANE_LOW.wrapping_mul(n))
}
