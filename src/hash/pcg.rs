//! Small deterministic generator for cuckoo victim selection.
//!
//! PCG32 (XSH-RR output) whose 32-bit outputs are sliced into `bit_width`-bit
//! draws, so that picking one of four slots costs a sixteenth of a generator step.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const DEFAULT_STATE: u64 = 0x13d2_6df6_f740_44b3;
const DEFAULT_INC: u64 = 0x0d09_b2d3_0255_45a0;

/// PCG32 generator that hands out `bit_width` bits per call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlicedPcg {
    state: u64,
    inc: u64,
    current: u32,
    remaining_bits: u32,
    bit_width: u32,
}

impl SlicedPcg {
    /// Generator with the fixed default stream, yielding values below `2^bit_width`.
    ///
    /// `bit_width` must be in `1..=32`.
    #[must_use]
    pub const fn new(bit_width: u32) -> Self {
        Self {
            state: DEFAULT_STATE,
            inc: DEFAULT_INC,
            current: 0,
            remaining_bits: 0,
            bit_width,
        }
    }

    /// Bits per draw.
    #[must_use]
    pub const fn bit_width(&self) -> u32 {
        self.bit_width
    }

    #[inline]
    fn step(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(MULTIPLIER).wrapping_add(self.inc | 1);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Next draw in `[0, 2^bit_width)`.
    #[inline]
    pub fn next_draw(&mut self) -> u32 {
        if self.remaining_bits < self.bit_width {
            self.current = self.step();
            self.remaining_bits = 32;
        }
        let mask = if self.bit_width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.bit_width) - 1
        };
        let result = self.current & mask;
        self.current = self.current.checked_shr(self.bit_width).unwrap_or(0);
        self.remaining_bits -= self.bit_width;
        result
    }
}
