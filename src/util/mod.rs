//! Internal utility functions and helpers.
//!
//! # Modules
//!
//! - [`bitops`] - Bit manipulation helpers (masking, range reduction, lane search)
//! - `alloc` - Fallible allocation used by construction, clone, and growth

pub(crate) mod alloc;
pub mod bitops;

pub use bitops::{fast_range32, fast_range64, low_bits};
