//! Hash splitting for the filter family.
//!
//! The filters never hash application keys. Callers hand in 64-bit (or 32-bit)
//! hashes and this module turns them into block indices, bit masks, cuckoo
//! paths, and tails.
//!
//! # Module Structure
//!
//! ```text
//! hash/
//! ├── split.rs    - Block index/mask, cuckoo paths, tails, 32-bit widening
//! ├── feistel.rs  - Invertible permutation behind the cuckoo remap
//! ├── pcg.rs      - Victim selection for cuckoo displacement
//! └── mod.rs      - This file (public API)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use taffycraft::hash::split::{block_index, block_mask};
//!
//! let hash = 0x0123_4567_89ab_cdef_u64;
//! let block = block_index(hash, 1024);
//! let mask = block_mask(hash);
//! assert!(block < 1024);
//! assert!(mask.iter().all(|w| w.count_ones() == 1));
//! ```

pub mod feistel;
pub mod pcg;
pub mod split;

pub use feistel::Feistel;
pub use pcg::SlicedPcg;
pub use split::{Path, Slot};
