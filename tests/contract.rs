//! Behavioral contract shared by every filter, run against each implementation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use taffycraft::prelude::*;

fn distinct_hashes(n: usize, seed: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut seen = HashSet::with_capacity(n);
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let h: u64 = rng.gen();
        if seen.insert(h) {
            out.push(h);
        }
    }
    out
}

/// Hashes from a stream disjoint from `members`.
fn absent_rate<F: Filter + ?Sized>(filter: &F, members: &[u64], trials: usize, seed: u64) -> f64 {
    let members: HashSet<u64> = members.iter().copied().collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tried = 0usize;
    let mut hits = 0usize;
    while tried < trials {
        let h: u64 = rng.gen();
        if members.contains(&h) {
            continue;
        }
        tried += 1;
        if filter.find_hash(h) {
            hits += 1;
        }
    }
    hits as f64 / trials as f64
}

fn check_insert_persists<F: MutableFilter>(mut filter: F, n: usize) {
    let hashes = distinct_hashes(n, 0x5eed);
    for (i, &h) in hashes.iter().enumerate() {
        filter.add_hash(h).unwrap();
        for (j, &earlier) in hashes[..=i].iter().enumerate() {
            assert!(filter.find_hash(earlier), "hash {} lost after insert {}", j, i);
        }
    }
}

fn check_empty<F: Filter>(filter: &F, max_rate: f64) {
    let rate = absent_rate(filter, &[], 1_000_000, 0xe4e4);
    assert!(rate <= max_rate, "empty filter reports {}", rate);
}

fn check_clone_independence<F: MutableFilter + Clone>(mut filter: F) {
    let shared = distinct_hashes(2_000, 1);
    let later = distinct_hashes(20_000, 2);
    for &h in &shared {
        filter.add_hash(h).unwrap();
    }
    let copy = filter.clone();
    let before: Vec<bool> = later.iter().map(|&h| copy.find_hash(h)).collect();

    for &h in &later {
        filter.add_hash(h).unwrap();
    }
    let after: Vec<bool> = later.iter().map(|&h| copy.find_hash(h)).collect();
    assert_eq!(before, after);
    assert!(shared.iter().all(|&h| copy.find_hash(h)));
    assert!(later.iter().all(|&h| filter.find_hash(h)));
}

fn check_growth<F: Growable>(mut filter: F, n: usize) {
    let hashes = distinct_hashes(n, 3);
    for &h in &hashes {
        filter.add_hash(h).unwrap();
    }
    assert!(filter.generation() >= 3, "only {} upsizes", filter.generation());
    filter.upsize().unwrap();
    assert!(hashes.iter().all(|&h| filter.find_hash(h)));
}

fn check_hash32<F: MutableFilter>(mut filter: F) {
    for h in 0..5_000u32 {
        filter.add_hash32(h.wrapping_mul(0x9e37_79b9)).unwrap();
    }
    assert!((0..5_000u32).all(|h| filter.find_hash32(h.wrapping_mul(0x9e37_79b9))));
}

macro_rules! mutable_contract {
    ($name:ident, $fresh:expr, $empty_rate:expr) => {
        mod $name {
            use super::*;

            #[test]
            fn insert_persists() {
                check_insert_persists($fresh, 8_000);
            }

            #[test]
            fn empty_finds_nothing() {
                check_empty(&$fresh, $empty_rate);
            }

            #[test]
            fn clone_independence() {
                check_clone_independence($fresh);
            }

            #[test]
            fn hash32() {
                check_hash32($fresh);
            }
        }
    };
}

mutable_contract!(block, BlockFilter::new(32_000).unwrap(), 0.0);
mutable_contract!(taffy_block, TaffyBlockFilter::new(1, 0.001).unwrap(), 0.0);
mutable_contract!(taffy_cuckoo, TaffyCuckooFilter::new(1).unwrap(), 0.0);

#[test]
fn taffy_block_growth() {
    check_growth(TaffyBlockFilter::new(100, 0.01).unwrap(), 50_000);
}

#[test]
fn taffy_cuckoo_growth() {
    check_growth(TaffyCuckooFilter::new(1).unwrap(), 50_000);
}

#[test]
fn frozen_empty_rate() {
    let frozen = TaffyCuckooFilter::new(1 << 12).unwrap().freeze().unwrap();
    check_empty(&frozen, 0.003);
}

#[test]
fn static_empty_key_set_rejected() {
    assert!(matches!(
        StaticFilter::new(&[]),
        Err(FilterError::InvalidItemCount { .. })
    ));
}

#[test]
fn block_false_positive_rate_at_design_load() {
    let ndv = 123_456;
    let fpp = 0.01;
    let mut filter = BlockFilter::new(BlockFilter::bytes_needed(ndv, fpp).unwrap()).unwrap();
    let hashes = distinct_hashes(ndv as usize, 10);
    for &h in &hashes {
        filter.add_hash(h);
    }
    let rate = absent_rate(&filter, &hashes, 1_000_000, 11);
    assert!(rate <= fpp * 1.1, "false positive rate {}", rate);
}

#[test]
fn static_false_positive_rate() {
    let hashes = distinct_hashes(200_000, 12);
    let filter = StaticFilter::new(&hashes).unwrap();
    assert!(hashes.iter().all(|&h| filter.find_hash(h)));
    let rate = absent_rate(&filter, &hashes, 1_000_000, 13);
    assert!(rate <= 1.0 / 256.0 * 1.1, "false positive rate {}", rate);
}

#[test]
fn block_scenario_123456() {
    let bytes = BlockFilter::bytes_needed(123_456, 0.01).unwrap();
    let mut filter = BlockFilter::new(bytes).unwrap();
    let hashes = distinct_hashes(1_234, 14);
    for (i, &h) in hashes.iter().enumerate() {
        filter.add_hash(h);
        assert!(hashes[..=i].iter().all(|&earlier| filter.find_hash(earlier)));
    }
    let rate = absent_rate(&filter, &hashes, 1_000_000, 15);
    assert!(rate <= 0.01, "false positive rate {}", rate);
}

#[test]
fn freeze_keeps_members_and_source() {
    let hashes = distinct_hashes(70_000, 0xdead_beef);
    let mut live = TaffyCuckooFilter::new(1).unwrap();
    for &h in &hashes {
        live.add_hash(h).unwrap();
    }
    let frozen = live.freeze().unwrap();
    assert!(hashes.iter().all(|&h| frozen.find_hash(h)));

    let more = distinct_hashes(10_000, 0xbeef_dead);
    for &h in &more {
        live.add_hash(h).unwrap();
    }
    assert!(hashes.iter().all(|&h| live.find_hash(h)));
    assert!(more.iter().all(|&h| live.find_hash(h)));
    let rate = absent_rate(&frozen, &hashes, 200_000, 16);
    assert!(rate < 0.01, "frozen false positive rate {}", rate);
}

#[test]
fn union_of_grown_filters() {
    let a_hashes = distinct_hashes(30_000, 17);
    let b_hashes = distinct_hashes(700, 18);
    let mut a = TaffyCuckooFilter::new(1).unwrap();
    let mut b = TaffyCuckooFilter::new(1).unwrap();
    for &h in &a_hashes {
        a.add_hash(h).unwrap();
    }
    for &h in &b_hashes {
        b.add_hash(h).unwrap();
    }
    let merged = b.union(&a).unwrap();
    assert!(a_hashes.iter().chain(&b_hashes).all(|&h| merged.find_hash(h)));
}

#[cfg(feature = "serde")]
mod serde_round_trip {
    use super::*;

    #[test]
    fn every_filter_survives_bincode() {
        let hashes = distinct_hashes(5_000, 19);

        let mut block = BlockFilter::new(8_192).unwrap();
        let mut taffy_block = TaffyBlockFilter::new(10, 0.01).unwrap();
        let mut taffy_cuckoo = TaffyCuckooFilter::new(1).unwrap();
        for &h in &hashes {
            block.add_hash(h);
            taffy_block.add_hash(h).unwrap();
            taffy_cuckoo.add_hash(h).unwrap();
        }
        let frozen = taffy_cuckoo.freeze().unwrap();
        let fixed = StaticFilter::new(&hashes).unwrap();

        let block2: BlockFilter = bincode::deserialize(&bincode::serialize(&block).unwrap()).unwrap();
        let taffy_block2: TaffyBlockFilter =
            bincode::deserialize(&bincode::serialize(&taffy_block).unwrap()).unwrap();
        let mut taffy_cuckoo2: TaffyCuckooFilter =
            bincode::deserialize(&bincode::serialize(&taffy_cuckoo).unwrap()).unwrap();
        let frozen2: FrozenTaffyCuckooFilter =
            bincode::deserialize(&bincode::serialize(&frozen).unwrap()).unwrap();
        let fixed2: StaticFilter = bincode::deserialize(&bincode::serialize(&fixed).unwrap()).unwrap();

        assert_eq!(block2, block);
        assert_eq!(taffy_block2, taffy_block);
        assert_eq!(taffy_cuckoo2, taffy_cuckoo);
        assert_eq!(frozen2, frozen);
        assert_eq!(fixed2, fixed);

        // a restored live filter keeps growing
        for &h in &distinct_hashes(20_000, 20) {
            taffy_cuckoo2.add_hash(h).unwrap();
        }
        assert!(hashes.iter().all(|&h| taffy_cuckoo2.find_hash(h)));
    }

    fn assert_rejected<T: serde::de::DeserializeOwned + std::fmt::Debug>(bytes: &[u8]) {
        let err = bincode::deserialize::<T>(bytes).unwrap_err();
        assert!(err.to_string().contains("Serialization error"), "{}", err);
    }

    #[test]
    fn block_filter_without_blocks_rejected() {
        assert_rejected::<BlockFilter>(&0u64.to_le_bytes());
    }

    #[test]
    fn static_filter_with_bad_window_rejected() {
        for (slots, window) in [(4usize, 3u64), (16, 2), (16, 17)] {
            let bytes = bincode::serialize(&(vec![0u8; slots], window, 0u64)).unwrap();
            assert_rejected::<StaticFilter>(&bytes);
        }
        let bytes = bincode::serialize(&(vec![0u8; 16], 16u64, 0u64)).unwrap();
        let fixed: StaticFilter = bincode::deserialize(&bytes).unwrap();
        assert_eq!(fixed.slots(), 16);
    }

    #[test]
    fn taffy_block_filter_with_bad_layout_rejected() {
        let no_levels: Vec<BlockFilter> = Vec::new();
        let bytes = bincode::serialize(&(no_levels, 10u64, 0.01f64, 10u64, 0u64)).unwrap();
        assert_rejected::<TaffyBlockFilter>(&bytes);

        let level = BlockFilter::new(64).unwrap();
        let bytes = bincode::serialize(&(vec![level.clone()], 0u64, 0.01f64, 0u64, 0u64)).unwrap();
        assert_rejected::<TaffyBlockFilter>(&bytes);

        let bytes = bincode::serialize(&(vec![level], 10u64, 1.5f64, 10u64, 0u64)).unwrap();
        assert_rejected::<TaffyBlockFilter>(&bytes);
    }

    // two empty sides of two buckets: feistel (32) + buckets (8 + 16) + stash (8)
    const LOG_OFFSET: usize = 128;
    const BIT_WIDTH_OFFSET: usize = LOG_OFFSET + 4 + 8 + 8 + 4 + 4;
    const ENTROPY_OFFSET: usize = BIT_WIDTH_OFFSET + 4;

    #[test]
    fn taffy_cuckoo_filter_with_bad_layout_rejected() {
        let filter = TaffyCuckooFilter::new(1).unwrap();
        let good = bincode::serialize(&filter).unwrap();
        assert_eq!(good[LOG_OFFSET..LOG_OFFSET + 4], 1u32.to_le_bytes());
        assert_eq!(good[BIT_WIDTH_OFFSET..BIT_WIDTH_OFFSET + 4], 2u32.to_le_bytes());
        assert_eq!(
            good[ENTROPY_OFFSET..ENTROPY_OFFSET + 8],
            filter.entropy()[0].to_le_bytes()
        );

        for log in [0u32, 2, 63] {
            let mut bytes = good.clone();
            bytes[LOG_OFFSET..LOG_OFFSET + 4].copy_from_slice(&log.to_le_bytes());
            assert_rejected::<TaffyCuckooFilter>(&bytes);
        }

        let mut bytes = good.clone();
        bytes[BIT_WIDTH_OFFSET..BIT_WIDTH_OFFSET + 4].copy_from_slice(&5u32.to_le_bytes());
        assert_rejected::<TaffyCuckooFilter>(&bytes);

        let mut bytes = good;
        bytes[ENTROPY_OFFSET] ^= 1;
        assert_rejected::<TaffyCuckooFilter>(&bytes);
    }

    #[test]
    fn frozen_filter_with_bad_layout_rejected() {
        let frozen = TaffyCuckooFilter::new(1).unwrap().freeze().unwrap();
        let good = bincode::serialize(&frozen).unwrap();
        // two feistels of 32 bytes precede the log side size
        assert_eq!(good[64..68], 1u32.to_le_bytes());

        for log in [0u32, 2, 63] {
            let mut bytes = good.clone();
            bytes[64..68].copy_from_slice(&log.to_le_bytes());
            assert_rejected::<FrozenTaffyCuckooFilter>(&bytes);
        }
    }
}
