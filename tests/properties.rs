//! Property tests over arbitrary hash sequences.

use proptest::prelude::*;
use taffycraft::hash::split::{to_path, widen, HEAD_BITS};
use taffycraft::hash::Feistel;
use taffycraft::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn block_no_false_negatives(hashes: Vec<u64>, bytes in 32u64..100_000) {
        let mut filter = BlockFilter::new(bytes).unwrap();
        for &h in &hashes {
            filter.add_hash(h);
        }
        for &h in &hashes {
            prop_assert!(filter.find_hash(h));
        }
    }

    #[test]
    fn static_no_false_negatives(hashes in prop::collection::vec(any::<u64>(), 1..2_000), seed: u64) {
        let filter = StaticFilter::with_seed(&hashes, seed).unwrap();
        for &h in &hashes {
            prop_assert!(filter.find_hash(h));
        }
    }

    #[test]
    fn taffy_block_no_false_negatives(
        hashes in prop::collection::vec(any::<u64>(), 0..3_000),
        ndv in 0u64..100,
    ) {
        let mut filter = TaffyBlockFilter::new(ndv, 0.01).unwrap();
        for &h in &hashes {
            filter.add_hash(h).unwrap();
        }
        for &h in &hashes {
            prop_assert!(filter.find_hash(h));
        }
    }

    #[test]
    fn taffy_cuckoo_no_false_negatives(
        hashes in prop::collection::vec(any::<u64>(), 0..3_000),
        bytes in 0u64..4_096,
    ) {
        let mut filter = TaffyCuckooFilter::new(bytes).unwrap();
        for &h in &hashes {
            filter.add_hash(h).unwrap();
        }
        let frozen = filter.freeze().unwrap();
        for &h in &hashes {
            prop_assert!(filter.find_hash(h));
            prop_assert!(frozen.find_hash(h));
        }
    }

    #[test]
    fn taffy_cuckoo_sequential_hash32(start: u32, count in 0u32..2_000) {
        let mut filter = TaffyCuckooFilter::new(1).unwrap();
        for i in 0..count {
            filter.add_hash32(start.wrapping_add(i)).unwrap();
        }
        for i in 0..count {
            prop_assert!(filter.find_hash32(start.wrapping_add(i)));
        }
    }

    #[test]
    fn union_contains_both(
        a in prop::collection::vec(any::<u64>(), 0..1_500),
        b in prop::collection::vec(any::<u64>(), 0..1_500),
    ) {
        let mut left = TaffyCuckooFilter::new(1).unwrap();
        let mut right = TaffyCuckooFilter::new(1).unwrap();
        for &h in &a {
            left.add_hash(h).unwrap();
        }
        for &h in &b {
            right.add_hash(h).unwrap();
        }
        let merged = left.union(&right).unwrap();
        for &h in a.iter().chain(&b) {
            prop_assert!(merged.find_hash(h));
        }
    }

    #[test]
    fn feistel_round_trips(keys: [u64; 4], w in 1u32..=64, x: u64) {
        let f = Feistel::new(keys);
        let x = if w == 64 { x } else { x & ((1 << w) - 1) };
        let y = f.permute_forward(w, x);
        prop_assert!(w == 64 || y < 1 << w);
        prop_assert_eq!(f.permute_backward(w, y), x);
    }

    #[test]
    fn widening_covers_direct_path(hash: u64, log in 1u32..30, grow in 0u32..9) {
        let f = Feistel::new([1, 2, 3, 4]);
        let direct = to_path(hash, &f, log + grow);
        let covered = widen(to_path(hash, &f, log), &f, log, log + grow).any(|(prefix, tail)| {
            let p = to_path(prefix, &f, log + grow);
            p.bucket == direct.bucket && p.slot.with_tail(tail).matches(direct.slot)
        });
        prop_assert!(covered);
        prop_assert!(direct.bucket < 1 << (log + grow));
        prop_assert!(u32::from(direct.slot.fingerprint()) < 1 << HEAD_BITS);
    }
}
