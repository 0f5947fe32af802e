//! Grow a cuckoo filter, then freeze it into a compact snapshot shared across threads.
//!
//! Run with: cargo run --example freeze_snapshot

use std::sync::Arc;
use std::thread;

use taffycraft::filters::TaffyCuckooFilter;

fn mix(x: u64) -> u64 {
    let x = (x ^ (x >> 33)).wrapping_mul(0xff51_afd7_ed55_8ccd);
    let x = (x ^ (x >> 33)).wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^ (x >> 33)
}

fn main() -> taffycraft::Result<()> {
    let mut live = TaffyCuckooFilter::new(1)?;
    for i in 0..500_000u64 {
        live.add_hash(mix(i))?;
    }
    println!(
        "live:   {} entries, {} upsizes, {} bytes",
        live.len(),
        live.generation(),
        live.size_in_bytes()
    );

    let frozen = Arc::new(live.freeze()?);
    println!("frozen: {} bytes", frozen.size_in_bytes());

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let frozen = Arc::clone(&frozen);
            thread::spawn(move || {
                let start = 1_000_000 * (t + 1);
                (start..start + 250_000)
                    .filter(|&i| frozen.find_hash(mix(i)))
                    .count()
            })
        })
        .collect();

    let mut false_positives = 0;
    for handle in handles {
        false_positives += handle.join().unwrap_or(0);
    }
    println!(
        "false positive rate: {:.4}%",
        false_positives as f64 / 1_000_000.0 * 100.0
    );

    // the live filter keeps accepting hashes after freezing
    live.add_hash(mix(u64::MAX))?;
    assert!(live.find_hash(mix(u64::MAX)));
    assert!((0..500_000u64).all(|i| frozen.find_hash(mix(i))));
    Ok(())
}
