//! Block filter capacity planning example.
//!
//! Run with: cargo run --example capacity_planning

use taffycraft::filters::BlockFilter;
use taffycraft::TaffyBlockFilter;

fn main() -> taffycraft::Result<()> {
    println!("BlockFilter Capacity Planning\n");

    let plans = [
        ("Session cache", 50_000u64, 0.01),
        ("URL blocklist", 2_000_000, 0.001),
        ("Join pre-filter", 123_456, 0.01),
        ("Dedup window", 10_000_000, 0.05),
    ];

    for (name, ndv, fpp) in plans {
        let bytes = BlockFilter::bytes_needed(ndv, fpp)?;
        println!("{}", name);
        println!("  items:            {}", ndv);
        println!("  target fpp:       {}", fpp);
        println!("  bytes:            {}", bytes);
        println!("  bits per item:    {:.2}", bytes as f64 * 8.0 / ndv as f64);
        println!("  modelled fpp:     {:.5}", BlockFilter::fpp(ndv, bytes));
        println!("  capacity at fpp:  {}\n", BlockFilter::capacity(bytes, fpp)?);
    }

    println!("TaffyBlockFilter growth from 1,000 items at 1%");
    let mut filter = TaffyBlockFilter::new(1_000, 0.01)?;
    let mut h = 0u64;
    for target in [1_000u64, 10_000, 100_000, 1_000_000] {
        while filter.len() < target {
            h = h.wrapping_add(0x9e37_79b9_7f4a_7c15);
            filter.add_hash(h)?;
        }
        println!(
            "  {:>9} items: generation {:>2}, {:>9} bytes",
            target,
            filter.generation(),
            filter.size_in_bytes()
        );
    }
    Ok(())
}
