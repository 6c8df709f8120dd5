//! Example demonstrating 2Q's scan resistance.
//!
//! A small hot set is interleaved with a long one-pass scan. Scan pages only
//! ever pass through A1in, so the hot pages promoted to Am survive.
//!
//! Run with: cargo run --example basic_two_q

use cachesim::policy::two_q::{TwoQCache, TwoQConfig};
use cachesim::traits::CoreCache;

fn main() {
    println!("=== 2Q Cache Example ===\n");

    // 10 slots: 2 for A1in, 8 for Am; A1out remembers 5 evicted keys.
    let mut cache = TwoQCache::try_new(
        10,
        TwoQConfig {
            a1in_fraction: 0.2,
            a1out_fraction: 0.5,
        },
    )
    .expect("valid 2Q configuration");
    println!(
        "Created 2Q cache: A1in={} Am={} A1out={}\n",
        cache.a1in_capacity(),
        cache.am_capacity(),
        cache.a1out_capacity()
    );

    // First touch of 1..=3 goes to A1in; the next two pushes them to A1out.
    for key in 1..=5u32 {
        cache.access(&key);
    }
    // Returning within the ghost window promotes them to Am.
    for key in 1..=3u32 {
        cache.access(&key);
    }
    println!("Hot keys 1-3 promoted: {:?}", (1..=3u32).map(|k| cache.in_main(&k)).collect::<Vec<_>>());

    // A scan of 1000 fresh pages.
    for page in 1_000..2_000u32 {
        cache.access(&page);
    }
    println!("After a 1000-page scan:");
    for key in 1..=3u32 {
        println!("  contains {key}? {}", cache.contains(&key));
    }
    println!("  state: {}", cache.snapshot());
}
