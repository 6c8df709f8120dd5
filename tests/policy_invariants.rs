// ==============================================
// CROSS-POLICY INVARIANT TESTS (integration)
// ==============================================
//
// Behavior every policy must share, plus the per-policy scenarios that pin
// down each algorithm's eviction rule. Randomized properties live in
// `policy_properties.rs`.

use cachesim::builder::{CacheBuilder, PolicyKind};
use cachesim::simulator::run;
use cachesim::traits::{Access, CoreCache};

const H: Access = Access::Hit;
const M: Access = Access::Miss;

fn outcomes_for(kind: PolicyKind, capacity: usize, requests: &[u32]) -> Vec<Access> {
    let mut cache = CacheBuilder::new(capacity)
        .try_build_for(kind, requests)
        .unwrap();
    run(&mut cache, requests)
        .unwrap()
        .into_iter()
        .map(|o| o.access)
        .collect()
}

// ==============================================
// Reference Trace
// ==============================================
//
// Capacity 2, requests [1, 2, 1, 3, 2]. Hand-traced per policy.

mod reference_trace {
    use super::*;

    const TRACE: [u32; 5] = [1, 2, 1, 3, 2];

    #[test]
    fn fifo() {
        // 3 evicts 1 (oldest insert), so 2 survives.
        assert_eq!(outcomes_for(PolicyKind::Fifo, 2, &TRACE), [M, M, H, M, H]);
    }

    #[test]
    fn lru() {
        // 3 evicts 2 (least recent after 1's hit).
        assert_eq!(outcomes_for(PolicyKind::Lru, 2, &TRACE), [M, M, H, M, M]);
    }

    #[test]
    fn lfu() {
        // 1 has count 2, so 3 evicts 2.
        assert_eq!(outcomes_for(PolicyKind::Lfu, 2, &TRACE), [M, M, H, M, M]);
    }

    #[test]
    fn two_q() {
        // One A1in slot, one Am slot: the repeat of 1 is a ghost promotion,
        // not a hit, and 2's return evicts 1 from Am.
        assert_eq!(outcomes_for(PolicyKind::TwoQ, 2, &TRACE), [M, M, M, M, M]);
    }

    #[test]
    fn arc() {
        assert_eq!(outcomes_for(PolicyKind::Arc, 2, &TRACE), [M, M, H, M, M]);
    }

    #[test]
    fn opt() {
        // 3 evicts 1, which never recurs.
        assert_eq!(outcomes_for(PolicyKind::Opt, 2, &TRACE), [M, M, H, M, H]);
    }
}

// ==============================================
// Capacity Bound
// ==============================================

mod capacity_bound {
    use super::*;

    #[test]
    fn len_never_exceeds_capacity() {
        let requests: Vec<u32> = (0..2_000).map(|i| (i * 31 + i / 7) % 97).collect();
        for kind in PolicyKind::ALL {
            for capacity in [1, 2, 3, 8, 50] {
                let mut cache = CacheBuilder::new(capacity)
                    .try_build_for(kind, &requests)
                    .unwrap();
                for key in &requests {
                    cache.access(key);
                    assert!(
                        cache.len() <= capacity,
                        "{kind} at capacity {capacity} holds {}",
                        cache.len()
                    );
                }
                cache.check_invariants().unwrap();
            }
        }
    }

    #[test]
    fn fills_to_capacity_on_distinct_keys() {
        let requests: Vec<u32> = (0..20).collect();
        for kind in PolicyKind::ALL {
            let mut cache = CacheBuilder::new(5).try_build_for(kind, &requests).unwrap();
            run(&mut cache, &requests).unwrap();
            // One-shot keys never leave 2Q's single A1in slot.
            let expected = if kind == PolicyKind::TwoQ { 1 } else { 5 };
            assert_eq!(cache.len(), expected, "{kind}");
        }
    }
}

// ==============================================
// Per-Policy Eviction Rules
// ==============================================

mod fifo_order {
    use cachesim::policy::fifo::FifoCache;

    use super::*;

    #[test]
    fn hits_do_not_delay_eviction() {
        let mut cache = FifoCache::new(3);
        for key in [1, 2, 3] {
            cache.access(&key);
        }
        for _ in 0..10 {
            assert_eq!(cache.access(&1), Access::Hit);
        }
        cache.access(&4);
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2) && cache.contains(&3) && cache.contains(&4));
    }
}

mod lru_exact {
    use cachesim::policy::lru::LruCache;

    use super::*;

    #[test]
    fn capacity_plus_one_distinct_then_first_misses() {
        for capacity in 1..10u32 {
            let mut cache = LruCache::new(capacity as usize);
            for key in 0..=capacity {
                cache.access(&key);
            }
            assert_eq!(cache.access(&0), Access::Miss, "capacity {capacity}");
        }
    }
}

mod lfu_ties {
    use cachesim::policy::lfu::LfuCache;

    use super::*;

    #[test]
    fn equal_counts_evict_earlier_insert() {
        let mut cache = LfuCache::new(2);
        cache.access(&"a");
        cache.access(&"b");
        cache.access(&"c");
        assert!(!cache.contains(&"a"));
        assert!(cache.contains(&"b"));
    }

    #[test]
    fn equal_higher_counts_evict_earlier_insert() {
        let mut cache = LfuCache::new(2);
        for key in ["a", "b", "a", "b"] {
            cache.access(&key);
        }
        assert_eq!(cache.frequency(&"a"), Some(2));
        assert_eq!(cache.frequency(&"b"), Some(2));
        cache.access(&"c");
        assert!(!cache.contains(&"a"));
        assert!(cache.contains(&"b"));
    }
}

mod two_q_promotion {
    use cachesim::policy::two_q::{TwoQCache, TwoQConfig};

    use super::*;

    #[test]
    fn second_access_within_ghost_window_lands_in_main() {
        // Capacity 4 at 25/75: one A1in slot, three Am slots.
        let mut cache = TwoQCache::try_new(4, TwoQConfig::default()).unwrap();
        assert_eq!(cache.a1in_capacity(), 1);
        assert_eq!(cache.am_capacity(), 3);

        for key in ["a", "b", "c"] {
            assert_eq!(cache.access(&key), Access::Miss);
        }
        assert!(cache.in_ghost(&"a"));
        assert!(cache.in_ghost(&"b"));

        assert_eq!(cache.access(&"a"), Access::Miss);
        assert!(cache.in_main(&"a"));
        assert!(!cache.in_ghost(&"a"));
    }

    #[test]
    fn single_access_never_reaches_main() {
        let mut cache = TwoQCache::try_new(4, TwoQConfig::default()).unwrap();
        for key in 0..100u32 {
            cache.access(&key);
            assert_eq!(cache.am_len(), 0);
        }
    }
}

mod arc_adaptation {
    use cachesim::policy::arc::ArcCache;

    use super::*;

    #[test]
    fn p_stays_within_bounds_on_mixed_trace() {
        let mut cache = ArcCache::new(8);
        for i in 0..5_000u32 {
            let key = if i % 3 == 0 { i % 11 } else { i % 37 };
            cache.access(&key);
            assert!(cache.p() <= 8);
        }
        cache.check_invariants().unwrap();
    }
}

mod opt_offline {
    use cachesim::error::ConfigError;

    use super::*;

    #[test]
    fn online_build_is_refused() {
        assert_eq!(
            CacheBuilder::new(4).try_build::<u32>(PolicyKind::Opt).unwrap_err(),
            ConfigError::MissingSequence
        );
    }

    #[test]
    fn opt_dominates_on_fixed_traces() {
        let traces: [Vec<u32>; 3] = [
            (0..500).map(|i| i % 9).collect(),
            (0..500).map(|i| (i * i) % 23).collect(),
            (0..500).map(|i| if i % 4 == 0 { 100 + i } else { i % 5 }).collect(),
        ];
        for requests in &traces {
            let opt_hits = hits(PolicyKind::Opt, 4, requests);
            for kind in PolicyKind::ALL {
                assert!(hits(kind, 4, requests) <= opt_hits, "{kind} beat OPT");
            }
        }
    }

    fn hits(kind: PolicyKind, capacity: usize, requests: &[u32]) -> usize {
        outcomes_for(kind, capacity, requests)
            .iter()
            .filter(|a| a.is_hit())
            .count()
    }
}

// ==============================================
// Capacity-0 Behavior
// ==============================================
//
// Plain constructors accept zero and admit nothing; the fallible ones and
// the builder reject it.

mod zero_capacity {
    use cachesim::policy::{ArcCache, FifoCache, LfuCache, LruCache};

    use super::*;

    #[test]
    fn new_zero_admits_nothing() {
        let mut fifo = FifoCache::new(0);
        let mut lru = LruCache::new(0);
        let mut lfu = LfuCache::new(0);
        let mut arc = ArcCache::new(0);
        for _ in 0..3 {
            assert_eq!(fifo.access(&1), Access::Miss);
            assert_eq!(lru.access(&1), Access::Miss);
            assert_eq!(lfu.access(&1), Access::Miss);
            assert_eq!(arc.access(&1), Access::Miss);
        }
        assert!(fifo.is_empty() && lru.is_empty() && lfu.is_empty() && arc.is_empty());
    }

    #[test]
    fn try_new_zero_is_rejected() {
        assert!(FifoCache::<u32>::try_new(0).is_err());
        assert!(LruCache::<u32>::try_new(0).is_err());
        assert!(LfuCache::<u32>::try_new(0).is_err());
        assert!(ArcCache::<u32>::try_new(0).is_err());
    }
}
