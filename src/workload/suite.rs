//! The fixed benchmark suite: nine deterministic recipes, WL01 to WL09.
//!
//! Each recipe builds exactly [`SUITE_REQUESTS`] requests from loops and
//! arithmetic alone (no randomness) and is shaped so that one policy family
//! stands out at a cache of [`SUITE_CAPACITY`] pages. `category` names that
//! family.
//!
//! | Key | Favors | Shape |
//! |-----|--------|-------|
//! | WL01 | LFU  | 5 very hot pages, 100 cold pages per round |
//! | WL02 | LFU  | 20 hot pages near capacity, 40 warm pages |
//! | WL03 | LRU  | 28-page window sliding by one |
//! | WL04 | LRU  | window alternating between 25 and 45 pages |
//! | WL05 | FIFO | early frequency pollution, then a new working set |
//! | WL06 | ARC  | hot loop alternating with a drifting window |
//! | WL07 | 2Q   | hot sets, windows and a long cold scan per cycle |
//! | WL08 | ARC  | two hot sets, a window, a bridge and a cold scan |
//! | WL09 | ARC  | frequency, recency and scan modes, 5,000 requests each |
//!
//! ## Example
//!
//! ```
//! use cachesim::workload::suite::{self, SUITE_REQUESTS};
//!
//! let recipe = suite::find("wl03").unwrap();
//! assert_eq!(recipe.key, "WL03_STATIC_SW");
//! let trace = recipe.build();
//! assert_eq!(trace.len(), SUITE_REQUESTS);
//! assert_eq!(&trace[..3], &[1, 2, 3]);
//! ```

use std::iter;

use serde::Serialize;

use crate::builder::PolicyKind;
use crate::workload::WorkloadError;

/// Requests produced by every recipe.
pub const SUITE_REQUESTS: usize = 50_000;

/// Cache size the recipes are tuned for.
pub const SUITE_CAPACITY: usize = 32;

/// A named, deterministic request sequence.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Recipe {
    pub key: &'static str,
    /// Policy family the recipe is built to favor.
    pub category: PolicyKind,
    pub goal: &'static str,
    pub steps: &'static [&'static str],
    #[serde(skip)]
    builder: fn() -> Vec<u64>,
}

impl Recipe {
    /// Builds the request sequence. Always [`SUITE_REQUESTS`] long.
    pub fn build(&self) -> Vec<u64> {
        (self.builder)()
    }

    /// Short name, `WL01` to `WL09`.
    pub fn short_key(&self) -> &'static str {
        self.key.get(..4).unwrap_or(self.key)
    }
}

static RECIPES: [Recipe; 9] = [
    Recipe {
        key: "WL01_STATIC_FREQ",
        category: PolicyKind::Lfu,
        goal: "Static frequency: a small, very hot set against a large cold set",
        steps: &[
            "pages 1-5, 100 requests each per round",
            "pages 6-105, once each per round",
            "600 requests per round",
        ],
        builder: static_frequency,
    },
    Recipe {
        key: "WL02_FREQ_BALANCED",
        category: PolicyKind::Lfu,
        goal: "Balanced frequency: a hot set close to the cache size",
        steps: &[
            "pages 1-20, 10 requests each per round",
            "pages 21-60, once each per round",
            "240 requests per round",
        ],
        builder: frequency_balanced,
    },
    Recipe {
        key: "WL03_STATIC_SW",
        category: PolicyKind::Lru,
        goal: "Static sliding window of 28 pages, shifted by one each pass",
        steps: &[
            "window of 28 pages, just under the cache size",
            "each pass starts one page later, wrapping below page 500",
            "pure recency, no frequency signal",
        ],
        builder: static_sliding_window,
    },
    Recipe {
        key: "WL04_OSC_SW",
        category: PolicyKind::Lru,
        goal: "Sliding window alternating between 25 and 45 pages",
        steps: &[
            "small phase: 25-page windows for 2,500 requests",
            "large phase: 45-page windows for up to 2,500 requests",
            "phases alternate, each starting where the last one drifted to",
        ],
        builder: oscillating_window,
    },
    Recipe {
        key: "WL05_FIFO_CONVOY",
        category: PolicyKind::Fifo,
        goal: "Frequency pollution followed by a complete working-set shift",
        steps: &[
            "pages 1-32 looped 50 times, inflating their counts",
            "then pages 33-64 looped until the end",
            "the new set fits the cache exactly",
        ],
        builder: fifo_convoy,
    },
    Recipe {
        key: "WL06_ADAPTIVE_FREQ_RECENCY",
        category: PolicyKind::Arc,
        goal: "Alternating frequency and recency phases",
        steps: &[
            "phase A: pages 1-10 looped 10 times",
            "phase B: a 32-page window, drifting by 7 each round",
            "132 requests per round",
        ],
        builder: adaptive_frequency_recency,
    },
    Recipe {
        key: "WL07_SCAN_SANDWICH",
        category: PolicyKind::TwoQ,
        goal: "Hot sets sandwiched between windows and a long cold scan",
        steps: &[
            "three 10-page hot sets repeated 5, 4 and 3 times",
            "two 32-page windows",
            "hot sets 1 and 3 alternated three times",
            "two 48-page windows",
            "200 never-repeated pages",
        ],
        builder: scan_sandwich,
    },
    Recipe {
        key: "WL08_ARC_MOSAIC",
        category: PolicyKind::Arc,
        goal: "Two hot sets, a drifting window, a bridge and a cold scan",
        steps: &[
            "pages 1-6 looped 12 times",
            "a 30-page window, drifting by 23 each round",
            "pages 31-36 looped 6 times, then bridge pages 90-105",
            "60 never-repeated pages, then one pass over each hot set",
        ],
        builder: arc_mosaic,
    },
    Recipe {
        key: "WL09_ADAPTIVE_MIXED",
        category: PolicyKind::Arc,
        goal: "Pattern switch every 5,000 requests",
        steps: &[
            "frequency: pages 1-5 ten times each, then pages 6-20 once",
            "recency: 30-page window sliding by one",
            "scan: 5 hot requests over pages 1-3 in every 50",
        ],
        builder: adaptive_mixed,
    },
];

/// All recipes, WL01 first.
pub fn recipes() -> &'static [Recipe] {
    &RECIPES
}

/// Looks a recipe up by full key, short key (`WL03`, any case) or number
/// (`3`).
pub fn find(selector: &str) -> Result<&'static Recipe, WorkloadError> {
    let wanted = selector.trim();
    let by_number = wanted
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| RECIPES.get(idx));
    by_number
        .or_else(|| {
            RECIPES.iter().find(|r| {
                r.key.eq_ignore_ascii_case(wanted) || r.short_key().eq_ignore_ascii_case(wanted)
            })
        })
        .ok_or_else(|| WorkloadError::UnknownRecipe(selector.to_string()))
}

// Appends rounds until the target is reached, then cuts to length. `round`
// receives the zero-based round number.
fn fill_rounds(mut trace: Vec<u64>, mut round: impl FnMut(&mut Vec<u64>, u64)) -> Vec<u64> {
    let mut step = 0;
    while trace.len() < SUITE_REQUESTS {
        round(&mut trace, step);
        step += 1;
    }
    trace.truncate(SUITE_REQUESTS);
    trace
}

fn empty() -> Vec<u64> {
    Vec::with_capacity(SUITE_REQUESTS + 256)
}

fn static_frequency() -> Vec<u64> {
    fill_rounds(empty(), |trace, _| {
        for page in 1..=5 {
            trace.extend(iter::repeat_n(page, 100));
        }
        trace.extend(6..=105);
    })
}

fn frequency_balanced() -> Vec<u64> {
    fill_rounds(empty(), |trace, _| {
        for page in 1..=20 {
            trace.extend(iter::repeat_n(page, 10));
        }
        trace.extend(21..=60);
    })
}

fn static_sliding_window() -> Vec<u64> {
    const WINDOW: u64 = 28;
    const SPAN: u64 = 500 - WINDOW + 1;

    let mut trace = empty();
    let passes = (SUITE_REQUESTS as u64) / WINDOW;
    for pass in 0..passes {
        let start = 1 + pass % SPAN;
        trace.extend(start..start + WINDOW);
    }
    // Partial final pass.
    let start = 1 + passes % SPAN;
    let rest = (SUITE_REQUESTS - trace.len()) as u64;
    trace.extend(start..start + rest);
    trace
}

fn oscillating_window() -> Vec<u64> {
    const MAX_PAGE: u64 = 500;
    const PHASE: usize = 2_500;

    let mut trace = empty();
    let mut origin = 1u64;
    let mut phase = 0usize;
    while trace.len() < SUITE_REQUESTS {
        let window = if phase % 2 == 0 { 25 } else { 45 };
        let budget = PHASE.min(SUITE_REQUESTS - trace.len()) as u64;
        let passes = budget / window;
        if passes == 0 {
            break;
        }
        for pass in 0..passes {
            let mut start = origin + pass;
            if start + window > MAX_PAGE {
                start = 1;
            }
            trace.extend(start..start + window);
        }
        origin = (origin + passes) % (MAX_PAGE - window + 1);
        if origin == 0 {
            origin = 1;
        }
        phase += 1;
    }
    trace.truncate(SUITE_REQUESTS);
    trace
}

fn fifo_convoy() -> Vec<u64> {
    let mut trace = empty();
    for _ in 0..50 {
        trace.extend(1..=32);
    }
    fill_rounds(trace, |trace, _| trace.extend(33..=64))
}

fn hot_ten_loop(trace: &mut Vec<u64>) {
    for _ in 0..10 {
        trace.extend(1..=10);
    }
}

fn adaptive_frequency_recency() -> Vec<u64> {
    const ROUND: usize = 100 + 32;

    let mut trace = empty();
    for step in 0..(SUITE_REQUESTS / ROUND) as u64 {
        hot_ten_loop(&mut trace);
        let start = 1 + step * 7 % 469;
        trace.extend(start..start + 32);
    }
    // Top up with hot loops only.
    fill_rounds(trace, |trace, _| hot_ten_loop(trace))
}

fn scan_sandwich() -> Vec<u64> {
    const SMALL_SPAN: u64 = 900 - 32 - 49;
    const LARGE_SPAN: u64 = 900 - 48 - 99;

    fill_rounds(empty(), |trace, step| {
        for (first, reps) in [(1, 5), (11, 4), (31, 3)] {
            for _ in 0..reps {
                trace.extend(first..first + 10);
            }
        }

        let start = 50 + step * 19 % SMALL_SPAN;
        trace.extend(start..start + 32);
        let start = 100 + step * 23 % SMALL_SPAN;
        trace.extend(start..start + 32);

        for _ in 0..3 {
            trace.extend(1..=10);
            trace.extend(31..=40);
        }

        let start = 150 + step * 29 % LARGE_SPAN;
        trace.extend(start..start + 48);
        let start = 220 + step * 31 % LARGE_SPAN;
        trace.extend(start..start + 48);

        let scan = 4_000 + step * 200;
        trace.extend(scan..scan + 200);
    })
}

fn arc_mosaic() -> Vec<u64> {
    fill_rounds(empty(), |trace, step| {
        for _ in 0..12 {
            trace.extend(1..=6);
        }

        let start = 200 + step * 23 % 670;
        trace.extend(start..start + 30);

        for _ in 0..6 {
            trace.extend(31..=36);
        }
        trace.extend(90..=105);

        let scan = 1_200 + step * 60;
        trace.extend(scan..scan + 60);
        trace.extend(1..=6);
        trace.extend(31..=36);
    })
}

fn adaptive_mixed() -> Vec<u64> {
    const PHASE: usize = 5_000;

    let mut trace = empty();
    let mut phase = 0u64;
    while trace.len() < SUITE_REQUESTS {
        let budget = PHASE.min(SUITE_REQUESTS - trace.len());
        match phase % 3 {
            0 => frequency_mode(&mut trace, budget),
            1 => {
                let start = 1 + (phase / 3) * 10 % 471;
                for pass in 0..(budget / 30) as u64 {
                    let mut from = start + pass;
                    if from + 30 > 500 {
                        from = 1;
                    }
                    trace.extend(from..from + 30);
                }
            }
            _ => {
                let mut scan = 1_000 + (phase / 3) * 1_000;
                let mut hot = 0u64;
                for n in 0..budget {
                    if n % 50 < 5 {
                        trace.push(1 + hot % 3);
                        hot += 1;
                    } else {
                        trace.push(scan);
                        scan += 1;
                    }
                }
            }
        }
        phase += 1;
    }
    trace.truncate(SUITE_REQUESTS);
    trace
}

// Hot pages in blocks of ten, then single cold pages, until `budget` is
// spent. A hot block may overshoot the budget by up to nine requests.
fn frequency_mode(trace: &mut Vec<u64>, budget: usize) {
    let mut spent = 0;
    let exhausted = |spent: usize, len: usize| spent >= budget || len >= SUITE_REQUESTS;
    while !exhausted(spent, trace.len()) {
        for page in 1..=5 {
            if exhausted(spent, trace.len()) {
                break;
            }
            trace.extend(iter::repeat_n(page, 10));
            spent += 10;
        }
        for page in 6..=20 {
            if exhausted(spent, trace.len()) {
                break;
            }
            trace.push(page);
            spent += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(key: &str) -> Vec<u64> {
        find(key).unwrap().build()
    }

    #[test]
    fn every_recipe_has_the_suite_length() {
        assert_eq!(recipes().len(), 9);
        for (i, recipe) in recipes().iter().enumerate() {
            assert_eq!(recipe.short_key(), format!("WL{:02}", i + 1));
            assert_eq!(recipe.build().len(), SUITE_REQUESTS, "{}", recipe.key);
            assert!(!recipe.steps.is_empty());
        }
    }

    #[test]
    fn recipes_are_deterministic() {
        for recipe in recipes() {
            assert_eq!(recipe.build(), recipe.build(), "{}", recipe.key);
        }
    }

    #[test]
    fn lookup_by_key_short_key_and_number() {
        assert_eq!(find("WL07_SCAN_SANDWICH").unwrap().category, PolicyKind::TwoQ);
        assert_eq!(find("wl05").unwrap().category, PolicyKind::Fifo);
        assert_eq!(find(" 9 ").unwrap().key, "WL09_ADAPTIVE_MIXED");
        assert!(matches!(find("10"), Err(WorkloadError::UnknownRecipe(_))));
        assert!(matches!(find("0"), Err(WorkloadError::UnknownRecipe(_))));
        assert!(find("WL99").is_err());
    }

    #[test]
    fn wl01_hot_blocks_then_cold_sweep() {
        let t = trace("WL01");
        assert!(t[..100].iter().all(|&p| p == 1));
        assert_eq!(t[100], 2);
        assert_eq!(t[500], 6);
        assert_eq!(t[599], 105);
        assert_eq!(t[600], 1);
    }

    #[test]
    fn wl02_hot_then_warm() {
        let t = trace("WL02");
        assert_eq!(&t[..11], &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2]);
        assert_eq!(t[200], 21);
        assert_eq!(t[239], 60);
        assert_eq!(t[240], 1);
    }

    #[test]
    fn wl03_window_shifts_by_one() {
        let t = trace("WL03");
        assert_eq!(t[..28], (1..=28).collect::<Vec<u64>>()[..]);
        assert_eq!(t[28], 2);
        // 1,785 full passes, then 20 requests from page 367.
        assert_eq!(t[49_980], 367);
        assert_eq!(t[49_999], 386);
    }

    #[test]
    fn wl04_phases_alternate_window_size() {
        let t = trace("WL04");
        assert_eq!(t[..25], (1..=25).collect::<Vec<u64>>()[..]);
        assert_eq!(t[25], 2);
        assert_eq!(&t[2_500..2_502], &[101, 102]);
        assert_eq!(t[2_544], 145);
        assert_eq!(t[2_545], 102);
    }

    #[test]
    fn wl05_pollution_then_new_set() {
        let t = trace("WL05");
        assert_eq!(t[31], 32);
        assert_eq!(t[32], 1);
        assert_eq!(t[1_599], 32);
        assert_eq!(t[1_600], 33);
        assert_eq!(t[1_632], 33);
        assert_eq!(t[49_999], 48);
        assert!(t[1_600..].iter().all(|&p| (33..=64).contains(&p)));
    }

    #[test]
    fn wl06_hot_loop_then_drifting_window() {
        let t = trace("WL06");
        assert_eq!(t[..10], (1..=10).collect::<Vec<u64>>()[..]);
        assert_eq!(t[100], 1);
        assert_eq!(t[131], 32);
        assert_eq!(t[232], 8);
        assert_eq!(&t[49_996..], &[1, 2, 3, 4]);
    }

    #[test]
    fn wl07_cycle_layout() {
        let t = trace("WL07");
        assert_eq!(t[50], 11);
        assert_eq!(t[90], 31);
        assert_eq!(t[120], 50);
        assert_eq!(t[152], 100);
        assert_eq!(t[184], 1);
        assert_eq!(t[194], 31);
        assert_eq!(t[244], 150);
        assert_eq!(t[292], 220);
        assert_eq!(t[340], 4_000);
        assert_eq!(t[539], 4_199);
        assert_eq!(t[540], 1);
        assert_eq!(t[660], 69);
    }

    #[test]
    fn wl08_cycle_layout() {
        let t = trace("WL08");
        assert_eq!(&t[..6], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(t[72], 200);
        assert_eq!(t[102], 31);
        assert_eq!(t[138], 90);
        assert_eq!(t[154], 1_200);
        assert_eq!(t[214], 1);
        assert_eq!(t[220], 31);
        assert_eq!(t[226], 1);
        assert_eq!(t[298], 223);
    }

    #[test]
    fn wl09_modes_rotate() {
        let t = trace("WL09");
        assert!(t[..10].iter().all(|&p| p == 1));
        assert_eq!(t[10], 2);
        assert_eq!(t[50], 6);
        assert_eq!(t[64], 20);
        assert_eq!(t[65], 1);
        // Recency mode: 166 windows of 30.
        assert_eq!(t[5_000], 1);
        assert_eq!(t[5_030], 2);
        // Scan mode: 5 hot requests, then the scan.
        assert_eq!(&t[9_980..9_986], &[1, 2, 3, 1, 2, 1_000]);
        // Last phase is a short recency run from page 31.
        assert_eq!(t[49_940], 31);
        assert_eq!(t[49_970], 32);
        assert_eq!(t[49_999], 61);
    }
}
