//! Aggregates an outcome sequence into the numbers a report prints.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//!
//! use cachesim::metrics::{CostModel, RunSummary};
//! use cachesim::simulator::AccessOutcome;
//! use cachesim::traits::Access;
//!
//! let outcomes = [
//!     AccessOutcome { index: 0, access: Access::Miss, elapsed: Duration::from_nanos(40) },
//!     AccessOutcome { index: 1, access: Access::Hit, elapsed: Duration::from_nanos(20) },
//! ];
//! let summary = RunSummary::from_outcomes(&outcomes, &CostModel::default());
//! assert_eq!(summary.hit_rate, 50.0);
//! assert_eq!(summary.avg_overhead_ns, 30.0);
//! assert_eq!(summary.weighted_cost, 101.0);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::simulator::AccessOutcome;

/// Relative cost of serving a hit and a miss, in arbitrary units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostModel {
    pub hit_cost: f64,
    pub miss_cost: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            hit_cost: 1.0,
            miss_cost: 100.0,
        }
    }
}

impl CostModel {
    pub fn cost(&self, hits: u64, misses: u64) -> f64 {
        hits as f64 * self.hit_cost + misses as f64 * self.miss_cost
    }
}

/// Latency percentiles over the per-access timings of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min_ns: u64,
    pub p50_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
}

impl LatencyStats {
    /// Sorts `samples` in place and reads the percentiles off it.
    pub fn from_samples(samples: &mut [Duration]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        samples.sort_unstable();
        let n = samples.len();
        let total: Duration = samples.iter().sum();
        let nanos = |d: Duration| d.as_nanos() as u64;

        Self {
            min_ns: nanos(samples[0]),
            p50_ns: nanos(samples[n / 2]),
            p95_ns: nanos(samples[(n * 95) / 100]),
            p99_ns: nanos(samples[(n * 99) / 100]),
            max_ns: nanos(samples[n - 1]),
            mean_ns: total.as_nanos() as f64 / n as f64,
        }
    }
}

/// Hit/miss totals, timing and weighted cost for one policy run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    /// Percentage of requests served from the cache, in `[0, 100]`.
    pub hit_rate: f64,
    /// Percentage of requests that missed, `100 - hit_rate`.
    pub miss_rate: f64,
    pub total_overhead_ns: u64,
    pub avg_overhead_ns: f64,
    pub latency: LatencyStats,
    pub weighted_cost: f64,
    pub avg_cost: f64,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[AccessOutcome], costs: &CostModel) -> Self {
        let requests = outcomes.len() as u64;
        let hits = outcomes.iter().filter(|o| o.access.is_hit()).count() as u64;
        let misses = requests - hits;

        let mut samples: Vec<Duration> = outcomes.iter().map(|o| o.elapsed).collect();
        let total_overhead_ns = samples.iter().map(|d| d.as_nanos() as u64).sum();
        let latency = LatencyStats::from_samples(&mut samples);

        let weighted_cost = costs.cost(hits, misses);
        let per_request = |value: f64| {
            if requests == 0 {
                0.0
            } else {
                value / requests as f64
            }
        };
        let hit_rate = per_request(hits as f64) * 100.0;

        Self {
            requests,
            hits,
            misses,
            hit_rate,
            miss_rate: if requests == 0 { 0.0 } else { 100.0 - hit_rate },
            total_overhead_ns,
            avg_overhead_ns: per_request(total_overhead_ns as f64),
            latency,
            weighted_cost,
            avg_cost: per_request(weighted_cost),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Access;

    fn outcome(index: usize, hit: bool, nanos: u64) -> AccessOutcome {
        AccessOutcome {
            index,
            access: Access::from_hit(hit),
            elapsed: Duration::from_nanos(nanos),
        }
    }

    #[test]
    fn summary_counts_and_rates() {
        let outcomes: Vec<_> = (0..10).map(|i| outcome(i, i % 4 == 0, 10)).collect();
        let summary = RunSummary::from_outcomes(&outcomes, &CostModel::default());

        assert_eq!(summary.requests, 10);
        assert_eq!(summary.hits, 3);
        assert_eq!(summary.misses, 7);
        assert!((summary.hit_rate - 30.0).abs() < 1e-9);
        assert!((summary.miss_rate - 70.0).abs() < 1e-9);
        assert_eq!(summary.total_overhead_ns, 100);
        assert_eq!(summary.avg_overhead_ns, 10.0);
        assert_eq!(summary.weighted_cost, 3.0 + 700.0);
        assert!((summary.avg_cost - 70.3).abs() < 1e-9);
    }

    #[test]
    fn empty_run_is_all_zero() {
        let summary = RunSummary::from_outcomes(&[], &CostModel::default());
        assert_eq!(summary.requests, 0);
        assert_eq!(summary.hit_rate, 0.0);
        assert_eq!(summary.miss_rate, 0.0);
        assert_eq!(summary.avg_overhead_ns, 0.0);
        assert_eq!(summary.latency, LatencyStats::default());
    }

    #[test]
    fn latency_percentiles_from_unsorted_samples() {
        let mut samples: Vec<Duration> = (1..=100).rev().map(Duration::from_nanos).collect();
        let stats = LatencyStats::from_samples(&mut samples);
        assert_eq!(stats.min_ns, 1);
        assert_eq!(stats.p50_ns, 51);
        assert_eq!(stats.p95_ns, 96);
        assert_eq!(stats.p99_ns, 100);
        assert_eq!(stats.max_ns, 100);
        assert!((stats.mean_ns - 50.5).abs() < 1e-9);
    }

    #[test]
    fn custom_cost_model() {
        let costs = CostModel {
            hit_cost: 0.0,
            miss_cost: 1.0,
        };
        let outcomes = [outcome(0, false, 1), outcome(1, true, 1)];
        let summary = RunSummary::from_outcomes(&outcomes, &costs);
        assert_eq!(summary.weighted_cost, 1.0);
        assert_eq!(summary.avg_cost, 0.5);
    }
}
