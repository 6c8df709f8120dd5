//! Side-by-side runs of several policies over one request sequence.
//!
//! Every selected policy gets a fresh instance with the same capacity and
//! replays the same read-only sequence. With `parallel(true)` each policy runs
//! on its own scoped thread; instances share nothing but the borrowed input.
//!
//! ## Example
//!
//! ```
//! use cachesim::builder::PolicyKind;
//! use cachesim::compare::Comparison;
//!
//! let requests: Vec<u64> = (0..200).map(|i| i % 7).collect();
//! let runs = Comparison::new(4)
//!     .policies([PolicyKind::Lru, PolicyKind::Opt])
//!     .run(&requests)
//!     .unwrap();
//!
//! assert_eq!(runs[0].policy, PolicyKind::Lru);
//! assert!(runs[1].summary.hits >= runs[0].summary.hits);
//! ```

use std::thread;

use serde::Serialize;
use tracing::{debug, info};

use crate::builder::{CacheBuilder, PolicyKind};
use crate::error::SimulationError;
use crate::metrics::snapshot::PolicySnapshot;
use crate::metrics::summary::{CostModel, RunSummary};
use crate::policy::two_q::TwoQConfig;
use crate::simulator::{AccessOutcome, Simulator};
use crate::traits::{CacheKey, CoreCache};
use crate::workload::suite::Recipe;

/// A1out size used while tuning 2Q.
pub const TUNING_A1OUT_SLOTS: usize = 32;

/// Default upper bound on the A1in sizes tried by [`tune_two_q`].
pub const TUNING_MAX_A1IN: usize = 16;

/// One policy's result within a comparison.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyRun {
    pub policy: PolicyKind,
    pub summary: RunSummary,
    pub snapshot: PolicySnapshot,
    #[serde(skip)]
    pub outcomes: Vec<AccessOutcome>,
}

/// Runs a fixed set of policies against the same sequence.
#[derive(Debug, Clone)]
pub struct Comparison {
    builder: CacheBuilder,
    policies: Vec<PolicyKind>,
    costs: CostModel,
    parallel: bool,
    deep_checks: bool,
}

impl Comparison {
    /// Compares every policy at `capacity`, sequentially.
    pub fn new(capacity: usize) -> Self {
        Self {
            builder: CacheBuilder::new(capacity),
            policies: PolicyKind::ALL.to_vec(),
            costs: CostModel::default(),
            parallel: false,
            deep_checks: false,
        }
    }

    /// Restricts the run to `policies`, reported in this order.
    pub fn policies(mut self, policies: impl IntoIterator<Item = PolicyKind>) -> Self {
        self.policies = policies.into_iter().collect();
        self
    }

    pub fn two_q(mut self, config: TwoQConfig) -> Self {
        self.builder = self.builder.two_q(config);
        self
    }

    /// Sizes the 2Q queues explicitly, e.g. from [`tune_two_q`].
    pub fn two_q_slots(mut self, a1in_slots: usize, a1out_slots: usize) -> Self {
        self.builder = self.builder.two_q_slots(a1in_slots, a1out_slots);
        self
    }

    pub fn cost_model(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// See [`Simulator::deep_checks`].
    pub fn deep_checks(mut self, enabled: bool) -> Self {
        self.deep_checks = enabled;
        self
    }

    pub fn capacity(&self) -> usize {
        self.builder.capacity()
    }

    pub fn selected(&self) -> &[PolicyKind] {
        &self.policies
    }

    /// Runs each selected policy over `requests`.
    ///
    /// Stops at the first policy that fails to build or aborts; results come
    /// back in selection order.
    pub fn run<K>(&self, requests: &[K]) -> Result<Vec<PolicyRun>, SimulationError>
    where
        K: CacheKey + Sync,
    {
        debug!(
            capacity = self.capacity(),
            policies = self.policies.len(),
            requests = requests.len(),
            parallel = self.parallel,
            "comparison started"
        );

        if !self.parallel {
            return self
                .policies
                .iter()
                .map(|&kind| self.run_one(kind, requests))
                .collect();
        }

        thread::scope(|scope| {
            let handles: Vec<_> = self
                .policies
                .iter()
                .map(|&kind| scope.spawn(move || self.run_one(kind, requests)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    fn run_one<K: CacheKey>(
        &self,
        kind: PolicyKind,
        requests: &[K],
    ) -> Result<PolicyRun, SimulationError> {
        let mut cache = self.builder.try_build_for(kind, requests)?;
        let outcomes = Simulator::new(requests)
            .deep_checks(self.deep_checks)
            .run(&mut cache)?;
        let summary = RunSummary::from_outcomes(&outcomes, &self.costs);

        debug!(
            policy = %kind,
            hits = summary.hits,
            hit_rate = summary.hit_rate,
            avg_ns = summary.avg_overhead_ns,
            "policy finished"
        );
        Ok(PolicyRun {
            policy: kind,
            summary,
            snapshot: cache.snapshot(),
            outcomes,
        })
    }
}

/// One suite recipe run through every selected policy, with 2Q tuned first.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteRun {
    pub recipe: &'static Recipe,
    pub tuning: TwoQTuning,
    pub runs: Vec<PolicyRun>,
}

impl SuiteRun {
    /// Highest hit rate among the online policies; the earlier run wins ties.
    pub fn best_online(&self) -> Option<&PolicyRun> {
        self.runs
            .iter()
            .filter(|run| !run.policy.is_offline())
            .fold(None, |best: Option<&PolicyRun>, run| match best {
                Some(b) if b.summary.hit_rate >= run.summary.hit_rate => Some(b),
                _ => Some(run),
            })
    }
}

impl Comparison {
    /// Builds `recipe`, tunes 2Q on it at this capacity, then runs the
    /// selected policies with the tuned queue sizes.
    pub fn run_recipe(&self, recipe: &'static Recipe) -> Result<SuiteRun, SimulationError> {
        let requests = recipe.build();
        let tuning = tune_two_q(self.capacity(), &requests, TUNING_MAX_A1IN)?;
        let runs = self
            .clone()
            .two_q_slots(tuning.a1in_slots, tuning.a1out_slots)
            .run(&requests)?;
        info!(
            workload = recipe.key,
            a1in = tuning.a1in_slots,
            "suite workload finished"
        );
        Ok(SuiteRun {
            recipe,
            tuning,
            runs,
        })
    }
}

/// Best A1in size found by [`tune_two_q`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TwoQTuning {
    pub a1in_slots: usize,
    pub a1out_slots: usize,
    /// Hit rate in percent at the chosen size.
    pub hit_rate: f64,
}

/// Searches A1in sizes `1..=min(max_a1in, capacity - 1)` for the best 2Q hit
/// rate on `requests`, with A1out fixed at [`TUNING_A1OUT_SLOTS`].
///
/// Offline: it replays the whole sequence once per candidate. The smallest
/// size wins ties.
pub fn tune_two_q<K: CacheKey>(
    capacity: usize,
    requests: &[K],
    max_a1in: usize,
) -> Result<TwoQTuning, SimulationError> {
    let upper = max_a1in.min(capacity.saturating_sub(1)).max(1);
    let mut tuning = TwoQTuning {
        a1in_slots: 1,
        a1out_slots: TUNING_A1OUT_SLOTS,
        hit_rate: f64::NEG_INFINITY,
    };

    for a1in in 1..=upper {
        let mut cache = CacheBuilder::new(capacity)
            .two_q_slots(a1in, TUNING_A1OUT_SLOTS)
            .try_build::<K>(PolicyKind::TwoQ)?;
        let outcomes = Simulator::new(requests).run(&mut cache)?;
        let hit_rate = RunSummary::from_outcomes(&outcomes, &CostModel::default()).hit_rate;

        if hit_rate > tuning.hit_rate {
            tuning.a1in_slots = a1in;
            tuning.hit_rate = hit_rate;
        }
    }

    debug!(
        a1in = tuning.a1in_slots,
        a1out = tuning.a1out_slots,
        hit_rate = tuning.hit_rate,
        "2Q tuning finished"
    );
    Ok(tuning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn looping_trace() -> Vec<u32> {
        (0..600).map(|i| if i % 3 == 0 { i % 40 } else { i % 5 }).collect()
    }

    #[test]
    fn results_follow_selection_order() {
        let requests = looping_trace();
        let order = [PolicyKind::Opt, PolicyKind::Fifo, PolicyKind::Arc];
        let runs = Comparison::new(8).policies(order).run(&requests).unwrap();
        let got: Vec<_> = runs.iter().map(|r| r.policy).collect();
        assert_eq!(got, order);
        for run in &runs {
            assert_eq!(run.outcomes.len(), requests.len());
            assert_eq!(run.summary.requests, requests.len() as u64);
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let requests = looping_trace();
        let sequential = Comparison::new(6).run(&requests).unwrap();
        let parallel = Comparison::new(6).parallel(true).run(&requests).unwrap();

        assert_eq!(sequential.len(), PolicyKind::ALL.len());
        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.policy, b.policy);
            assert_eq!(a.summary.hits, b.summary.hits);
            assert_eq!(a.snapshot, b.snapshot);
        }
    }

    #[test]
    fn opt_bounds_every_policy() {
        let requests = looping_trace();
        let runs = Comparison::new(5).run(&requests).unwrap();
        let opt = runs
            .iter()
            .find(|r| r.policy == PolicyKind::Opt)
            .unwrap()
            .summary
            .hits;
        for run in &runs {
            assert!(run.summary.hits <= opt, "{} beat OPT", run.policy);
        }
    }

    #[test]
    fn config_error_surfaces() {
        let err = Comparison::new(0).run(&[1u32, 2]).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Config(ConfigError::InvalidCapacity { capacity: 0, .. })
        ));
    }

    #[test]
    fn single_slot_runs_every_policy() {
        let runs = Comparison::new(1).run(&[1u32, 2, 1, 1]).unwrap();
        assert_eq!(runs.len(), PolicyKind::ALL.len());
        for run in &runs {
            assert!(run.summary.hits <= 2, "{}", run.policy);
        }
        let two_q = runs.iter().find(|r| r.policy == PolicyKind::TwoQ).unwrap();
        // 1 comes back through A1out, then hits in Am.
        assert_eq!(two_q.summary.hits, 1);

        let tuning = tune_two_q(1, &[1u32, 2, 1, 1], TUNING_MAX_A1IN).unwrap();
        assert_eq!(tuning.a1in_slots, 1);
    }

    #[test]
    fn tuning_picks_best_and_respects_bounds() {
        let requests = looping_trace();
        let tuning = tune_two_q(8, &requests, TUNING_MAX_A1IN).unwrap();
        assert!((1..=7).contains(&tuning.a1in_slots));
        assert_eq!(tuning.a1out_slots, TUNING_A1OUT_SLOTS);

        for a1in in 1..=7 {
            let runs = Comparison::new(8)
                .policies([PolicyKind::TwoQ])
                .two_q_slots(a1in, TUNING_A1OUT_SLOTS)
                .run(&requests)
                .unwrap();
            assert!(runs[0].summary.hit_rate <= tuning.hit_rate);
        }
    }

    #[test]
    fn recipe_run_uses_tuned_two_q() {
        let recipe = crate::workload::suite::find("WL05").unwrap();
        let suite = Comparison::new(32)
            .policies([PolicyKind::Fifo, PolicyKind::TwoQ, PolicyKind::Opt])
            .run_recipe(recipe)
            .unwrap();

        assert_eq!(suite.recipe.key, "WL05_FIFO_CONVOY");
        assert_eq!(suite.runs.len(), 3);
        let two_q = &suite.runs[1];
        assert_eq!(two_q.summary.hit_rate, suite.tuning.hit_rate);
        assert_eq!(
            two_q.snapshot,
            Comparison::new(32)
                .policies([PolicyKind::TwoQ])
                .two_q_slots(suite.tuning.a1in_slots, TUNING_A1OUT_SLOTS)
                .run(&recipe.build())
                .unwrap()[0]
                .snapshot
        );
        let best = suite.best_online().unwrap();
        assert_ne!(best.policy, PolicyKind::Opt);
        assert!(best.summary.hit_rate <= suite.runs[2].summary.hit_rate);
    }

    #[test]
    fn tuning_ties_keep_smallest_a1in() {
        // Never repeats: every size scores zero.
        let requests: Vec<u32> = (0..50).collect();
        let tuning = tune_two_q(4, &requests, 3).unwrap();
        assert_eq!(tuning.a1in_slots, 1);
        assert_eq!(tuning.hit_rate, 0.0);
    }
}
