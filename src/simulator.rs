//! Replays a request sequence through one policy.
//!
//! The simulator feeds every request to the cache strictly in order, times
//! each `access` call with a monotonic clock, and returns one
//! [`AccessOutcome`] per request. Validation happens before the clock starts,
//! so the measured cost is the policy's bookkeeping alone.
//!
//! A run either completes the whole sequence or fails with the index of the
//! request that stopped it; no partial outcome list is returned.
//!
//! ## Example
//!
//! ```
//! use cachesim::builder::{CacheBuilder, PolicyKind};
//! use cachesim::simulator::Simulator;
//!
//! let requests = [1u64, 2, 1, 3, 2];
//! let mut cache = CacheBuilder::new(2).try_build::<u64>(PolicyKind::Fifo).unwrap();
//! let outcomes = Simulator::new(&requests).run(&mut cache).unwrap();
//!
//! let hits: Vec<bool> = outcomes.iter().map(|o| o.access.is_hit()).collect();
//! assert_eq!(hits, [false, false, true, false, true]);
//! ```

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{InvariantError, SimulationError};
use crate::traits::{Access, CacheKey, CoreCache};

/// Result of replaying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessOutcome {
    /// Position of the request in the input sequence.
    pub index: usize,
    pub access: Access,
    /// Wall time spent inside `access`.
    pub elapsed: Duration,
}

/// Drives a cache through a borrowed, read-only request sequence.
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'a, K> {
    requests: &'a [K],
    deep_checks: bool,
}

impl<'a, K: CacheKey> Simulator<'a, K> {
    pub fn new(requests: &'a [K]) -> Self {
        Self {
            requests,
            deep_checks: false,
        }
    }

    /// Runs the policy's full `check_invariants` after every access.
    ///
    /// The capacity bound is always checked; this adds the structural walk,
    /// which is O(n) per request.
    pub fn deep_checks(mut self, enabled: bool) -> Self {
        self.deep_checks = enabled;
        self
    }

    pub fn requests(&self) -> &'a [K] {
        self.requests
    }

    /// Replays every request through `cache`.
    pub fn run<C>(&self, cache: &mut C) -> Result<Vec<AccessOutcome>, SimulationError>
    where
        C: CoreCache<K> + ?Sized,
    {
        debug!(
            capacity = cache.capacity(),
            requests = self.requests.len(),
            "simulation started"
        );

        let mut outcomes = Vec::with_capacity(self.requests.len());
        let mut hits = 0usize;
        let mut busy = Duration::ZERO;

        for (index, key) in self.requests.iter().enumerate() {
            if let Err(source) = cache.validate(key) {
                warn!(index, error = %source, "simulation aborted: request rejected");
                return Err(SimulationError::Access { index, source });
            }

            let start = Instant::now();
            let access = cache.access(key);
            let elapsed = start.elapsed();

            if let Err(source) = self.verify(cache) {
                warn!(index, error = %source, "simulation aborted: policy invariant violated");
                return Err(SimulationError::InvariantViolation { index, source });
            }

            hits += usize::from(access.is_hit());
            busy += elapsed;
            outcomes.push(AccessOutcome {
                index,
                access,
                elapsed,
            });
        }

        debug!(
            requests = outcomes.len(),
            hits,
            elapsed_ns = busy.as_nanos() as u64,
            snapshot = %cache.snapshot(),
            "simulation finished"
        );
        Ok(outcomes)
    }

    fn verify<C>(&self, cache: &C) -> Result<(), InvariantError>
    where
        C: CoreCache<K> + ?Sized,
    {
        if cache.len() > cache.capacity() {
            return Err(InvariantError::new(format!(
                "{} resident keys exceed capacity {}",
                cache.len(),
                cache.capacity()
            )));
        }
        if self.deep_checks {
            cache.check_invariants()?;
        }
        Ok(())
    }
}

/// Replays `requests` through `cache`. Shorthand for [`Simulator::run`].
pub fn run<K, C>(cache: &mut C, requests: &[K]) -> Result<Vec<AccessOutcome>, SimulationError>
where
    K: CacheKey,
    C: CoreCache<K> + ?Sized,
{
    Simulator::new(requests).run(cache)
}
