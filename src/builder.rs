//! Unified cache builder for all replacement policies.
//!
//! [`Cache`] is a tagged choice over the six policies. It implements
//! [`CoreCache`] by dispatching to the selected variant, so the simulator can
//! drive any of them without boxing.
//!
//! ## Example
//!
//! ```rust
//! use cachesim::builder::{CacheBuilder, PolicyKind};
//! use cachesim::traits::{Access, CoreCache};
//!
//! let mut cache = CacheBuilder::new(100).try_build::<u64>(PolicyKind::Arc).unwrap();
//! assert_eq!(cache.access(&1), Access::Miss);
//! assert_eq!(cache.access(&1), Access::Hit);
//! assert_eq!(cache.kind(), PolicyKind::Arc);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, ConfigError, InvariantError};
use crate::metrics::snapshot::PolicySnapshot;
use crate::policy::arc::ArcCache;
use crate::policy::fifo::FifoCache;
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::policy::opt::OptCache;
use crate::policy::two_q::{TwoQCache, TwoQConfig};
use crate::traits::{Access, CacheKey, CoreCache};

/// Available replacement policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// First In, First Out.
    Fifo,
    /// Least Recently Used.
    Lru,
    /// Least Frequently Used, oldest-touch tie-break.
    Lfu,
    /// 2Q with A1in/A1out/Am queues, partitioned by [`TwoQConfig`].
    #[serde(alias = "2q")]
    TwoQ,
    /// Adaptive Replacement Cache.
    Arc,
    /// Belady's clairvoyant optimum; needs the request sequence up front.
    Opt,
}

impl PolicyKind {
    /// Every policy, in report order.
    pub const ALL: [PolicyKind; 6] = [
        PolicyKind::Arc,
        PolicyKind::Lru,
        PolicyKind::Lfu,
        PolicyKind::Fifo,
        PolicyKind::TwoQ,
        PolicyKind::Opt,
    ];

    /// Display name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Fifo => "FIFO",
            PolicyKind::Lru => "LRU",
            PolicyKind::Lfu => "LFU",
            PolicyKind::TwoQ => "2Q",
            PolicyKind::Arc => "ARC",
            PolicyKind::Opt => "OPT",
        }
    }

    /// Returns `true` for policies that only run against a known sequence.
    pub fn is_offline(self) -> bool {
        matches!(self, PolicyKind::Opt)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a policy name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown policy `{0}` (expected one of fifo, lru, lfu, 2q, arc, opt)")]
pub struct UnknownPolicy(pub String);

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(PolicyKind::Fifo),
            "lru" => Ok(PolicyKind::Lru),
            "lfu" => Ok(PolicyKind::Lfu),
            "2q" | "twoq" | "two_q" => Ok(PolicyKind::TwoQ),
            "arc" => Ok(PolicyKind::Arc),
            "opt" | "belady" => Ok(PolicyKind::Opt),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// Unified cache wrapper over the six policies.
#[derive(Debug)]
pub struct Cache<K> {
    inner: CacheInner<K>,
}

#[derive(Debug)]
enum CacheInner<K> {
    Fifo(FifoCache<K>),
    Lru(LruCache<K>),
    Lfu(LfuCache<K>),
    TwoQ(TwoQCache<K>),
    Arc(ArcCache<K>),
    Opt(OptCache<K>),
}

macro_rules! dispatch {
    ($self:expr, $cache:ident => $body:expr) => {
        match $self {
            CacheInner::Fifo($cache) => $body,
            CacheInner::Lru($cache) => $body,
            CacheInner::Lfu($cache) => $body,
            CacheInner::TwoQ($cache) => $body,
            CacheInner::Arc($cache) => $body,
            CacheInner::Opt($cache) => $body,
        }
    };
}

impl<K: CacheKey> Cache<K> {
    /// The policy this cache runs.
    pub fn kind(&self) -> PolicyKind {
        match &self.inner {
            CacheInner::Fifo(_) => PolicyKind::Fifo,
            CacheInner::Lru(_) => PolicyKind::Lru,
            CacheInner::Lfu(_) => PolicyKind::Lfu,
            CacheInner::TwoQ(_) => PolicyKind::TwoQ,
            CacheInner::Arc(_) => PolicyKind::Arc,
            CacheInner::Opt(_) => PolicyKind::Opt,
        }
    }
}

impl<K: CacheKey> CoreCache<K> for Cache<K> {
    #[inline]
    fn access(&mut self, key: &K) -> Access {
        dispatch!(&mut self.inner, c => c.access(key))
    }

    fn contains(&self, key: &K) -> bool {
        dispatch!(&self.inner, c => c.contains(key))
    }

    fn len(&self) -> usize {
        dispatch!(&self.inner, c => c.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(&self.inner, c => c.capacity())
    }

    #[inline]
    fn validate(&self, key: &K) -> Result<(), AccessError> {
        dispatch!(&self.inner, c => c.validate(key))
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        dispatch!(&self.inner, c => c.check_invariants())
    }

    fn snapshot(&self) -> PolicySnapshot {
        dispatch!(&self.inner, c => c.snapshot())
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: usize,
    two_q: TwoQConfig,
    two_q_slots: Option<(usize, usize)>,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            two_q: TwoQConfig::default(),
            two_q_slots: None,
        }
    }

    /// Overrides the 2Q partition (default 25% A1in, ghosts for 50%).
    pub fn two_q(mut self, config: TwoQConfig) -> Self {
        self.two_q = config;
        self.two_q_slots = None;
        self
    }

    /// Pins the 2Q queues to explicit sizes, overriding the fractions.
    pub fn two_q_slots(mut self, a1in_slots: usize, a1out_slots: usize) -> Self {
        self.two_q_slots = Some((a1in_slots, a1out_slots));
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Builds an online policy.
    ///
    /// `PolicyKind::Opt` needs the request sequence and fails here with
    /// [`ConfigError::MissingSequence`]; use [`try_build_opt`](Self::try_build_opt).
    ///
    /// ```rust
    /// use cachesim::builder::{CacheBuilder, PolicyKind};
    /// use cachesim::policy::two_q::TwoQConfig;
    ///
    /// let lru = CacheBuilder::new(64).try_build::<u32>(PolicyKind::Lru);
    /// assert!(lru.is_ok());
    ///
    /// let two_q = CacheBuilder::new(64)
    ///     .two_q(TwoQConfig { a1in_fraction: 0.5, a1out_fraction: 0.25 })
    ///     .try_build::<u32>(PolicyKind::TwoQ);
    /// assert!(two_q.is_ok());
    ///
    /// assert!(CacheBuilder::new(64).try_build::<u32>(PolicyKind::Opt).is_err());
    /// ```
    pub fn try_build<K: CacheKey>(&self, kind: PolicyKind) -> Result<Cache<K>, ConfigError> {
        let inner = match kind {
            PolicyKind::Fifo => CacheInner::Fifo(FifoCache::try_new(self.capacity)?),
            PolicyKind::Lru => CacheInner::Lru(LruCache::try_new(self.capacity)?),
            PolicyKind::Lfu => CacheInner::Lfu(LfuCache::try_new(self.capacity)?),
            PolicyKind::TwoQ => CacheInner::TwoQ(match self.two_q_slots {
                Some((a1in, a1out)) => TwoQCache::with_partition(self.capacity, a1in, a1out)?,
                None => TwoQCache::try_new(self.capacity, self.two_q)?,
            }),
            PolicyKind::Arc => CacheInner::Arc(ArcCache::try_new(self.capacity)?),
            PolicyKind::Opt => return Err(ConfigError::MissingSequence),
        };
        Ok(Cache { inner })
    }

    /// Builds OPT primed with the full request sequence.
    pub fn try_build_opt<K: CacheKey>(&self, requests: &[K]) -> Result<Cache<K>, ConfigError> {
        Ok(Cache {
            inner: CacheInner::Opt(OptCache::try_new(self.capacity, requests)?),
        })
    }

    /// Builds any policy for a run over `requests`.
    pub fn try_build_for<K: CacheKey>(
        &self,
        kind: PolicyKind,
        requests: &[K],
    ) -> Result<Cache<K>, ConfigError> {
        match kind {
            PolicyKind::Opt => self.try_build_opt(requests),
            online => self.try_build(online),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_policies_build_and_enforce_capacity() {
        let requests: Vec<u32> = (0..50).map(|i| i % 7).collect();
        for kind in PolicyKind::ALL {
            let mut cache = CacheBuilder::new(3)
                .try_build_for(kind, &requests)
                .unwrap();
            assert_eq!(cache.kind(), kind);
            assert_eq!(cache.capacity(), 3);
            for key in &requests {
                cache.access(key);
                assert!(cache.len() <= 3, "{kind} overflowed");
            }
            assert!(cache.check_invariants().is_ok(), "{kind}");
        }
    }

    #[test]
    fn zero_capacity_is_config_error() {
        for kind in PolicyKind::ALL {
            let err = CacheBuilder::new(0)
                .try_build_for::<u32>(kind, &[1, 2])
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidCapacity { capacity: 0, .. }),
                "{kind}: {err}"
            );
        }
    }

    #[test]
    fn opt_requires_sequence() {
        assert_eq!(
            CacheBuilder::new(4).try_build::<u32>(PolicyKind::Opt).unwrap_err(),
            ConfigError::MissingSequence
        );
    }

    #[test]
    fn two_q_slots_override_fractions() {
        let mut cache = CacheBuilder::new(32)
            .two_q_slots(5, 32)
            .try_build::<u32>(PolicyKind::TwoQ)
            .unwrap();
        for key in 0..6 {
            cache.access(&key);
        }
        // Fractions alone would give A1in 8 slots and keep all six.
        assert_eq!(
            cache.snapshot(),
            PolicySnapshot::TwoQ {
                a1in: 5,
                a1out: 1,
                am: 0
            }
        );
        assert!(matches!(
            CacheBuilder::new(4)
                .two_q_slots(4, 1)
                .try_build::<u32>(PolicyKind::TwoQ),
            Err(ConfigError::InvalidSlots { name: "a1in_slots", .. })
        ));
    }

    #[test]
    fn policy_names_parse() {
        assert_eq!("ARC".parse::<PolicyKind>(), Ok(PolicyKind::Arc));
        assert_eq!(" 2q ".parse::<PolicyKind>(), Ok(PolicyKind::TwoQ));
        assert_eq!("two_q".parse::<PolicyKind>(), Ok(PolicyKind::TwoQ));
        assert!("mru".parse::<PolicyKind>().is_err());
        for kind in PolicyKind::ALL {
            assert_eq!(kind.name().parse::<PolicyKind>(), Ok(kind));
        }
    }

    #[test]
    fn policy_kind_serde_names() {
        let kinds: Vec<PolicyKind> = serde_json::from_str(r#"["lru", "2q", "two_q", "opt"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![PolicyKind::Lru, PolicyKind::TwoQ, PolicyKind::TwoQ, PolicyKind::Opt]
        );
        assert!(PolicyKind::Opt.is_offline());
        assert!(!PolicyKind::Arc.is_offline());
    }

    #[test]
    fn wrapper_validates_through_policy() {
        let mut cache = CacheBuilder::new(2).try_build_opt(&["a", "b"]).unwrap();
        assert_eq!(
            cache.try_access(&"b"),
            Err(AccessError::UnforeseenKey { position: 0 })
        );
        assert_eq!(cache.try_access(&"a"), Ok(Access::Miss));

        let mut lru = CacheBuilder::new(2).try_build::<&str>(PolicyKind::Lru).unwrap();
        assert_eq!(lru.try_access(&""), Err(AccessError::MalformedKey));
        assert!(lru.is_empty());
    }
}
