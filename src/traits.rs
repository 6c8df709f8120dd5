//! # Cache Contract
//!
//! Every replacement policy in this crate implements [`CoreCache`]. The
//! simulator and the comparison driver only ever see this trait, so the six
//! policies are interchangeable behind it.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────────────┐
//!                 │              CoreCache<K>                │
//!                 │                                          │
//!                 │  access(&mut, &K) → Access               │
//!                 │  try_access(&mut, &K) → Result<Access>   │
//!                 │  validate(&, &K) → Result<()>            │
//!                 │  contains(&, &K) → bool                  │
//!                 │  len(&) → usize          (≤ capacity)    │
//!                 │  capacity(&) → usize                     │
//!                 │  check_invariants(&) → Result<()>        │
//!                 │  snapshot(&) → PolicySnapshot            │
//!                 └────────────────────┬─────────────────────┘
//!                                      │
//!        ┌──────────┬──────────┬───────┴──┬──────────┬──────────┐
//!        ▼          ▼          ▼          ▼          ▼          ▼
//!    FifoCache  LruCache   LfuCache  TwoQCache  ArcCache   OptCache
//! ```
//!
//! A key is only tracked, never paired with a value: the simulator measures
//! residency, not payloads.
//!
//! ## Example
//!
//! ```
//! use cachesim::policy::lru::LruCache;
//! use cachesim::traits::{Access, CoreCache};
//!
//! fn count_hits<C: CoreCache<u64>>(cache: &mut C, requests: &[u64]) -> usize {
//!     requests.iter().filter(|k| cache.access(k).is_hit()).count()
//! }
//!
//! let mut cache = LruCache::new(2);
//! assert_eq!(count_hits(&mut cache, &[1, 2, 1, 3, 1]), 2);
//! assert_eq!(cache.access(&9), Access::Miss);
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, InvariantError};
use crate::metrics::snapshot::PolicySnapshot;

/// Identifier of a requested resource.
///
/// Keys are opaque: policies only hash, compare and clone them.
/// `is_well_formed` lets a key type reject values the simulator must refuse
/// (for strings, the empty string).
pub trait CacheKey: Clone + Eq + Hash + Debug {
    fn is_well_formed(&self) -> bool {
        true
    }
}

macro_rules! impl_cache_key {
    ($($ty:ty),* $(,)?) => {
        $(impl CacheKey for $ty {})*
    };
}

impl_cache_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, char);

impl CacheKey for String {
    fn is_well_formed(&self) -> bool {
        !self.is_empty()
    }
}

impl CacheKey for &str {
    fn is_well_formed(&self) -> bool {
        !self.is_empty()
    }
}

/// Result of a single access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Hit,
    Miss,
}

impl Access {
    #[inline]
    pub fn from_hit(hit: bool) -> Self {
        if hit { Self::Hit } else { Self::Miss }
    }

    #[inline]
    pub fn is_hit(self) -> bool {
        matches!(self, Self::Hit)
    }

    #[inline]
    pub fn is_miss(self) -> bool {
        matches!(self, Self::Miss)
    }
}

/// Operations every replacement policy supports.
///
/// `access` is the whole state machine: on a hit the policy updates its
/// recency/frequency/queue bookkeeping; on a miss it evicts if full and
/// admits the key. After every call `len() <= capacity()`.
pub trait CoreCache<K: CacheKey> {
    /// Processes one request.
    fn access(&mut self, key: &K) -> Access;

    /// Returns `true` if `key` is resident. Does not count as an access.
    fn contains(&self, key: &K) -> bool;

    /// Number of resident keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of resident keys.
    fn capacity(&self) -> usize;

    /// Checks that `key` may be processed.
    ///
    /// The default rejects keys that are not well formed.
    fn validate(&self, key: &K) -> Result<(), AccessError> {
        if key.is_well_formed() {
            Ok(())
        } else {
            Err(AccessError::MalformedKey)
        }
    }

    /// Validates, then accesses. A rejected key leaves the policy untouched.
    fn try_access(&mut self, key: &K) -> Result<Access, AccessError> {
        self.validate(key)?;
        Ok(self.access(key))
    }

    /// Verifies internal bookkeeping. An error here is a defect in the policy.
    fn check_invariants(&self) -> Result<(), InvariantError>;

    /// Captures queue sizes and adaptive parameters for reporting.
    fn snapshot(&self) -> PolicySnapshot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_helpers() {
        assert!(Access::from_hit(true).is_hit());
        assert!(Access::from_hit(false).is_miss());
        assert!(!Access::Miss.is_hit());
    }

    #[test]
    fn string_keys_reject_empty() {
        assert!("page".is_well_formed());
        assert!(!"".is_well_formed());
        assert!(!String::new().is_well_formed());
        assert!(0u64.is_well_formed());
        assert!((-1i32).is_well_formed());
    }

    #[test]
    fn access_serializes_lowercase() {
        let json = serde_json::to_string(&Access::Hit).unwrap();
        assert_eq!(json, "\"hit\"");
    }
}
