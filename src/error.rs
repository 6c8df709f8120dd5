//! Error types for the simulator.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: invalid construction parameters (capacity, 2Q fractions).
//!   Only ever returned by constructors, never mid-run.
//! - [`AccessError`]: a single request the policy refuses to process.
//! - [`InvariantError`]: an internal policy defect, produced by
//!   `check_invariants` and by the simulator's per-access capacity check.
//! - [`SimulationError`]: a failed run, carrying the index of the request
//!   that stopped it.
//!
//! ## Example Usage
//!
//! ```
//! use cachesim::builder::{CacheBuilder, PolicyKind};
//! use cachesim::error::ConfigError;
//!
//! let err = CacheBuilder::new(0).try_build::<u64>(PolicyKind::Lru).unwrap_err();
//! assert!(matches!(err, ConfigError::InvalidCapacity { capacity: 0, .. }));
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("capacity must be at least {minimum}, got {capacity}")]
    InvalidCapacity { capacity: usize, minimum: usize },

    /// A partition fraction outside the open interval (0, 1), or non-finite.
    #[error("{name} must be in (0, 1), got {value}")]
    InvalidFraction { name: &'static str, value: f64 },

    /// An explicit queue size outside `1..=max`.
    #[error("{name} must be in 1..={max}, got {value}")]
    InvalidSlots {
        name: &'static str,
        value: usize,
        max: usize,
    },

    /// `Opt` needs the request sequence up front; see `CacheBuilder::try_build_opt`.
    #[error("OPT requires the full request sequence at construction")]
    MissingSequence,
}

// ---------------------------------------------------------------------------
// AccessError
// ---------------------------------------------------------------------------

/// Error returned when a policy cannot process a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("malformed key")]
    MalformedKey,

    /// OPT was handed a key that is not the next request of its primed sequence.
    #[error("key does not match request {position} of the primed sequence")]
    UnforeseenKey { position: usize },
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// SimulationError
// ---------------------------------------------------------------------------

/// Error returned when a simulation run aborts.
///
/// No partial outcomes accompany a failed run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("request {index} rejected: {source}")]
    Access {
        index: usize,
        #[source]
        source: AccessError,
    },

    #[error("policy invariant violated after request {index}: {source}")]
    InvariantViolation {
        index: usize,
        #[source]
        source: InvariantError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SimulationError {
    /// Index of the failing request, if the run got that far.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Access { index, .. } | Self::InvariantViolation { index, .. } => Some(*index),
            Self::Config(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
