//! Synthetic request sequences.
//!
//! Every generator is deterministic for a given seed, so the same workload
//! can be replayed against each policy and across runs.
//!
//! | Kind          | Shape                                                        |
//! |---------------|--------------------------------------------------------------|
//! | `Static`      | hot set hit with probability `hot_ratio`, else a cyclic scan |
//! | `Dynamic`     | phases of random hot accesses, each closed by a fresh scan   |
//! | `Oscillating` | alternating hot bursts and fresh scans                       |
//! | `Zipfian`     | skewed popularity over `universe` keys                       |
//!
//! Hot pages are numbered from 0; scan pages follow them, so the two never
//! overlap. Fresh scans in `Dynamic` and `Oscillating` never revisit a page.
//!
//! [`suite`] holds the fixed, seedless benchmark recipes WL01 to WL09.
//!
//! ## Example
//!
//! ```
//! use cachesim::workload::Workload;
//!
//! let workload = Workload::Oscillating {
//!     cycles: 2,
//!     hot_burst: 10,
//!     scan_burst: 5,
//!     hot_set_size: 4,
//! };
//! let trace = workload.generate(42).unwrap();
//! assert_eq!(trace.len(), 30);
//! assert!(trace[..10].iter().all(|&page| page < 4));
//! assert_eq!(&trace[10..15], &[4, 5, 6, 7, 8]);
//! ```

pub mod suite;

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned for unusable workload parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkloadError {
    #[error("{name} must be in [0, 1], got {value}")]
    InvalidRatio { name: &'static str, value: f64 },

    #[error("{name} must be at least {minimum}, got {value}")]
    TooSmall {
        name: &'static str,
        value: usize,
        minimum: usize,
    },

    #[error("theta must be finite and non-negative, got {0}")]
    InvalidTheta(f64),

    #[error("unknown workload `{0}` (expected static, dynamic, oscillating or zipfian)")]
    UnknownKind(String),

    #[error("unknown suite workload `{0}` (expected WL01 to WL09, a full key or 1 to 9)")]
    UnknownRecipe(String),
}

/// Workload family, without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    Static,
    Dynamic,
    Oscillating,
    Zipfian,
}

impl FromStr for WorkloadKind {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(WorkloadKind::Static),
            "dynamic" => Ok(WorkloadKind::Dynamic),
            "oscillating" => Ok(WorkloadKind::Oscillating),
            "zipf" | "zipfian" => Ok(WorkloadKind::Zipfian),
            _ => Err(WorkloadError::UnknownKind(s.to_string())),
        }
    }
}

/// A parameterized workload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Workload {
    Static {
        total_requests: usize,
        total_pages: usize,
        hot_ratio: f64,
        scan_ratio: f64,
    },
    Dynamic {
        total_requests: usize,
        hot_set_size: usize,
        scan_length: usize,
        phases: usize,
    },
    Oscillating {
        cycles: usize,
        hot_burst: usize,
        scan_burst: usize,
        hot_set_size: usize,
    },
    Zipfian {
        total_requests: usize,
        universe: usize,
        /// Skew: 0 is uniform, values near 1 are heavily skewed.
        theta: f64,
    },
}

impl Workload {
    /// Stock parameters for `kind`.
    pub fn default_for(kind: WorkloadKind) -> Self {
        match kind {
            WorkloadKind::Static => Workload::Static {
                total_requests: 10_000,
                total_pages: 1_000,
                hot_ratio: 0.8,
                scan_ratio: 0.2,
            },
            WorkloadKind::Dynamic => Workload::Dynamic {
                total_requests: 20_000,
                hot_set_size: 100,
                scan_length: 500,
                phases: 4,
            },
            WorkloadKind::Oscillating => Workload::Oscillating {
                cycles: 5,
                hot_burst: 2_000,
                scan_burst: 2_000,
                hot_set_size: 100,
            },
            WorkloadKind::Zipfian => Workload::Zipfian {
                total_requests: 10_000,
                universe: 1_000,
                theta: 0.99,
            },
        }
    }

    pub fn kind(&self) -> WorkloadKind {
        match self {
            Workload::Static { .. } => WorkloadKind::Static,
            Workload::Dynamic { .. } => WorkloadKind::Dynamic,
            Workload::Oscillating { .. } => WorkloadKind::Oscillating,
            Workload::Zipfian { .. } => WorkloadKind::Zipfian,
        }
    }

    /// Number of requests [`generate`](Self::generate) produces.
    pub fn len(&self) -> usize {
        match *self {
            Workload::Static { total_requests, .. }
            | Workload::Dynamic { total_requests, .. }
            | Workload::Zipfian { total_requests, .. } => total_requests,
            Workload::Oscillating {
                cycles,
                hot_burst,
                scan_burst,
                ..
            } => cycles.saturating_mul(hot_burst.saturating_add(scan_burst)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<(), WorkloadError> {
        match *self {
            Workload::Static {
                total_pages,
                hot_ratio,
                scan_ratio,
                ..
            } => {
                at_least("total_pages", total_pages, 2)?;
                ratio("hot_ratio", hot_ratio)?;
                ratio("scan_ratio", scan_ratio)
            }
            Workload::Dynamic {
                hot_set_size,
                scan_length,
                phases,
                ..
            } => {
                at_least("hot_set_size", hot_set_size, 1)?;
                at_least("scan_length", scan_length, 1)?;
                at_least("phases", phases, 1)
            }
            Workload::Oscillating {
                cycles,
                hot_burst,
                scan_burst,
                hot_set_size,
            } => {
                at_least("cycles", cycles, 1)?;
                at_least("hot_burst", hot_burst, 1)?;
                at_least("scan_burst", scan_burst, 1)?;
                at_least("hot_set_size", hot_set_size, 1)
            }
            Workload::Zipfian {
                universe, theta, ..
            } => {
                at_least("universe", universe, 1)?;
                if theta.is_finite() && theta >= 0.0 {
                    Ok(())
                } else {
                    Err(WorkloadError::InvalidTheta(theta))
                }
            }
        }
    }

    /// Generates the request sequence for `seed`.
    pub fn generate(&self, seed: u64) -> Result<Vec<u64>, WorkloadError> {
        self.validate()?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let trace = match *self {
            Workload::Static {
                total_requests,
                total_pages,
                hot_ratio,
                scan_ratio,
            } => {
                let hot_set = scaled(total_pages, hot_ratio);
                let scan_set = scaled(total_pages, scan_ratio);
                let mut cursor = 0u64;
                (0..total_requests)
                    .map(|_| {
                        if rng.random::<f64>() < hot_ratio {
                            rng.random_range(0..hot_set)
                        } else {
                            let page = hot_set + cursor % scan_set;
                            cursor += 1;
                            page
                        }
                    })
                    .collect()
            }
            Workload::Dynamic {
                total_requests,
                hot_set_size,
                scan_length,
                phases,
            } => {
                let hot_set = hot_set_size as u64;
                let hot_accesses = (total_requests / phases).saturating_sub(scan_length);
                let mut trace = Vec::with_capacity(total_requests);
                let mut fresh = hot_set;
                for _ in 0..phases {
                    if trace.len() >= total_requests {
                        break;
                    }
                    trace.extend((0..hot_accesses).map(|_| rng.random_range(0..hot_set)));
                    // Anything past `total_requests` is cut below, so a long
                    // scan is only materialized up to that point.
                    let scan = scan_length.min(total_requests.saturating_sub(trace.len()));
                    trace.extend(fresh..fresh + scan as u64);
                    fresh = fresh.saturating_add(scan_length as u64);
                }
                while trace.len() < total_requests {
                    trace.push(rng.random_range(0..hot_set));
                }
                trace.truncate(total_requests);
                trace
            }
            Workload::Oscillating {
                cycles,
                hot_burst,
                scan_burst,
                hot_set_size,
            } => {
                let hot_set = hot_set_size as u64;
                let mut trace = Vec::with_capacity(self.len());
                let mut fresh = hot_set;
                for _ in 0..cycles {
                    trace.extend((0..hot_burst).map(|_| rng.random_range(0..hot_set)));
                    trace.extend(fresh..fresh + scan_burst as u64);
                    fresh += scan_burst as u64;
                }
                trace
            }
            Workload::Zipfian {
                total_requests,
                universe,
                theta,
            } => {
                let zipf = Zipfian::new(universe as u64, theta);
                (0..total_requests)
                    .map(|_| zipf.sample(rng.random::<f64>()))
                    .collect()
            }
        };
        Ok(trace)
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Workload::Static {
                total_pages,
                hot_ratio,
                scan_ratio,
                ..
            } => write!(
                f,
                "static (pages={total_pages}, hot_ratio={hot_ratio}, scan_ratio={scan_ratio})"
            ),
            Workload::Dynamic {
                hot_set_size,
                scan_length,
                phases,
                ..
            } => write!(
                f,
                "dynamic (hot_set={hot_set_size}, scan_length={scan_length}, phases={phases})"
            ),
            Workload::Oscillating {
                cycles,
                hot_burst,
                scan_burst,
                hot_set_size,
            } => write!(
                f,
                "oscillating (cycles={cycles}, hot_burst={hot_burst}, scan_burst={scan_burst}, hot_set={hot_set_size})"
            ),
            Workload::Zipfian {
                universe, theta, ..
            } => write!(f, "zipfian (universe={universe}, theta={theta})"),
        }
    }
}

fn at_least(name: &'static str, value: usize, minimum: usize) -> Result<(), WorkloadError> {
    if value >= minimum {
        Ok(())
    } else {
        Err(WorkloadError::TooSmall {
            name,
            value,
            minimum,
        })
    }
}

fn ratio(name: &'static str, value: f64) -> Result<(), WorkloadError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(WorkloadError::InvalidRatio { name, value })
    }
}

/// `max(1, floor(total * ratio))`.
fn scaled(total: usize, ratio: f64) -> u64 {
    ((total as f64 * ratio) as u64).max(1)
}

/// Zipfian sampler by inverse CDF (YCSB construction).
#[derive(Debug, Clone)]
struct Zipfian {
    n: u64,
    theta: f64,
    zeta_n: f64,
    alpha: f64,
    eta: f64,
}

impl Zipfian {
    fn new(n: u64, theta: f64) -> Self {
        // theta == 1 divides by zero in alpha.
        let theta = theta.clamp(0.0, 0.9999);
        let zeta_2 = zeta(2, theta);
        let zeta_n = zeta(n, theta);
        Self {
            n,
            theta,
            zeta_n,
            alpha: 1.0 / (1.0 - theta),
            eta: (1.0 - (2.0 / n as f64).powf(1.0 - theta)) / (1.0 - zeta_2 / zeta_n),
        }
    }

    /// Maps a uniform `u` in `[0, 1)` to a rank in `0..n`.
    fn sample(&self, u: f64) -> u64 {
        let uz = u * self.zeta_n;
        if uz < 1.0 || self.n == 1 {
            return 0;
        }
        if uz < 1.0 + 0.5_f64.powf(self.theta) {
            return 1;
        }
        let spread = self.n as f64 * (self.eta * u - self.eta + 1.0).powf(self.alpha);
        (spread as u64).min(self.n - 1)
    }
}

fn zeta(n: u64, theta: f64) -> f64 {
    (1..=n).map(|i| 1.0 / (i as f64).powf(theta)).sum()
}

/// Renders a sequence as a `.trace` file: one page number per line.
pub fn format_trace(trace: &[u64]) -> String {
    let mut out = String::with_capacity(trace.len() * 6);
    for page in trace {
        out.push_str(&page.to_string());
        out.push('\n');
    }
    out
}
