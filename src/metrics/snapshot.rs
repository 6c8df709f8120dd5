use std::fmt;

use serde::{Deserialize, Serialize};

/// Point-in-time view of a policy's internal queues.
///
/// Captured after a run and printed next to its hit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PolicySnapshot {
    Fifo {
        resident: usize,
    },
    Lru {
        resident: usize,
    },
    Lfu {
        resident: usize,
        min_frequency: u64,
    },
    TwoQ {
        a1in: usize,
        a1out: usize,
        am: usize,
    },
    Arc {
        t1: usize,
        t2: usize,
        b1: usize,
        b2: usize,
        p: usize,
    },
    Opt {
        resident: usize,
        cursor: usize,
        horizon: usize,
    },
}

impl PolicySnapshot {
    /// Number of resident keys at snapshot time.
    pub fn resident(&self) -> usize {
        match *self {
            Self::Fifo { resident }
            | Self::Lru { resident }
            | Self::Lfu { resident, .. }
            | Self::Opt { resident, .. } => resident,
            Self::TwoQ { a1in, am, .. } => a1in + am,
            Self::Arc { t1, t2, .. } => t1 + t2,
        }
    }
}

impl fmt::Display for PolicySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Fifo { resident } | Self::Lru { resident } => {
                write!(f, "resident={resident}")
            }
            Self::Lfu {
                resident,
                min_frequency,
            } => write!(f, "resident={resident} min_freq={min_frequency}"),
            Self::TwoQ { a1in, a1out, am } => write!(f, "a1in={a1in} a1out={a1out} am={am}"),
            Self::Arc { t1, t2, b1, b2, p } => {
                write!(f, "t1={t1} t2={t2} b1={b1} b2={b2} p={p}")
            }
            Self::Opt {
                resident,
                cursor,
                horizon,
            } => write!(f, "resident={resident} cursor={cursor}/{horizon}"),
        }
    }
}
