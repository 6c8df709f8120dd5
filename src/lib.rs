//! cachesim: a cache replacement policy simulator.
//!
//! Six policies (FIFO, LRU, LFU, 2Q, ARC and Belady's OPT) share one
//! [`CoreCache`](traits::CoreCache) contract. The [`simulator`] replays a
//! request sequence through any of them, the [`compare`] driver runs several
//! side by side, and [`metrics`] turns the outcomes into hit rates, timing
//! and a printable report. Synthetic request sequences come from
//! [`workload`].
//!
//! ```
//! use cachesim::prelude::*;
//!
//! let requests = Workload::default_for(WorkloadKind::Static).generate(7).unwrap();
//! let runs = Comparison::new(32).run(&requests).unwrap();
//! let report = Report::new(ReportConfig::new(32, "static", requests.len()), &runs);
//! assert!(report.to_text().contains("[Algorithm: ARC]"));
//! ```

pub mod builder;
pub mod compare;
pub mod ds;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod simulator;
pub mod traits;
pub mod workload;

pub use crate::builder::{Cache, CacheBuilder, PolicyKind};
pub use crate::compare::{Comparison, PolicyRun, SuiteRun, TwoQTuning, tune_two_q};
pub use crate::error::{AccessError, ConfigError, InvariantError, SimulationError};
pub use crate::policy::{ArcCache, FifoCache, LfuCache, LruCache, OptCache, TwoQCache, TwoQConfig};
pub use crate::simulator::{AccessOutcome, Simulator};
pub use crate::traits::{Access, CacheKey, CoreCache};
