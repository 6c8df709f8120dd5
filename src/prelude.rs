pub use crate::builder::{Cache, CacheBuilder, PolicyKind};
pub use crate::compare::{Comparison, PolicyRun, SuiteRun, TwoQTuning, tune_two_q};
pub use crate::error::{AccessError, ConfigError, InvariantError, SimulationError};
pub use crate::metrics::report::{Report, ReportConfig, ReportFormat, SuiteSummary};
pub use crate::metrics::snapshot::PolicySnapshot;
pub use crate::metrics::summary::{CostModel, LatencyStats, RunSummary};
pub use crate::policy::arc::ArcCache;
pub use crate::policy::fifo::FifoCache;
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::opt::OptCache;
pub use crate::policy::two_q::{TwoQCache, TwoQConfig};
pub use crate::simulator::{AccessOutcome, Simulator};
pub use crate::traits::{Access, CacheKey, CoreCache};
pub use crate::workload::suite::{Recipe, SUITE_CAPACITY, SUITE_REQUESTS};
pub use crate::workload::{Workload, WorkloadError, WorkloadKind};
