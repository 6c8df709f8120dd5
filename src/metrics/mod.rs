pub mod report;
pub mod snapshot;
pub mod summary;

pub use report::{Report, ReportConfig, ReportFormat, SuiteSummary};
pub use snapshot::PolicySnapshot;
pub use summary::{CostModel, LatencyStats, RunSummary};
