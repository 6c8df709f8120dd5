//! TOML configuration for the `cachesim` binary.
//!
//! Every section and field is optional; command-line flags override whatever
//! the file sets.
//!
//! ```toml
//! [cache]
//! capacity = 32
//! policies = ["arc", "lru", "2q", "opt"]
//! tune_two_q = true
//!
//! [cache.two_q]
//! a1in_fraction = 0.25
//! a1out_fraction = 0.5
//!
//! [workload]
//! kind = "dynamic"
//! seed = 7
//! total_requests = 50000
//! scan_length = 800
//!
//! [report]
//! format = "json"
//!
//! [report.costs]
//! hit_cost = 1.0
//! miss_cost = 200.0
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use cachesim::builder::PolicyKind;
use cachesim::metrics::{CostModel, ReportFormat};
use cachesim::policy::TwoQConfig;
use cachesim::workload::{Workload, WorkloadKind};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cache: CacheConfig,
    pub workload: WorkloadConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub capacity: usize,
    pub policies: Vec<PolicyKind>,
    pub two_q: TwoQConfig,
    /// Search the 2Q A1in size offline before comparing.
    pub tune_two_q: bool,
    /// One thread per policy.
    pub parallel: bool,
    /// Run each policy's full invariant check after every request.
    pub deep_checks: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 32,
            policies: PolicyKind::ALL.to_vec(),
            two_q: TwoQConfig::default(),
            tune_two_q: false,
            parallel: false,
            deep_checks: false,
        }
    }
}

/// Workload selection. Unset parameters take the kind's stock values.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadConfig {
    pub kind: WorkloadKind,
    pub seed: u64,
    /// Run suite recipes (`all`, `WL03`, `1,5`) instead of generating.
    pub suite: Option<String>,
    pub total_requests: Option<usize>,
    pub total_pages: Option<usize>,
    pub hot_ratio: Option<f64>,
    pub scan_ratio: Option<f64>,
    pub hot_set_size: Option<usize>,
    pub scan_length: Option<usize>,
    pub phases: Option<usize>,
    pub cycles: Option<usize>,
    pub hot_burst: Option<usize>,
    pub scan_burst: Option<usize>,
    pub universe: Option<usize>,
    pub theta: Option<f64>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            kind: WorkloadKind::Static,
            seed: 42,
            suite: None,
            total_requests: None,
            total_pages: None,
            hot_ratio: None,
            scan_ratio: None,
            hot_set_size: None,
            scan_length: None,
            phases: None,
            cycles: None,
            hot_burst: None,
            scan_burst: None,
            universe: None,
            theta: None,
        }
    }
}

impl WorkloadConfig {
    /// Resolves the configured kind and overrides into a [`Workload`].
    pub fn build(&self) -> Workload {
        let mut workload = Workload::default_for(self.kind);
        match &mut workload {
            Workload::Static {
                total_requests,
                total_pages,
                hot_ratio,
                scan_ratio,
            } => {
                set(total_requests, self.total_requests);
                set(total_pages, self.total_pages);
                set(hot_ratio, self.hot_ratio);
                set(scan_ratio, self.scan_ratio);
            }
            Workload::Dynamic {
                total_requests,
                hot_set_size,
                scan_length,
                phases,
            } => {
                set(total_requests, self.total_requests);
                set(hot_set_size, self.hot_set_size);
                set(scan_length, self.scan_length);
                set(phases, self.phases);
            }
            Workload::Oscillating {
                cycles,
                hot_burst,
                scan_burst,
                hot_set_size,
            } => {
                set(cycles, self.cycles);
                set(hot_burst, self.hot_burst);
                set(scan_burst, self.scan_burst);
                set(hot_set_size, self.hot_set_size);
            }
            Workload::Zipfian {
                total_requests,
                universe,
                theta,
            } => {
                set(total_requests, self.total_requests);
                set(universe, self.universe);
                set(theta, self.theta);
            }
        }
        workload
    }
}

fn set<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub format: ReportFormat,
    pub costs: CostModel,
    /// Write the replayed sequence here as a `.trace` file, one page per
    /// line. In suite mode this is a directory holding `<KEY>.trace` files.
    pub save_trace: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        if config.cache.policies.is_empty() {
            anyhow::bail!("cache.policies must name at least one policy");
        }
        Ok(config)
    }
}
