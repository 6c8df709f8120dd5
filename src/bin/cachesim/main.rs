//! Command-line front end: generate a request sequence (or take one from the
//! fixed WL01 to WL09 suite), replay it through the selected policies and
//! print the comparison report.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use cachesim::builder::PolicyKind;
use cachesim::compare::{Comparison, SuiteRun, TUNING_MAX_A1IN, tune_two_q};
use cachesim::metrics::{Report, ReportConfig, ReportFormat, SuiteSummary};
use cachesim::workload::suite::{self, Recipe, SUITE_CAPACITY, SUITE_REQUESTS};
use cachesim::workload::{WorkloadKind, format_trace};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "cachesim")]
#[command(about = "Compare cache replacement policies on synthetic workloads")]
struct Args {
    /// TOML configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cache capacity in pages
    #[arg(short = 'n', long)]
    capacity: Option<usize>,

    /// Comma-separated policies (fifo, lru, lfu, 2q, arc, opt) or `all`
    #[arg(short, long, value_delimiter = ',')]
    policies: Option<Vec<String>>,

    /// Workload kind: static, dynamic, oscillating, zipfian
    #[arg(short, long)]
    workload: Option<WorkloadKind>,

    /// Run suite workloads instead: `all` (default), `WL03`, a full key, or
    /// a comma-separated list
    #[arg(long, num_args = 0..=1, default_missing_value = "all")]
    suite: Option<String>,

    /// Write the replayed sequence as a `.trace` file (a directory of
    /// `<KEY>.trace` files in suite mode)
    #[arg(long)]
    save_trace: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    requests: Option<usize>,

    #[arg(long)]
    pages: Option<usize>,

    #[arg(long)]
    hot_ratio: Option<f64>,

    #[arg(long)]
    scan_ratio: Option<f64>,

    #[arg(long)]
    hot_set: Option<usize>,

    #[arg(long)]
    scan_length: Option<usize>,

    #[arg(long)]
    phases: Option<usize>,

    #[arg(long)]
    cycles: Option<usize>,

    #[arg(long)]
    hot_burst: Option<usize>,

    #[arg(long)]
    scan_burst: Option<usize>,

    #[arg(long)]
    universe: Option<usize>,

    /// Zipfian skew
    #[arg(long)]
    theta: Option<f64>,

    /// Share of capacity given to the 2Q A1in queue
    #[arg(long)]
    a1in_fraction: Option<f64>,

    /// 2Q A1out ghost count as a share of capacity
    #[arg(long)]
    a1out_fraction: Option<f64>,

    /// Pick the 2Q A1in size by an offline search over the sequence
    #[arg(long)]
    tune_two_q: bool,

    /// Run each policy on its own thread
    #[arg(long)]
    parallel: bool,

    /// Check every policy invariant after each request
    #[arg(long)]
    deep_checks: bool,

    /// Output format: text or json
    #[arg(short, long)]
    format: Option<ReportFormat>,

    #[arg(long)]
    hit_cost: Option<f64>,

    #[arg(long)]
    miss_cost: Option<f64>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(policies) = self.policies {
            config.cache.policies = parse_policies(&policies)?;
        }
        override_with(&mut config.cache.capacity, self.capacity);
        override_with(&mut config.cache.two_q.a1in_fraction, self.a1in_fraction);
        override_with(&mut config.cache.two_q.a1out_fraction, self.a1out_fraction);
        config.cache.tune_two_q |= self.tune_two_q;
        config.cache.parallel |= self.parallel;
        config.cache.deep_checks |= self.deep_checks;

        let workload = &mut config.workload;
        override_with(&mut workload.kind, self.workload);
        override_with(&mut workload.seed, self.seed);
        or_keep(&mut workload.suite, self.suite);
        or_keep(&mut workload.total_requests, self.requests);
        or_keep(&mut workload.total_pages, self.pages);
        or_keep(&mut workload.hot_ratio, self.hot_ratio);
        or_keep(&mut workload.scan_ratio, self.scan_ratio);
        or_keep(&mut workload.hot_set_size, self.hot_set);
        or_keep(&mut workload.scan_length, self.scan_length);
        or_keep(&mut workload.phases, self.phases);
        or_keep(&mut workload.cycles, self.cycles);
        or_keep(&mut workload.hot_burst, self.hot_burst);
        or_keep(&mut workload.scan_burst, self.scan_burst);
        or_keep(&mut workload.universe, self.universe);
        or_keep(&mut workload.theta, self.theta);

        let report = &mut config.report;
        override_with(&mut report.format, self.format);
        override_with(&mut report.costs.hit_cost, self.hit_cost);
        override_with(&mut report.costs.miss_cost, self.miss_cost);
        if self.save_trace.is_some() {
            report.save_trace = self.save_trace;
        }
        Ok(())
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn or_keep<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn parse_policies(names: &[String]) -> anyhow::Result<Vec<PolicyKind>> {
    if names.iter().any(|n| n.trim().eq_ignore_ascii_case("all")) {
        return Ok(PolicyKind::ALL.to_vec());
    }
    let mut policies = Vec::with_capacity(names.len());
    for name in names {
        let kind: PolicyKind = name.parse()?;
        if !policies.contains(&kind) {
            policies.push(kind);
        }
    }
    if policies.is_empty() {
        bail!("--policies must name at least one policy");
    }
    Ok(policies)
}

/// RUST_LOG wins; otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply(&mut config)?;
    run(config)
}

fn run(config: Config) -> anyhow::Result<()> {
    if let Some(selector) = &config.workload.suite {
        return run_suite(&config, selector);
    }

    let capacity = config.cache.capacity;
    let workload = config.workload.build();
    let requests = workload
        .generate(config.workload.seed)
        .context("invalid workload parameters")?;
    let description = workload.to_string();
    info!(requests = requests.len(), workload = %description, "request sequence ready");

    if let Some(path) = &config.report.save_trace {
        save_trace(path, &requests)?;
    }

    let mut comparison = comparison_for(&config).two_q(config.cache.two_q);
    let mut report_config = ReportConfig::new(capacity, description, requests.len())
        .costs(config.report.costs)
        .seed(config.workload.seed);

    if config.cache.tune_two_q && comparison.selected().contains(&PolicyKind::TwoQ) {
        let tuning = tune_two_q(capacity, &requests, TUNING_MAX_A1IN)
            .context("2Q tuning failed")?;
        info!(
            a1in = tuning.a1in_slots,
            a1out = tuning.a1out_slots,
            hit_rate = tuning.hit_rate,
            "2Q tuned"
        );
        comparison = comparison.two_q_slots(tuning.a1in_slots, tuning.a1out_slots);
        report_config = report_config.two_q_tuning(tuning);
    }

    let runs = comparison.run(&requests).context("simulation failed")?;
    let output = Report::new(report_config, &runs)
        .render(config.report.format)
        .context("failed to render report")?;
    println!("{output}");
    Ok(())
}

/// One selected recipe prints its full report; several print the summary
/// table. 2Q is always tuned per recipe.
fn run_suite(config: &Config, selector: &str) -> anyhow::Result<()> {
    let recipes = select_recipes(selector)?;
    let capacity = config.cache.capacity;
    if capacity != SUITE_CAPACITY {
        warn!(
            capacity,
            expected = SUITE_CAPACITY,
            "suite recipes are shaped for a different cache size"
        );
    }

    if let Some(dir) = &config.report.save_trace {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        for recipe in &recipes {
            save_trace(&dir.join(format!("{}.trace", recipe.key)), &recipe.build())?;
        }
    }

    let comparison = comparison_for(config);
    let mut rows: Vec<SuiteRun> = Vec::with_capacity(recipes.len());
    for (i, recipe) in recipes.into_iter().enumerate() {
        info!(workload = recipe.key, step = i + 1, "running suite workload");
        let row = comparison
            .run_recipe(recipe)
            .with_context(|| format!("workload {} failed", recipe.key))?;
        rows.push(row);
    }

    let output = match rows.as_slice() {
        [single] => {
            let recipe = single.recipe;
            let description =
                format!("{} [favors {}]: {}", recipe.key, recipe.category, recipe.goal);
            let report_config = ReportConfig::new(capacity, description, SUITE_REQUESTS)
                .costs(config.report.costs)
                .two_q_tuning(single.tuning);
            Report::new(report_config, &single.runs).render(config.report.format)
        }
        _ => SuiteSummary::new(capacity, &rows).render(config.report.format),
    }
    .context("failed to render report")?;
    println!("{output}");
    Ok(())
}

fn comparison_for(config: &Config) -> Comparison {
    Comparison::new(config.cache.capacity)
        .policies(config.cache.policies.iter().copied())
        .cost_model(config.report.costs)
        .parallel(config.cache.parallel)
        .deep_checks(config.cache.deep_checks)
}

/// `all`, or a comma-separated list of keys, short keys and numbers.
/// Duplicates are dropped; order follows the list.
fn select_recipes(selector: &str) -> anyhow::Result<Vec<&'static Recipe>> {
    if selector.trim().eq_ignore_ascii_case("all") {
        return Ok(suite::recipes().iter().collect());
    }
    let mut recipes: Vec<&'static Recipe> = Vec::new();
    for part in selector.split(',').filter(|p| !p.trim().is_empty()) {
        let recipe = suite::find(part)?;
        if !recipes.iter().any(|r| r.key == recipe.key) {
            recipes.push(recipe);
        }
    }
    if recipes.is_empty() {
        bail!("--suite must name at least one workload");
    }
    Ok(recipes)
}

fn save_trace(path: &Path, requests: &[u64]) -> anyhow::Result<()> {
    std::fs::write(path, format_trace(requests))
        .with_context(|| format!("failed to write trace {}", path.display()))?;
    info!(path = %path.display(), requests = requests.len(), "trace saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file() {
        let mut config = Config::parse("[cache]\ncapacity = 8\n[workload]\nseed = 1\n").unwrap();
        let args = Args::parse_from([
            "cachesim",
            "--capacity",
            "16",
            "--policies",
            "lru,2q,lru",
            "--workload",
            "dynamic",
            "--phases",
            "2",
            "--format",
            "json",
            "--tune-two-q",
        ]);
        args.apply(&mut config).unwrap();

        assert_eq!(config.cache.capacity, 16);
        assert_eq!(config.cache.policies, vec![PolicyKind::Lru, PolicyKind::TwoQ]);
        assert!(config.cache.tune_two_q);
        assert_eq!(config.workload.kind, WorkloadKind::Dynamic);
        assert_eq!(config.workload.seed, 1);
        assert_eq!(config.workload.phases, Some(2));
        assert_eq!(config.report.format, ReportFormat::Json);
    }

    #[test]
    fn all_selects_every_policy() {
        let names = vec!["lru".to_string(), "ALL".to_string()];
        assert_eq!(parse_policies(&names).unwrap(), PolicyKind::ALL.to_vec());
        assert!(parse_policies(&["lru".to_string(), "mru".to_string()]).is_err());
    }

    #[test]
    fn run_renders_small_comparison() {
        let mut config = Config::default();
        config.cache.capacity = 4;
        config.workload.total_requests = Some(500);
        config.workload.total_pages = Some(20);
        config.cache.tune_two_q = true;
        assert!(run(config).is_ok());
    }

    #[test]
    fn bare_suite_flag_means_all() {
        let mut config = Config::default();
        Args::parse_from(["cachesim", "--suite"]).apply(&mut config).unwrap();
        assert_eq!(config.workload.suite.as_deref(), Some("all"));

        let mut config = Config::default();
        Args::parse_from(["cachesim", "--suite", "wl04"]).apply(&mut config).unwrap();
        assert_eq!(config.workload.suite.as_deref(), Some("wl04"));
    }

    #[test]
    fn suite_selection() {
        assert_eq!(select_recipes("ALL").unwrap().len(), 9);
        let picked: Vec<_> = select_recipes("wl02, 7,WL02_FREQ_BALANCED")
            .unwrap()
            .iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(picked, ["WL02_FREQ_BALANCED", "WL07_SCAN_SANDWICH"]);
        assert!(select_recipes("WL10").is_err());
        assert!(select_recipes(" , ").is_err());
    }

    #[test]
    fn suite_run_writes_one_trace_per_workload() {
        let dir = std::env::temp_dir().join(format!("cachesim-suite-{}", std::process::id()));
        let mut config = Config::default();
        config.cache.policies = vec![PolicyKind::Fifo, PolicyKind::Lru];
        config.workload.suite = Some("WL05,WL01".to_string());
        config.report.save_trace = Some(dir.clone());
        let result = run(config);

        let saved = std::fs::read_to_string(dir.join("WL05_FIFO_CONVOY.trace"));
        let other = dir.join("WL01_STATIC_FREQ.trace").exists();
        let _ = std::fs::remove_dir_all(&dir);

        assert!(result.is_ok());
        let saved = saved.unwrap();
        assert_eq!(saved.lines().count(), SUITE_REQUESTS);
        assert!(saved.starts_with("1\n2\n3\n"));
        assert!(other);
    }
}
