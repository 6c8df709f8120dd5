//! Text and JSON rendering of a comparison, and of a whole suite.
//!
//! The text layout is a configuration header, one section per policy in run
//! order, then two ranking tables:
//!
//! ```text
//! [Simulation Configuration]
//! - Cache Size: 2 pages
//! - Workload: fixed sequence
//! - Total Requests: 5
//!
//! [Algorithm: LRU]
//! - Hit Rate: 20.00%
//! ...
//!
//! [Hit-Rate Ranking]
//! | Rank | Algorithm | Hit Rate |
//! |------|-----------|----------|
//! | 1    | OPT       | 40.00%   |
//! ```

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::builder::PolicyKind;
use crate::compare::{PolicyRun, SuiteRun, TwoQTuning};
use crate::metrics::summary::CostModel;

/// Output format of a [`Report`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report format `{0}` (expected text or json)")]
pub struct UnknownFormat(pub String);

impl FromStr for ReportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        })
    }
}

/// Run parameters printed in the report header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportConfig {
    pub capacity: usize,
    /// Human-readable workload description.
    pub workload: String,
    pub total_requests: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub costs: CostModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_q_tuning: Option<TwoQTuning>,
}

impl ReportConfig {
    pub fn new(capacity: usize, workload: impl Into<String>, total_requests: usize) -> Self {
        Self {
            capacity,
            workload: workload.into(),
            total_requests,
            seed: None,
            costs: CostModel::default(),
            two_q_tuning: None,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn two_q_tuning(mut self, tuning: TwoQTuning) -> Self {
        self.two_q_tuning = Some(tuning);
        self
    }
}

/// A finished comparison, ready to print.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    config: ReportConfig,
    runs: &'a [PolicyRun],
}

#[derive(Serialize)]
struct JsonReport<'r> {
    config: &'r ReportConfig,
    results: &'r [PolicyRun],
    hit_rate_ranking: Vec<PolicyKind>,
    runtime_ranking: Vec<PolicyKind>,
}

impl<'a> Report<'a> {
    pub fn new(config: ReportConfig, runs: &'a [PolicyRun]) -> Self {
        Self { config, runs }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Runs ordered by hit rate, best first. Ties keep run order.
    pub fn hit_rate_ranking(&self) -> Vec<&'a PolicyRun> {
        let mut ranked: Vec<_> = self.runs.iter().collect();
        ranked.sort_by(|a, b| b.summary.hit_rate.total_cmp(&a.summary.hit_rate));
        ranked
    }

    /// Runs ordered by average time per request, fastest first.
    pub fn runtime_ranking(&self) -> Vec<&'a PolicyRun> {
        let mut ranked: Vec<_> = self.runs.iter().collect();
        ranked.sort_by(|a, b| {
            a.summary
                .avg_overhead_ns
                .total_cmp(&b.summary.avg_overhead_ns)
        });
        ranked
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let report = JsonReport {
            config: &self.config,
            results: self.runs,
            hit_rate_ranking: self.hit_rate_ranking().iter().map(|r| r.policy).collect(),
            runtime_ranking: self.runtime_ranking().iter().map(|r| r.policy).collect(),
        };
        serde_json::to_string_pretty(&report)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let cfg = &self.config;

        // Writing into a String cannot fail.
        let _ = writeln!(out, "[Simulation Configuration]");
        let _ = writeln!(out, "- Cache Size: {} pages", cfg.capacity);
        let _ = writeln!(out, "- Workload: {}", cfg.workload);
        let _ = writeln!(out, "- Total Requests: {}", cfg.total_requests);
        if let Some(seed) = cfg.seed {
            let _ = writeln!(out, "- Seed: {seed}");
        }
        let _ = writeln!(
            out,
            "- Cost Model: hit={}, miss={}",
            cfg.costs.hit_cost, cfg.costs.miss_cost
        );
        if let Some(t) = cfg.two_q_tuning {
            let _ = writeln!(
                out,
                "- 2Q Tuning: A1in={}, A1out={}, Hit Rate={:.2}%",
                t.a1in_slots, t.a1out_slots, t.hit_rate
            );
        }

        for run in self.runs {
            let s = &run.summary;
            out.push('\n');
            let _ = writeln!(out, "[Algorithm: {}]", run.policy);
            let _ = writeln!(out, "- Hit Rate: {:.2}%", s.hit_rate);
            let _ = writeln!(out, "- Avg. Time per Request: {:.2} ns", s.avg_overhead_ns);
            let _ = writeln!(
                out,
                "- Latency p50/p99: {} / {} ns",
                s.latency.p50_ns, s.latency.p99_ns
            );
            let _ = writeln!(
                out,
                "- Weighted Cost: {:.2} ({:.2} per request)",
                s.weighted_cost, s.avg_cost
            );
            let _ = writeln!(out, "- State: {}", run.snapshot);
        }

        out.push('\n');
        let _ = writeln!(out, "[Summary]");
        match self.hit_rate_ranking().first() {
            Some(best) => {
                let _ = writeln!(
                    out,
                    "Best hit rate: {} ({:.2}%).",
                    best.policy, best.summary.hit_rate
                );
            }
            None => {
                let _ = writeln!(out, "No policies were run.");
                return out;
            }
        }

        let hit_rows: Vec<Vec<String>> = self
            .hit_rate_ranking()
            .iter()
            .enumerate()
            .map(|(i, r)| {
                vec![
                    (i + 1).to_string(),
                    r.policy.to_string(),
                    format!("{:.2}%", r.summary.hit_rate),
                ]
            })
            .collect();
        let time_rows: Vec<Vec<String>> = self
            .runtime_ranking()
            .iter()
            .enumerate()
            .map(|(i, r)| {
                vec![
                    (i + 1).to_string(),
                    r.policy.to_string(),
                    format!("{:.2} ns", r.summary.avg_overhead_ns),
                ]
            })
            .collect();

        let _ = writeln!(out, "\n[Hit-Rate Ranking]");
        out.push_str(&table(&["Rank", "Algorithm", "Hit Rate"], &hit_rows));
        let _ = writeln!(out, "\n[Runtime Ranking]");
        out.push_str(&table(&["Rank", "Algorithm", "Avg Time / Req"], &time_rows));
        out
    }
}

/// Hit rates of every suite workload, one row per recipe.
///
/// ```text
/// [Suite Summary]
/// - Cache Size: 32 pages
/// - Workloads: 9
///
/// | Workload         | Favors | 2Q A1in | ARC     | LRU    | ... |
/// |------------------|--------|---------|---------|--------|-----|
/// | WL01_STATIC_FREQ | LFU    | 4       | 81.25%* | 79.90% | ... |
/// ```
///
/// `*` marks the best online policy of each row.
#[derive(Debug, Clone)]
pub struct SuiteSummary<'a> {
    capacity: usize,
    rows: &'a [SuiteRun],
}

#[derive(Serialize)]
struct JsonSuite<'r> {
    capacity: usize,
    workloads: Vec<JsonSuiteRow<'r>>,
}

#[derive(Serialize)]
struct JsonSuiteRow<'r> {
    #[serde(flatten)]
    run: &'r SuiteRun,
    best_online: Option<PolicyKind>,
}

impl<'a> SuiteSummary<'a> {
    pub fn new(capacity: usize, rows: &'a [SuiteRun]) -> Self {
        Self { capacity, rows }
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let suite = JsonSuite {
            capacity: self.capacity,
            workloads: self
                .rows
                .iter()
                .map(|run| JsonSuiteRow {
                    run,
                    best_online: run.best_online().map(|r| r.policy),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&suite)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[Suite Summary]");
        let _ = writeln!(out, "- Cache Size: {} pages", self.capacity);
        let _ = writeln!(out, "- Workloads: {}", self.rows.len());

        let Some(first) = self.rows.first() else {
            let _ = writeln!(out, "No workloads were run.");
            return out;
        };

        let mut headers = vec!["Workload", "Favors", "2Q A1in"];
        headers.extend(first.runs.iter().map(|r| r.policy.name()));

        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|suite| {
                let best = suite.best_online().map(|r| r.policy);
                let mut row = vec![
                    suite.recipe.key.to_string(),
                    suite.recipe.category.to_string(),
                    suite.tuning.a1in_slots.to_string(),
                ];
                row.extend(suite.runs.iter().map(|r| {
                    let mark = if Some(r.policy) == best { "*" } else { "" };
                    format!("{:.2}%{mark}", r.summary.hit_rate)
                }));
                row
            })
            .collect();

        out.push('\n');
        out.push_str(&table(&headers, &rows));
        out
    }
}

/// Pipe table with left-aligned, width-padded columns. Short rows leave
/// trailing columns blank.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: &[&str]| {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| format!("{:<w$}", cells.get(i).copied().unwrap_or("")))
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    let mut out = line(headers);
    let dashes: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&format!("|-{}-|\n", dashes.join("-|-")));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&line(&cells));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Comparison;

    fn fixture_runs() -> Vec<PolicyRun> {
        Comparison::new(2)
            .policies([PolicyKind::Lru, PolicyKind::Fifo, PolicyKind::Opt])
            .run(&[1u32, 2, 1, 3, 2])
            .unwrap()
    }

    #[test]
    fn format_parses() {
        assert_eq!("JSON".parse::<ReportFormat>(), Ok(ReportFormat::Json));
        assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn table_pads_columns() {
        let rows = [vec!["1".to_string(), "OPT".to_string()]];
        assert_eq!(
            table(&["Rank", "Algorithm"], &rows),
            "| Rank | Algorithm |\n|------|-----------|\n| 1    | OPT       |\n"
        );
    }

    #[test]
    fn hit_rate_ranking_is_stable() {
        let runs = fixture_runs();
        let report = Report::new(ReportConfig::new(2, "fixed sequence", 5), &runs);
        let order: Vec<_> = report.hit_rate_ranking().iter().map(|r| r.policy).collect();
        // FIFO and OPT tie at 40%; FIFO ran first.
        assert_eq!(order, [PolicyKind::Fifo, PolicyKind::Opt, PolicyKind::Lru]);
    }

    #[test]
    fn text_report_sections() {
        let runs = fixture_runs();
        let text = Report::new(ReportConfig::new(2, "fixed sequence", 5).seed(7), &runs).to_text();

        assert!(text.starts_with("[Simulation Configuration]\n- Cache Size: 2 pages\n"));
        assert!(text.contains("- Seed: 7\n"));
        assert!(text.contains("[Algorithm: LRU]\n- Hit Rate: 20.00%\n"));
        assert!(text.contains("[Algorithm: OPT]\n- Hit Rate: 40.00%\n"));
        assert!(text.contains("- State: resident=2 cursor=5/5\n"));
        assert!(text.contains("Best hit rate: FIFO (40.00%)."));
        assert!(text.contains("| Rank | Algorithm | Hit Rate |\n"));
        assert!(text.contains("| 3    | LRU       | 20.00%   |\n"));
        assert!(text.contains("[Runtime Ranking]\n| Rank | Algorithm | Avg Time / Req |\n"));
    }

    #[test]
    fn empty_report_has_no_tables() {
        let text = Report::new(ReportConfig::new(4, "none", 0), &[]).to_text();
        assert!(text.contains("No policies were run."));
        assert!(!text.contains("[Hit-Rate Ranking]"));
    }

    #[test]
    fn json_report_structure() {
        let runs = fixture_runs();
        let json = Report::new(ReportConfig::new(2, "fixed sequence", 5), &runs)
            .render(ReportFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["config"]["capacity"], 2);
        assert!(value["config"].get("seed").is_none());
        assert_eq!(value["results"].as_array().unwrap().len(), 3);
        assert_eq!(value["results"][0]["policy"], "lru");
        assert_eq!(value["results"][2]["summary"]["hits"], 2);
        assert_eq!(value["results"][2]["snapshot"]["policy"], "opt");
        assert_eq!(value["hit_rate_ranking"][0], "fifo");
    }

    fn suite_rows() -> Vec<SuiteRun> {
        let comparison =
            Comparison::new(32).policies([PolicyKind::Lru, PolicyKind::Fifo, PolicyKind::Opt]);
        ["WL03", "WL05"]
            .into_iter()
            .map(|key| {
                let recipe = crate::workload::suite::find(key).unwrap();
                comparison.run_recipe(recipe).unwrap()
            })
            .collect()
    }

    #[test]
    fn suite_table_marks_best_online_policy() {
        let rows = suite_rows();
        let text = SuiteSummary::new(32, &rows).to_text();

        assert!(text.starts_with("[Suite Summary]\n- Cache Size: 32 pages\n- Workloads: 2\n"));
        assert!(text.contains("| Workload         | Favors | 2Q A1in | LRU "));
        let fifo_row = text
            .lines()
            .find(|line| line.starts_with("| WL05_FIFO_CONVOY"))
            .unwrap();
        assert!(fifo_row.contains("| FIFO "));
        // Exactly one starred cell per row, never on OPT.
        assert_eq!(fifo_row.matches('*').count(), 1);
        assert!(!fifo_row.trim_end_matches(" |").trim_end().ends_with('*'));
    }

    #[test]
    fn suite_json_lists_workloads() {
        let rows = suite_rows();
        let json = SuiteSummary::new(32, &rows).render(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["capacity"], 32);
        let workloads = value["workloads"].as_array().unwrap();
        assert_eq!(workloads.len(), 2);
        assert_eq!(workloads[0]["recipe"]["key"], "WL03_STATIC_SW");
        assert_eq!(workloads[0]["recipe"]["category"], "lru");
        assert!(workloads[0]["recipe"].get("builder").is_none());
        assert_eq!(workloads[1]["runs"].as_array().unwrap().len(), 3);
        assert!(workloads[1]["tuning"]["a1in_slots"].as_u64().unwrap() >= 1);
        assert_ne!(workloads[1]["best_online"], "opt");
    }

    #[test]
    fn empty_suite_has_no_table() {
        let text = SuiteSummary::new(32, &[]).to_text();
        assert!(text.ends_with("No workloads were run.\n"));
    }
}
