//! Example comparing all six policies on a generated workload.
//!
//! Run with: cargo run --example compare_policies

use cachesim::prelude::*;

fn main() {
    let workload = Workload::Dynamic {
        total_requests: 20_000,
        hot_set_size: 24,
        scan_length: 400,
        phases: 5,
    };
    let requests = workload.generate(2024).expect("valid workload");

    let tuning = tune_two_q(32, &requests, 16).expect("2Q tuning");
    let runs = Comparison::new(32)
        .two_q_slots(tuning.a1in_slots, tuning.a1out_slots)
        .parallel(true)
        .run(&requests)
        .expect("simulation");

    let config = ReportConfig::new(32, workload.to_string(), requests.len())
        .seed(2024)
        .two_q_tuning(tuning);
    println!("{}", Report::new(config, &runs).to_text());
}
