use chrono::Utc;

use super::{Outcome, TestRun};

const RULE: &str =
    "============================================================";

pub fn banner(host: &str, port: u16) {
    println!("{}", RULE);
    println!("RESP SERVER CONFORMANCE RUN — {}:{}", host, port);
    println!("{}", RULE);
}

pub fn section(title: &str) {
    println!();
    println!("{}", RULE);
    println!("{}", title);
    println!("{}", RULE);
}

pub fn case_line(name: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Passed => println!("  ✓ {}", name),
        failed => println!("  ✗ {}: {}", name, failed),
    }
}

pub fn print_summary(run: &TestRun) {
    let total = run.total();
    let percent = |count: u32| if total > 0 { count * 100 / total } else { 0 };
    let elapsed = Utc::now().signed_duration_since(run.started_at);

    println!();
    println!("{}", RULE);
    println!("SUMMARY — run {}", run.id);
    println!("{}", RULE);
    println!("Started:  {}", run.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Elapsed:  {} ms", elapsed.num_milliseconds());
    println!("Total:    {}", total);
    println!("Passed:   {} ({}%)", run.passed(), percent(run.passed()));
    println!("Failed:   {} ({}%)", run.failed(), percent(run.failed()));

    if !run.failures().is_empty() {
        println!();
        println!("Failed cases:");
        for failure in run.failures() {
            println!("  • {}: {}", failure.name, failure.reason);
        }
    }

    println!();
    if run.all_passed() {
        println!("ALL CASES PASSED");
    } else {
        println!("{} CASE(S) FAILED", run.failed());
    }
    println!("{}", RULE);
}
