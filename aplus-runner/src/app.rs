use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use colored::Colorize;
use serde::Serialize;

use crate::cli::Cli;
use crate::execution::{Failure, SuiteSummary, init_thread_pool, run_suite};
use crate::stats::print_analysis;
use crate::suite;

#[derive(Serialize)]
struct JsonReport<'a> {
    elapsed_secs: f64,
    #[serde(flatten)]
    summary: &'a SuiteSummary,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let start = Instant::now();

    init_thread_pool();

    let cases = suite::select(cli.filter.as_deref());
    if cases.is_empty() {
        eprintln!(
            "{} no cases match filter {:?}",
            "error:".red().bold(),
            cli.filter.as_deref().unwrap_or_default()
        );
        return ExitCode::from(2);
    }
    log::info!("running {} case(s) with {:?}", cases.len(), cli.engine());

    if !cli.json {
        println!("{} {} cases...\n", "Running".bold().cyan(), cases.len());
    }

    let summary = run_suite(&cases, &cli.engine(), cli.verbose, cli.analyze);
    let elapsed_secs = start.elapsed().as_secs_f64();

    if cli.json {
        print_json(&summary, elapsed_secs);
    } else {
        print_totals(&summary, elapsed_secs);
        if cli.analyze {
            print_analysis(&summary.analysis);
        }
        if summary.failed > 0 && !cli.verbose {
            print_failure_sample(&summary.failures);
        }
    }

    if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_json(summary: &SuiteSummary, elapsed_secs: f64) {
    let report = JsonReport {
        elapsed_secs,
        summary,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("failed to serialize summary: {err}"),
    }
}

fn print_totals(summary: &SuiteSummary, elapsed_secs: f64) {
    println!("\n{}", "=".repeat(60));
    println!(
        "Passed: {} | Failed: {} | Skipped: {}",
        summary.passed.to_string().green().bold(),
        summary.failed.to_string().red().bold(),
        summary.skipped.to_string().yellow().bold()
    );
    println!("Completed in {:.2}s", elapsed_secs);
    println!("{}", "=".repeat(60));
}

fn print_failure_sample(failures: &[Failure]) {
    let max_rows = 10;
    let shown = failures.len().min(max_rows);

    println!("\n{}", "Sample failures:".red().bold());
    for failure in failures.iter().take(shown) {
        println!("  {} - {}", failure.case, failure.reason);
    }
    if failures.len() > shown {
        println!(
            "  ... and {} more (use --verbose for all)",
            failures.len() - shown
        );
    }
}
