use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;

use pledge::Engine;

use crate::runner::{TestResult, run_case};
use crate::stats::Analysis;
use crate::suite::Case;

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub case: String,
    pub reason: String,
}

#[derive(Default, Serialize)]
pub struct SuiteSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<Failure>,
    #[serde(skip_serializing_if = "Analysis::is_empty")]
    pub analysis: Analysis,
}

pub fn init_thread_pool() {
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8);

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

pub fn run_suite(cases: &[Case], engine: &Engine, verbose: bool, analyze: bool) -> SuiteSummary {
    let records: Vec<_> = cases
        .par_iter()
        .map(|case| (case, run_guarded(case, engine)))
        .collect();
    let mut summary = SuiteSummary::default();

    for (case, result) in records {
        if analyze {
            summary.analysis.record(case.section, &result);
        }
        apply_record(&mut summary, case, result, verbose);
    }

    summary
}

/// Each case builds its own single-threaded context inside the worker, so
/// nothing crosses threads but the case table and the engine options.
fn run_guarded(case: &Case, engine: &Engine) -> TestResult {
    panic::catch_unwind(AssertUnwindSafe(|| run_case(case, engine)))
        .unwrap_or_else(|payload| TestResult::Failed(panic_reason(payload.as_ref())))
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str));
    match message {
        Some(message) => format!("panic while running case: {message}"),
        None => "panic while running case".to_string(),
    }
}

fn apply_record(summary: &mut SuiteSummary, case: &Case, result: TestResult, verbose: bool) {
    let id = case.id();
    match result {
        TestResult::Passed => {
            summary.passed += 1;
            if verbose {
                println!("{} {}", "PASS".green(), id);
            }
        }
        TestResult::Failed(reason) => {
            summary.failed += 1;
            if verbose {
                println!("{} {} - {}", "FAIL".red(), id, reason);
            }
            summary.failures.push(Failure { case: id, reason });
        }
        TestResult::Skipped(reason) => {
            summary.skipped += 1;
            if verbose {
                println!("{} {} - {}", "SKIP".yellow(), id, reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::CaseError;

    fn failing(_: &crate::harness::Harness) -> crate::harness::CaseResult {
        Err(CaseError::Failed("nope".into()))
    }

    fn panicking(_: &crate::harness::Harness) -> crate::harness::CaseResult {
        panic!("boom")
    }

    #[test]
    fn test_run_suite_counts_outcomes() {
        let cases = [
            Case::new("9.1", "passes", |_| Ok(())),
            Case::new("9.2", "fails", failing),
            Case::new("9.3", "skips", |_| Err(CaseError::Skipped("later".into()))),
        ];

        let summary = run_suite(&cases, &Engine::new(), false, true);

        assert_eq!((summary.passed, summary.failed, summary.skipped), (1, 1, 1));
        assert_eq!(summary.failures[0].case, "9.2 fails");
        assert_eq!(summary.failures[0].reason, "nope");
        assert_eq!(summary.analysis.sections.len(), 3);
    }

    #[test]
    fn test_panics_become_failures() {
        let result = run_guarded(&Case::new("9.9", "panics", panicking), &Engine::new());
        assert_eq!(
            result,
            TestResult::Failed("panic while running case: boom".into())
        );
    }
}
