use serde::Serialize;

use pledge::Engine;

use crate::harness::{CaseError, Harness};
use crate::suite::Case;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum TestResult {
    Passed,
    Failed(String),
    Skipped(String),
}

/// Runs one case on a fresh event loop. Work the case leaves queued is
/// drained so a late failure still counts.
pub fn run_case(case: &Case, engine: &Engine) -> TestResult {
    let harness = Harness::new(engine);
    let outcome = (case.run)(&harness).and_then(|()| harness.settle());

    match outcome {
        Ok(()) => TestResult::Passed,
        Err(CaseError::Failed(reason)) => TestResult::Failed(reason),
        Err(CaseError::Skipped(reason)) => TestResult::Skipped(reason),
    }
}
