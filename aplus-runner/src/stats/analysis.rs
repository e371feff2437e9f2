use std::collections::HashMap;

use serde::Serialize;

use crate::runner::TestResult;

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SectionStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct Analysis {
    pub sections: HashMap<String, SectionStats>,
    pub failure_messages: HashMap<String, usize>,
    pub skip_reasons: HashMap<String, usize>,
}

impl Analysis {
    pub fn record(&mut self, section: &str, result: &TestResult) {
        let stats = self.sections.entry(clause_group(section)).or_default();
        stats.total += 1;

        match result {
            TestResult::Passed => stats.passed += 1,
            TestResult::Failed(reason) => {
                stats.failed += 1;
                *self
                    .failure_messages
                    .entry(normalize_message(reason))
                    .or_insert(0) += 1;
            }
            TestResult::Skipped(reason) => {
                stats.skipped += 1;
                *self.skip_reasons.entry(reason.clone()).or_insert(0) += 1;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// `2.3.3.3.1` groups under `2.3.3`.
fn clause_group(section: &str) -> String {
    section.split('.').take(3).collect::<Vec<_>>().join(".")
}

/// Drops the timing prefix and sentinel details so equal failures group
/// together.
fn normalize_message(message: &str) -> String {
    let first_line = message.lines().next().unwrap_or_default().trim();
    let without_timing = first_line
        .split_once(": ")
        .filter(|(prefix, _)| prefix.starts_with("already") || prefix.starts_with("settled"))
        .map_or(first_line, |(_, rest)| rest);
    let compact = without_timing.split_whitespace().collect::<Vec<_>>().join(" ");
    let max_chars = 140;

    if compact.chars().count() <= max_chars {
        compact
    } else {
        let clipped: String = compact.chars().take(max_chars).collect();
        format!("{clipped}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_group_by_clause() {
        let mut analysis = Analysis::default();
        analysis.record("2.3.3.3.1", &TestResult::Passed);
        analysis.record("2.3.3.4", &TestResult::Failed("x".into()));
        analysis.record("2.1", &TestResult::Skipped("limit".into()));

        let group = analysis.sections["2.3.3"];
        assert_eq!((group.total, group.passed, group.failed), (2, 1, 1));
        assert_eq!(analysis.sections["2.1"].skipped, 1);
        assert_eq!(analysis.skip_reasons["limit"], 1);
    }

    #[test]
    fn test_failure_messages_drop_timing() {
        assert_eq!(
            normalize_message("settled eventually: promise2 value: expected 1, got 2"),
            "promise2 value: expected 1, got 2"
        );
        assert_eq!(normalize_message("plain   failure\nsecond line"), "plain failure");
    }
}
