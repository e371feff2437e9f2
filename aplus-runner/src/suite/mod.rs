mod resolution;
mod state;
mod then;


use crate::harness::{CaseResult, Harness};

/// One conformance check, named after the clause it covers.
#[derive(Clone, Copy)]
pub struct Case {
    pub section: &'static str,
    pub name: &'static str,
    pub run: fn(&Harness) -> CaseResult,
}

impl Case {
    pub const fn new(
        section: &'static str,
        name: &'static str,
        run: fn(&Harness) -> CaseResult,
    ) -> Self {
        Self { section, name, run }
    }

    pub fn id(&self) -> String {
        format!("{} {}", self.section, self.name)
    }

    /// Clause prefix match: `2.2` selects `2.2.1` and `2.2.7.4` but not `2.20`.
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.trim_end_matches('.');
        self.section == filter
            || self
                .section
                .strip_prefix(filter)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

pub fn catalog() -> Vec<Case> {
    let mut cases = Vec::new();
    cases.extend_from_slice(state::CASES);
    cases.extend_from_slice(then::CASES);
    cases.extend_from_slice(resolution::CASES);
    cases
}

pub fn select(filter: Option<&str>) -> Vec<Case> {
    catalog()
        .into_iter()
        .filter(|case| filter.is_none_or(|prefix| case.matches(prefix)))
        .collect()
}
