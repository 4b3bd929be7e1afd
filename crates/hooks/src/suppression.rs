//! Inline suppression markers
//!
//! A line bearing the marker is exempt from every violation reported on that
//! exact line. Marker spellings are relied on by consuming repositories.

use crate::report::Violation;
use regex::Regex;
use std::collections::HashSet;

/// Generic suppression marker
pub const NOQA: &str = "tatari-noqa";

/// How a hook recognizes its suppression marker
#[derive(Debug, Clone, Copy)]
pub enum Marker {
    /// Verbatim substring
    Literal(&'static str),
    /// Hook-specific comment pattern such as `# noqa: hardcoded-bucket`
    Pattern(&'static Regex),
}

impl Marker {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Marker::Literal(token) => line.contains(token),
            Marker::Pattern(re) => re.is_match(line),
        }
    }
}

impl Default for Marker {
    fn default() -> Self {
        Marker::Literal(NOQA)
    }
}

/// Lines of one file that carry the marker
#[derive(Debug, Default)]
pub struct Suppressions {
    lines: HashSet<usize>,
}

impl Suppressions {
    pub fn new(text: &str, marker: &Marker) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| marker.matches(line))
            .map(|(i, _)| i + 1)
            .collect();
        Self { lines }
    }

    /// Whether the 1-based line carries the marker
    pub fn is_suppressed(&self, line: usize) -> bool {
        self.lines.contains(&line)
    }

    /// Drop violations on marked lines; whole-file violations always stay
    pub fn retain_unsuppressed(&self, violations: &mut Vec<Violation>) {
        violations.retain(|v| v.line.is_none_or(|line| !self.is_suppressed(line)));
    }
}
