//! Generated columns in migrations
//!
//! Postgres WAL replication to the datalake does not support generated
//! columns. Migrations are named with an 8-digit date prefix and only those
//! dated on or after the cutoff are checked; undated files are always checked.

use crate::report::{HookReport, Violation};
use crate::suppression::{Marker, Suppressions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tatari_hooks_core::error::{Error, Result, ResultExt};

pub const DEFAULT_CUTOFF: &str = "20240426";

static DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}").unwrap());
static GENERATED_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)GENERATED ALWAYS AS \(\w+\) STORED").unwrap());

const MESSAGE: &str =
    "Postgres WAL replication to datalake does not support generated column. Please use a different approach";

/// Validated `YYYYMMDD` cutoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cutoff(String);

impl Cutoff {
    pub fn new(date: &str) -> Result<Self> {
        if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(date.to_string()))
        } else {
            Err(Error::validation(format!(
                "Invalid cutoff date '{}': expected YYYYMMDD",
                date
            )))
        }
    }

    /// Whether a migration file falls under the check
    pub fn applies_to(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        DATE_PREFIX
            .find(name)
            .is_none_or(|m| m.as_str() >= self.0.as_str())
    }
}

impl Default for Cutoff {
    fn default() -> Self {
        Self(DEFAULT_CUTOFF.to_string())
    }
}

/// One violation per offending line not marked `-- tatari-noqa`
pub fn check_content(path: &Path, content: &str) -> Vec<Violation> {
    let mut violations: Vec<Violation> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| GENERATED_COLUMN.is_match(line))
        .map(|(i, _)| Violation::on_line(path, i + 1, MESSAGE))
        .collect();

    Suppressions::new(content, &Marker::default()).retain_unsuppressed(&mut violations);
    violations
}

pub fn check_file(path: &Path, cutoff: &Cutoff) -> Result<Vec<Violation>> {
    if !cutoff.applies_to(path) {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Reading {}", path.display()))?;
    Ok(check_content(path, &content))
}

pub fn run(paths: &[PathBuf], cutoff: &Cutoff) -> HookReport {
    HookReport::scan(paths, |path| check_file(path, cutoff))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "\
CREATE TABLE t (
    a int,
    b int GENERATED ALWAYS AS (a) STORED,
    c int generated always as (a) stored
);
";

    #[test]
    fn test_violation_per_line() {
        let v = check_content(Path::new("20240501_add.sql"), SQL);
        let lines: Vec<_> = v.iter().map(|v| v.line.unwrap()).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn test_marked_line_is_suppressed() {
        let sql = "\
ALTER TABLE t ADD COLUMN b int GENERATED ALWAYS AS (a) STORED, -- tatari-noqa
ALTER TABLE t ADD COLUMN c int GENERATED ALWAYS AS (a) STORED;
";
        let v = check_content(Path::new("20240501_add.sql"), sql);
        let lines: Vec<_> = v.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![Some(2)]);
    }

    #[test]
    fn test_cutoff_filtering() {
        let cutoff = Cutoff::default();
        assert!(cutoff.applies_to(Path::new("migrations/20240426_x.sql")));
        assert!(cutoff.applies_to(Path::new("migrations/20250101_x.sql")));
        assert!(!cutoff.applies_to(Path::new("migrations/20231231_x.sql")));
        assert!(cutoff.applies_to(Path::new("migrations/add_column.sql")));
    }

    #[test]
    fn test_invalid_cutoff() {
        assert!(Cutoff::new("2024-04-26").is_err());
        assert!(Cutoff::new("20240426").is_ok());
    }

    #[test]
    fn test_old_migration_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("20200101_old.sql");
        let new = dir.path().join("20240601_new.sql");
        fs::write(&old, SQL).unwrap();
        fs::write(&new, SQL).unwrap();

        let report = run(&[old, new.clone()], &Cutoff::default());
        assert_eq!(report.violations.len(), 2);
        assert!(report.violations.iter().all(|v| v.path == new));
    }
}
