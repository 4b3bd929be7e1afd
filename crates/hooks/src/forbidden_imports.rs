//! Forbidden imports - flag imports of configured modules or classes
//!
//! Every import statement in the file is checked, including those nested in
//! functions. An entry matches the name as written after `import` or its fully
//! qualified form (`module.name` for `from` imports).

use crate::python::{collect_imports, PythonSource};
use crate::report::{HookReport, Violation};
use crate::suppression::{Marker, Suppressions};
use std::path::{Path, PathBuf};
use tatari_hooks_core::error::{Error, Result};

/// Check one file against the forbidden names
pub fn check_file(path: &Path, forbidden: &[String]) -> Result<Vec<Violation>> {
    let source = PythonSource::read(path)?;
    let mut violations = Vec::new();

    for stmt in collect_imports(&source) {
        for name in &stmt.names {
            let qualified = stmt.qualified(name);
            if forbidden.iter().any(|f| *f == name.name || *f == qualified) {
                violations.push(Violation::at(
                    path,
                    name.line,
                    name.column,
                    format!("Flagged import of {}", name.name),
                ));
            }
        }
    }

    Suppressions::new(&source.text, &Marker::default()).retain_unsuppressed(&mut violations);
    Ok(violations)
}

pub fn run(paths: &[PathBuf], forbidden: &[String]) -> HookReport {
    if forbidden.is_empty() {
        let mut report = HookReport::new();
        report.push_error(
            Error::config("No classes to check provided").with_suggestion(
                "Add `args: ['--forbidden-classes', 'foo', 'bar', '--']` to the pre-commit config",
            ),
        );
        return report;
    }

    HookReport::scan(paths, |path| check_file(path, forbidden))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn forbidden(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flags_every_forbidden_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "dag.py",
            "from airflow.operators import BashOperator\nimport os\n\ndef task():\n    from legacy import Thing\n",
        );

        let violations = check_file(&path, &forbidden(&["BashOperator", "Thing"])).unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].line, Some(1));
        assert_eq!(violations[1].line, Some(5));
    }

    #[test]
    fn test_qualified_entry_matches_from_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.py",
            "from airflow.operators.bash import BashOperator\nfrom other.bash import BashOperator as B\n",
        );

        let violations =
            check_file(&path, &forbidden(&["airflow.operators.bash.BashOperator"])).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, Some(1));
    }

    #[test]
    fn test_strings_comments_and_noqa_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.py",
            "# import Thing\nx = 'from legacy import Thing'\nfrom legacy import Thing  # tatari-noqa\n",
        );

        assert!(check_file(&path, &forbidden(&["Thing"])).unwrap().is_empty());
    }

    #[test]
    fn test_empty_list_is_config_error() {
        let report = run(&[PathBuf::from("a.py")], &[]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.exit_code(), 1);
    }
}
