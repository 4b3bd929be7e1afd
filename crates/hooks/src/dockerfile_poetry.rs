//! Dockerfile poetry pin - require an explicit poetry version
//!
//! Any `poetry=<version>`, `poetry==<version>` or `poetry~=<version>` in the
//! file satisfies the check, e.g. `RUN pip install poetry==1.8.3`.

use crate::report::{HookReport, Violation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tatari_hooks_core::error::{Error, Result, ResultExt};

static POETRY_PIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"poetry(?:==|~=|=)\d[\d.]*").unwrap());

pub fn check_content(path: &Path, content: &str) -> Vec<Violation> {
    if POETRY_PIN.is_match(content) {
        Vec::new()
    } else {
        vec![Violation::whole_file(
            path,
            format!("Poetry version needs to be specified in {}", path.display()),
        )]
    }
}

pub fn check_file(path: &Path) -> Result<Vec<Violation>> {
    let content = fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Reading {}", path.display()))?;
    Ok(check_content(path, &content))
}

pub fn run(paths: &[PathBuf]) -> HookReport {
    HookReport::scan(paths, check_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_versions_pass() {
        let path = Path::new("Dockerfile");
        assert!(check_content(path, "RUN pip install poetry==1.8.3\n").is_empty());
        assert!(check_content(path, "RUN pip install 'poetry~=1.8'\n").is_empty());
        assert!(check_content(path, "ENV POETRY_VERSION=1.8.3\nRUN pip install poetry=1.8.3\n").is_empty());
    }

    #[test]
    fn test_operator_without_version_is_unpinned() {
        let path = Path::new("Dockerfile");
        assert_eq!(check_content(path, "RUN pip install poetry\n").len(), 1);
        assert_eq!(check_content(path, "RUN pip install poetry==\n").len(), 1);
        assert_eq!(check_content(path, "RUN pip install poetry>=1.8\n").len(), 1);
    }

    #[test]
    fn test_unpinned_is_whole_file_violation() {
        let path = Path::new("docker/Dockerfile");
        let v = check_content(path, "FROM python:3.11\nRUN pip install poetry\n");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].line, None);
        assert_eq!(
            v[0].to_string(),
            "docker/Dockerfile: Poetry version needs to be specified in docker/Dockerfile"
        );
    }

    #[test]
    fn test_multiple_dockerfiles() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("Dockerfile");
        let bad = dir.path().join("Dockerfile.dev");
        fs::write(&good, "RUN pip install poetry==1.8.3\n").unwrap();
        fs::write(&bad, "RUN pip install poetry\n").unwrap();

        let report = run(&[good, bad.clone()]);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].path, bad);
    }

    #[test]
    fn test_missing_file_is_error() {
        let report = run(&[PathBuf::from("/nonexistent/Dockerfile")]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.exit_code(), 1);
    }
}
