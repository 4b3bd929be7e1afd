//! Dependency constraint style checks for `pyproject.toml`
//!
//! Applications pin compatible releases, packages declare lower bounds. The
//! poetry policies read `[tool.poetry.dependencies]`, the uv policies read
//! PEP 621 `[project]`.

use crate::manifest::{normalize_name, Dependency, PyProject, PYPROJECT};
use crate::report::{HookReport, Violation};
use std::env;
use std::path::{Path, PathBuf};
use tatari_hooks_core::discovery::find_upward;
use tatari_hooks_core::error::{Error, Result};
use tracing::{debug, info};

/// Which constraint style is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// `python` must start with `~`
    PoetryApp,
    /// `python` `^`/`>=`, other deps `>=` without `<=`
    PoetryPkg,
    /// `python` and other deps `^`/`>=`
    PoetryPkgDep,
    /// `requires-python` and deps use `~=`
    UvApp,
    /// `requires-python` `>=`/`~=`, deps `>=` without `<=`
    UvPkg,
}

impl Policy {
    pub fn hook_id(self) -> &'static str {
        match self {
            Policy::PoetryApp => "poetry-app-constraints",
            Policy::PoetryPkg => "poetry-pkg-constraints",
            Policy::PoetryPkgDep => "poetry-pkg-dep-constraints",
            Policy::UvApp => "app-constraints",
            Policy::UvPkg => "pkg-constraints",
        }
    }

    fn is_uv(self) -> bool {
        matches!(self, Policy::UvApp | Policy::UvPkg)
    }

    fn python_ok(self, constraint: &str) -> bool {
        match self {
            Policy::PoetryApp => constraint.starts_with('~'),
            Policy::PoetryPkg | Policy::PoetryPkgDep => {
                constraint.starts_with('^') || constraint.starts_with(">=")
            }
            Policy::UvApp => constraint.contains("~="),
            Policy::UvPkg => constraint.contains(">=") || constraint.contains("~="),
        }
    }

    fn python_guidance(self) -> &'static str {
        match self {
            Policy::PoetryApp => {
                "All package constraints should use ~ when defining versions. For example: python = \"~3.10\""
            }
            Policy::PoetryPkg | Policy::PoetryPkgDep => {
                "Packages should use ^ (or less ideally >=) when defining python versions. For example: python = \"^3.10\""
            }
            Policy::UvApp => {
                "Applications should use ~= when defining python version in requires-python. For example: requires-python = \"~=3.10\""
            }
            Policy::UvPkg => {
                "Packages should use >= or ~= when defining requires-python. For example: requires-python = \">=3.10\""
            }
        }
    }

    /// Rule for the non-python dependencies; poetry apps only pin python
    fn dependency_rule(self) -> Option<DependencyRule> {
        let (accepts, guidance): (fn(&str) -> bool, &'static str) = match self {
            Policy::PoetryApp => return None,
            Policy::PoetryPkg => (
                |c: &str| c.starts_with(">=") && !c.contains("<="),
                "Package constraints should use >= when defining versions. For example: tatari-pyspark = \">=1.0.14\"",
            ),
            Policy::PoetryPkgDep => (
                |c: &str| c.starts_with('^') || c.starts_with(">="),
                "Package constraints should use ^ (or less ideally >=) when defining versions. For example: tatari-pyspark = \"^1.0.14\"",
            ),
            Policy::UvApp => (
                |c: &str| c.contains("~="),
                "All application package constraints should use ~= (compatible release). For example: tatari-metrics = \"~=1.0.1\"",
            ),
            Policy::UvPkg => (
                |c: &str| c.contains(">=") && !c.contains("<="),
                "Package constraints should use >= when defining versions. For example: tatari-pyspark = \">=1.0.14\"",
            ),
        };
        Some(DependencyRule { accepts, guidance })
    }
}

struct DependencyRule {
    accepts: fn(&str) -> bool,
    guidance: &'static str,
}

/// Options for one constraint hook run
#[derive(Debug, Clone)]
pub struct ConstraintOptions {
    pub policy: Policy,
    /// Dependency names exempt from the check
    pub ignore: Vec<String>,
    /// Explicit manifest; otherwise the nearest `pyproject.toml` upwards
    pub pyproject: Option<PathBuf>,
}

impl ConstraintOptions {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ignore: Vec::new(),
            pyproject: None,
        }
    }
}

fn incorrect(path: &Path, dep: &Dependency, guidance: &str) -> Violation {
    let message = match &dep.constraint {
        Some(constraint) => format!("INCORRECT FORMAT: {} = \"{}\"", dep.name, constraint),
        None => format!("INCORRECT FORMAT: {} (unconstrained)", dep.name),
    };
    Violation::whole_file(path, message).with_detail(guidance)
}

/// One violation per non-conforming dependency, in manifest order
pub fn check_manifest(project: &PyProject, policy: Policy, ignore: &[String]) -> Result<Vec<Violation>> {
    let ignored: Vec<String> = ignore.iter().map(|n| normalize_name(n)).collect();
    let is_ignored = |name: &str| ignored.contains(&normalize_name(name));

    let (python, deps) = if policy.is_uv() {
        if !project.is_uv_project() {
            return Err(Error::config("This hook only validates uv projects")
                .with_context(format!("{} has no [project] dependencies", project.path.display()))
                .with_suggestion("Use the poetry-* variant of this hook for poetry projects"));
        }
        let python = project.requires_python().map(|c| Dependency {
            name: "requires-python".to_string(),
            constraint: Some(c.to_string()),
        });
        (python, project.project_dependencies().unwrap_or_default())
    } else {
        let mut deps = project.poetry_dependencies().ok_or_else(|| {
            Error::config(format!(
                "{} has no [tool.poetry.dependencies] table",
                project.path.display()
            ))
            .with_suggestion("Use app-constraints or pkg-constraints for uv projects")
        })?;
        let python = deps
            .iter()
            .position(|d| d.name == "python")
            .map(|i| deps.remove(i));
        (python, deps)
    };

    let mut violations = Vec::new();

    if let Some(python) = python {
        let ok = python.constraint.as_deref().is_some_and(|c| policy.python_ok(c));
        if !ok {
            violations.push(incorrect(&project.path, &python, policy.python_guidance()));
        }
    }

    if let Some(rule) = policy.dependency_rule() {
        for dep in deps.iter().filter(|d| !is_ignored(&d.name)) {
            let ok = dep.constraint.as_deref().is_some_and(rule.accepts);
            if !ok {
                violations.push(incorrect(&project.path, dep, rule.guidance));
            }
        }
    }

    debug!(
        manifest = %project.path.display(),
        hook = policy.hook_id(),
        violations = violations.len(),
        "checked constraints"
    );
    Ok(violations)
}

fn locate_manifest(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::file_not_found(path));
        }
        return Ok(Some(path.to_path_buf()));
    }
    let cwd = env::current_dir()?;
    Ok(find_upward(&cwd, PYPROJECT))
}

pub fn run(options: &ConstraintOptions) -> HookReport {
    let mut report = HookReport::new();

    let manifest = match locate_manifest(options.pyproject.as_deref()) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => {
            info!(hook = options.policy.hook_id(), "no pyproject.toml found, nothing to check");
            return report;
        }
        Err(err) => {
            report.push_error(err);
            return report;
        }
    };

    report.record(
        PyProject::load(&manifest)
            .and_then(|project| check_manifest(&project, options.policy, &options.ignore)),
    );
    report
}
