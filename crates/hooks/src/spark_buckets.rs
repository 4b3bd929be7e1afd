//! No non-Spark bucket helpers in Spark projects
//!
//! After the single-region consolidation the non-Spark bucket helpers still
//! default dev/staging to us-west-2, while the Spark helpers resolve to
//! us-east-1. Projects whose nearest `pyproject.toml` depends on Spark must
//! import the Spark variants.

use crate::manifest::{normalize_name, PyProject, PYPROJECT};
use crate::python::{collect_imports, PythonSource};
use crate::report::{HookReport, Violation};
use crate::suppression::{Marker, Suppressions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tatari_hooks_core::discovery::{filter_by_extension, find_upward};
use tatari_hooks_core::error::Result;
use tracing::debug;

pub static NOQA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)#\s*noqa:\s*non-spark-buckets").unwrap());

pub const SPARK_DEPENDENCIES: &[&str] = &[
    "python-tatari-pyspark",
    "python-tatari-ml-utils",
    "tatari-pyspark",
    "tatari-ml-utils",
    "pyspark",
];

const MESSAGE: &str = "Non-Spark bucket import detected in PySpark/ML project. \
                       Use 'tatari_data_utils.buckets_spark' instead.";

pub const FOOTER: &str = "\
Why this matters:
  - After single-region consolidation (Feb 2026), dev/staging moved from
    us-west-2 to us-east-1
  - The non-Spark version still defaults to us-west-2 for dev/staging
  - The Spark version (DefaultBucketsSpark) forces us-east-1 for all
    Databricks environments
  - Using the wrong version causes access errors and cross-region transfers

How to fix:

  Option 1 - Use tatari-pyspark wrapper (recommended):
    # Bad
    from tatari_data_utils import get_default_buckets_for_env
    # Good
    from tatari_pyspark.utils.buckets import DefaultBuckets
    buckets = DefaultBuckets.get_from_environment()

  Option 2 - Use tatari-ml-utils wrapper:
    # Bad
    from tatari_data_utils import get_default_buckets_for_env
    # Good
    from tatari_ml_utils.buckets import DefaultBuckets
    buckets = DefaultBuckets.get_from_environment()

  Option 3 - Use Spark version directly:
    # Bad
    from tatari_data_utils.buckets import EnvironmentDefinition
    # Good
    from tatari_data_utils.buckets_spark import EnvironmentDefinitionSpark

More info:
  https://tatari.atlassian.net/wiki/spaces/DATA/pages/2326528229

To suppress this check for specific lines (use sparingly):
    from tatari_data_utils import get_default_buckets_for_env  # noqa: non-spark-buckets";

/// Whether a manifest declares any Spark dependency
pub fn is_spark_project(project: &PyProject) -> bool {
    project
        .dependency_names()
        .iter()
        .map(|name| normalize_name(name))
        .any(|name| SPARK_DEPENDENCIES.contains(&name.as_str()))
}

/// Flag non-Spark bucket imports in one file, regardless of project type
pub fn check_source(path: &Path, source: &PythonSource) -> Vec<Violation> {
    let lines: Vec<&str> = source.text.lines().collect();

    let mut violations: Vec<Violation> = collect_imports(source)
        .into_iter()
        .filter(|stmt| {
            !stmt.relative
                && match stmt.module.as_deref() {
                    Some("tatari_data_utils.buckets") => true,
                    Some("tatari_data_utils") => stmt
                        .names
                        .iter()
                        .any(|n| n.name == "get_default_buckets_for_env"),
                    _ => false,
                }
        })
        .map(|stmt| {
            let import_line = lines.get(stmt.line - 1).map_or("", |l| l.trim());
            Violation::on_line(path, stmt.line, MESSAGE)
                .with_detail(format!("Import: {}", import_line))
        })
        .collect();

    Suppressions::new(&source.text, &Marker::Pattern(&NOQA_PATTERN))
        .retain_unsuppressed(&mut violations);
    violations
}

/// Spark classification of each manifest, computed once per run
#[derive(Debug, Default)]
pub struct SparkProjects {
    cache: HashMap<PathBuf, bool>,
}

impl SparkProjects {
    /// Whether the nearest manifest above `file` is a Spark project
    pub fn contains(&mut self, file: &Path) -> Result<bool> {
        let Some(manifest) = find_upward(file, PYPROJECT) else {
            debug!(path = %file.display(), "no pyproject.toml found");
            return Ok(false);
        };
        if let Some(&spark) = self.cache.get(&manifest) {
            return Ok(spark);
        }

        // Cache first so a malformed manifest is reported once
        self.cache.insert(manifest.clone(), false);
        let spark = is_spark_project(&PyProject::load(&manifest)?);
        debug!(manifest = %manifest.display(), spark, "classified project");
        self.cache.insert(manifest, spark);
        Ok(spark)
    }
}

pub fn check_file(path: &Path, projects: &mut SparkProjects) -> Result<Vec<Violation>> {
    if !projects.contains(path)? {
        return Ok(Vec::new());
    }
    let source = PythonSource::read(path)?;
    Ok(check_source(path, &source))
}

/// Only `.py` files are checked
pub fn run(paths: &[PathBuf]) -> HookReport {
    let files = filter_by_extension(paths, &["py"]);
    let mut projects = SparkProjects::default();
    HookReport::scan(files.as_slice(), |path| check_file(path, &mut projects)).with_footer(FOOTER)
}
