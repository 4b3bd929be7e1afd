//! No boto3 in Airflow DAGs
//!
//! Direct boto3 in DAG files either runs as the Airflow worker instead of the
//! pod's scoped service account, or runs on every scheduler parse. Sanctioned
//! wrappers are excluded through the consumer's pre-commit `exclude`.

use crate::python::{collect_imports, PythonSource};
use crate::report::{HookReport, Violation};
use crate::suppression::{Marker, Suppressions};
use std::path::{Path, PathBuf};
use tatari_hooks_core::discovery::filter_by_extension;
use tatari_hooks_core::error::Result;

pub const MESSAGE: &str = "Direct boto3 import violation – use a BaseKubernetesPodOperator child class instead to fetch data from AWS, return the s3 prefix to xCom, and read the data from the xCom in the main task";

fn is_boto3(module: &str) -> bool {
    module == "boto3" || module.starts_with("boto3.")
}

pub fn check_file(path: &Path) -> Result<Vec<Violation>> {
    let source = PythonSource::read(path)?;

    let mut violations: Vec<Violation> = collect_imports(&source)
        .into_iter()
        .filter(|stmt| match &stmt.module {
            Some(module) => !stmt.relative && is_boto3(module),
            None => stmt.names.iter().any(|n| is_boto3(&n.name)),
        })
        .map(|stmt| Violation::on_line(path, stmt.line, MESSAGE))
        .collect();

    Suppressions::new(&source.text, &Marker::default()).retain_unsuppressed(&mut violations);
    Ok(violations)
}

/// Only `.py` files are checked
pub fn run(paths: &[PathBuf]) -> HookReport {
    let files = filter_by_extension(paths, &["py"]);
    HookReport::scan(files.as_slice(), check_file)
}
