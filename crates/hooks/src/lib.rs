//! Pre-commit hook implementations for Tatari repositories
//!
//! Every hook follows the same shape: filter the paths handed over by
//! pre-commit, check each one, collect violations and tooling errors in a
//! [`HookReport`], print, and exit with its code.
//!
//! - Python structure: forbidden imports, disallowed calls/attributes,
//!   Databricks `image_tag`/`branch` arguments, boto3 in DAGs, bucket names
//! - Text patterns: Dockerfile poetry pins, SQL generated columns
//! - Repository metadata: branch names, `pyproject.toml` constraints
//! - gitleaks: verified download and delegation

pub mod boto3_dags;
pub mod branch_name;
pub mod constraints;
pub mod disallowed;
pub mod dockerfile_poetry;
pub mod forbidden_imports;
pub mod generated_columns;
pub mod gitleaks;
pub mod hardcoded_buckets;
pub mod image_tag_branch;
pub mod manifest;
pub mod python;
pub mod report;
pub mod spark_buckets;
pub mod suppression;

pub use report::{HookReport, Violation};
pub use tatari_hooks_core::error::{exit_codes, Result};
