//! `pyproject.toml` reading shared by the manifest hooks
//!
//! Supports both poetry (`[tool.poetry.dependencies]`) and PEP 621/uv
//! (`[project]`) layouts. Dependency order follows the file.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tatari_hooks_core::error::{Error, Result};
use toml::{Table, Value};

pub const PYPROJECT: &str = "pyproject.toml";

static VERSION_OP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(~=|\^|>=|<=|==|!=|<|>)[^;]*").unwrap());

/// One declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// `None` when no version constraint is given
    pub constraint: Option<String>,
}

/// Parse a PEP 508 requirement such as `requests[socks]>=2.31; python_version<'3.12'`
pub fn parse_requirement(spec: &str) -> Dependency {
    let spec = spec.split(';').next().unwrap_or("").trim();
    // `name @ url` pins a location, not a version
    let (name_part, constraint) = if let Some((name, _url)) = spec.split_once('@') {
        (name, None)
    } else {
        match VERSION_OP.find(spec) {
            Some(m) => (
                &spec[..m.start()],
                Some(m.as_str().trim().trim_end_matches(')').trim_end().to_string()),
            ),
            None => (spec, None),
        }
    };

    let name = name_part
        .split('[')
        .next()
        .unwrap_or("")
        .trim()
        .trim_end_matches('(')
        .trim()
        .to_string();

    Dependency { name, constraint }
}

/// Normalized distribution name for comparisons
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(['_', '.'], "-")
}

/// A parsed `pyproject.toml`
#[derive(Debug)]
pub struct PyProject {
    pub path: PathBuf,
    doc: Table,
}

impl PyProject {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::from(e).with_context(format!("Reading {}", path.display()))
        })?;
        Self::parse(path, &text)
    }

    /// Malformed TOML is a manifest error
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let doc: Table = toml::from_str(text)
            .map_err(|e| Error::manifest(format!("Malformed {}: {}", path.display(), e)))?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    fn table(&self, keys: &[&str]) -> Option<&Table> {
        keys.iter()
            .try_fold(&self.doc, |table, key| table.get(*key)?.as_table())
    }

    /// `[tool.poetry.dependencies]`, including `python`; `None` if absent
    pub fn poetry_dependencies(&self) -> Option<Vec<Dependency>> {
        let deps = self.table(&["tool", "poetry", "dependencies"])?;
        Some(
            deps.iter()
                .map(|(name, value)| Dependency {
                    name: name.clone(),
                    constraint: poetry_constraint(value),
                })
                .collect(),
        )
    }

    /// A uv/PEP 621 project declares `project.dependencies`
    pub fn is_uv_project(&self) -> bool {
        self.table(&["project"])
            .is_some_and(|p| p.contains_key("dependencies"))
    }

    /// `project.dependencies`; `None` if absent
    pub fn project_dependencies(&self) -> Option<Vec<Dependency>> {
        let deps = self.table(&["project"])?.get("dependencies")?.as_array()?;
        Some(
            deps.iter()
                .filter_map(Value::as_str)
                .map(parse_requirement)
                .collect(),
        )
    }

    pub fn requires_python(&self) -> Option<&str> {
        self.table(&["project"])?.get("requires-python")?.as_str()
    }

    /// Every declared dependency name from either layout
    pub fn dependency_names(&self) -> Vec<String> {
        self.poetry_dependencies()
            .into_iter()
            .chain(self.project_dependencies())
            .flatten()
            .map(|d| d.name)
            .collect()
    }
}

/// `dep = "^1.0"` or `dep = { version = "^1.0", ... }`
fn poetry_constraint(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Table(t) => t.get("version").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}
