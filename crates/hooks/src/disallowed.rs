//! Disallowed function calls, attributes and identifiers
//!
//! Backs three hooks: `disallowed-function-calls`, `disallowed-attributes` and
//! `disallowed-identifiers` (which picks the kind with `--identifier`).

use crate::python::{
    column_of, line_of, node_text, resolve_reference, walk, DisallowList, ImportTable, PythonSource,
};
use crate::report::{HookReport, Violation};
use crate::suppression::{Marker, Suppressions};
use std::fmt;
use std::path::{Path, PathBuf};
use tatari_hooks_core::error::Result;
use tree_sitter::Node;

/// Which construct the disallow-list applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    /// Call targets
    Function,
    /// Attribute accesses
    Attribute,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Function => write!(f, "function"),
            Identifier::Attribute => write!(f, "attribute"),
        }
    }
}

/// Check one file, returning violations ordered by position
pub fn check_file(path: &Path, identifier: Identifier, list: &DisallowList) -> Result<Vec<Violation>> {
    let source = PythonSource::read(path)?;
    let table = ImportTable::build(&source);
    let text = source.text.as_str();
    let mut violations = Vec::new();

    walk(source.root(), |node| {
        let target = match (identifier, node.kind()) {
            (Identifier::Function, "call") => node.child_by_field_name("function"),
            (Identifier::Attribute, "attribute") => Some(node),
            _ => None,
        };
        let Some(target) = target else {
            return;
        };

        let attr = final_attribute(target, text);
        let resolved = resolve_reference(target, text, &table);
        if let Some(rule) = list.find(resolved.as_deref(), attr) {
            violations.push(Violation::at(
                path,
                line_of(node),
                column_of(node),
                format!(
                    "Flagged {} {}. Replace with {}",
                    identifier, rule.target, rule.replacement
                ),
            ));
        }
    });

    Suppressions::new(text, &Marker::default()).retain_unsuppressed(&mut violations);
    violations.sort_by_key(|v| (v.line, v.column));
    Ok(violations)
}

/// Attribute name of an `attribute` node; bare names have none
fn final_attribute<'a>(node: Node<'_>, text: &'a str) -> Option<&'a str> {
    if node.kind() == "attribute" {
        node.child_by_field_name("attribute").map(|a| node_text(a, text))
    } else {
        None
    }
}

pub fn run(paths: &[PathBuf], identifier: Identifier, list: &DisallowList) -> HookReport {
    HookReport::scan(paths, |path| check_file(path, identifier, list))
}
