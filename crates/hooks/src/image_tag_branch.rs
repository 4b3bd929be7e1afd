//! Image tag / branch constraint for Databricks operators
//!
//! `image_tag` and `branch` are resolved by the deployment, so DAGs must not
//! pass them to the Databricks operators explicitly.

use crate::python::{column_of, line_of, node_text, walk, PythonSource};
use crate::report::{HookReport, Violation};
use crate::suppression::{Marker, Suppressions};
use std::path::{Path, PathBuf};
use tatari_hooks_core::error::Result;
use tree_sitter::Node;

pub const OPERATORS: &[&str] = &[
    "DatabricksJobOperator",
    "DatabricksImageRepo",
    "DatabricksSharedOperator",
    "DatabricksNotebookOperator",
];

pub const KEYWORDS: &[&str] = &["image_tag", "branch"];

pub fn check_file(path: &Path) -> Result<Vec<Violation>> {
    let source = PythonSource::read(path)?;
    let text = source.text.as_str();
    let mut violations = Vec::new();

    walk(source.root(), |node| {
        if node.kind() != "call" {
            return;
        }
        let Some(operator) = node
            .child_by_field_name("function")
            .and_then(|f| operator_name(f, text))
        else {
            return;
        };
        let Some(arguments) = node.child_by_field_name("arguments") else {
            return;
        };

        let mut cursor = arguments.walk();
        for arg in arguments.named_children(&mut cursor) {
            if arg.kind() != "keyword_argument" {
                continue;
            }
            let Some(name) = arg.child_by_field_name("name").map(|n| node_text(n, text)) else {
                continue;
            };
            if KEYWORDS.contains(&name) {
                violations.push(Violation::at(
                    path,
                    line_of(arg),
                    column_of(arg),
                    format!("Flagged {} passed to {}", name, operator),
                ));
            }
        }
    });

    Suppressions::new(text, &Marker::default()).retain_unsuppressed(&mut violations);
    Ok(violations)
}

/// Operator class called directly or through a module attribute
fn operator_name<'a>(function: Node<'_>, text: &'a str) -> Option<&'a str> {
    let name = match function.kind() {
        "identifier" => node_text(function, text),
        "attribute" => node_text(function.child_by_field_name("attribute")?, text),
        _ => return None,
    };
    OPERATORS.contains(&name).then_some(name)
}

pub fn run(paths: &[PathBuf]) -> HookReport {
    HookReport::scan(paths, check_file)
}
