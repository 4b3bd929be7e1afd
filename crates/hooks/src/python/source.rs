use std::fs;
use std::path::{Path, PathBuf};
use tatari_hooks_core::error::{Error, ErrorCode, Result, ResultExt};
use tree_sitter::{Node, Parser, Tree};

/// One parsed Python file
pub struct PythonSource {
    pub path: PathBuf,
    pub text: String,
    tree: Tree,
    line_starts: Vec<usize>,
}

impl PythonSource {
    /// Read and parse a file
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(Error::from)
            .context(format!("Reading {}", path.display()))?;
        Self::parse(path, text)
    }

    /// Parse source text; any syntax error in the tree is a tooling error
    pub fn parse(path: &Path, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::new(ErrorCode::Internal, format!("Python grammar mismatch: {e}")))?;

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| Error::parse(path, 1, "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root).map_or(1, line_of);
            return Err(Error::parse(path, line, "invalid Python syntax"));
        }

        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            text,
            tree,
            line_starts,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text_of(&self, node: Node<'_>) -> &str {
        node_text(node, &self.text)
    }

    /// 1-based (line, column) of a byte offset
    pub fn position(&self, byte: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= byte);
        let start = self.line_starts[line.saturating_sub(1)];
        (line, byte - start + 1)
    }
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut found = None;
    walk(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node);
        }
    });
    found
}

/// Pre-order traversal of every node below and including `node`
pub fn walk<'tree>(node: Node<'tree>, mut visit: impl FnMut(Node<'tree>)) {
    let mut cursor = node.walk();
    let mut depth = 0usize;

    loop {
        visit(cursor.node());

        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }

        loop {
            if depth == 0 {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            cursor.goto_parent();
            depth -= 1;
        }
    }
}

pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// 1-based line
pub fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// 1-based byte column
pub fn column_of(node: Node<'_>) -> usize {
    node.start_position().column + 1
}

/// Literal value of a string or implicitly concatenated string.
///
/// Strings with interpolations have no static value. Escape sequences are
/// returned as written.
pub fn string_value(node: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    match node.kind() {
        "string" => {
            let mut value = String::new();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "string_content" => value.push_str(node_text(child, source)),
                    "interpolation" => return None,
                    _ => {}
                }
            }
            Some(value)
        }
        "concatenated_string" => {
            let parts: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            parts.into_iter().try_fold(String::new(), |mut acc, part| {
                acc.push_str(&string_value(part, source)?);
                Some(acc)
            })
        }
        "parenthesized_expression" => node.named_child(0).and_then(|n| string_value(n, source)),
        _ => None,
    }
}

/// An expression statement consisting only of a string, e.g. a docstring
pub fn is_bare_string_statement(node: Node<'_>) -> bool {
    node.kind() == "expression_statement"
        && node.named_child_count() == 1
        && node
            .named_child(0)
            .is_some_and(|c| matches!(c.kind(), "string" | "concatenated_string"))
}

/// Whether a `string` node is (part of) a bare string statement
pub fn in_bare_string_statement(string: Node<'_>) -> bool {
    let mut current = string.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "concatenated_string" => current = parent.parent(),
            _ => return is_bare_string_statement(parent),
        }
    }
    false
}
