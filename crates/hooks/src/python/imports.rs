use super::source::{column_of, line_of, node_text, walk, PythonSource};
use std::collections::HashMap;
use tree_sitter::Node;

/// One name bound by an import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// Dotted name as written after `import`
    pub name: String,
    pub alias: Option<String>,
    pub line: usize,
    pub column: usize,
}

/// An `import …` or `from … import …` statement anywhere in the file
#[derive(Debug, Clone)]
pub struct ImportStmt {
    /// Module of a `from` import as written, dots included for relative ones
    pub module: Option<String>,
    pub relative: bool,
    pub names: Vec<ImportedName>,
    pub line: usize,
    pub column: usize,
}

impl ImportStmt {
    pub fn is_from(&self) -> bool {
        self.module.is_some()
    }

    /// Fully qualified module path of an imported name
    pub fn qualified(&self, name: &ImportedName) -> String {
        match &self.module {
            Some(module) if module.ends_with('.') => format!("{}{}", module, name.name),
            Some(module) => format!("{}.{}", module, name.name),
            None => name.name.clone(),
        }
    }
}

/// Collect every import statement, in source order
pub fn collect_imports(source: &PythonSource) -> Vec<ImportStmt> {
    let mut imports = Vec::new();
    walk(source.root(), |node| match node.kind() {
        "import_statement" => imports.push(plain_import(node, &source.text)),
        "import_from_statement" => imports.push(from_import(node, &source.text)),
        _ => {}
    });
    imports
}

fn plain_import(node: Node<'_>, text: &str) -> ImportStmt {
    ImportStmt {
        module: None,
        relative: false,
        names: imported_names(node, text),
        line: line_of(node),
        column: column_of(node),
    }
}

fn from_import(node: Node<'_>, text: &str) -> ImportStmt {
    let module_node = node.child_by_field_name("module_name");
    let relative = module_node.is_some_and(|m| m.kind() == "relative_import");
    ImportStmt {
        module: module_node.map(|m| node_text(m, text).to_string()),
        relative,
        names: imported_names(node, text),
        line: line_of(node),
        column: column_of(node),
    }
}

fn imported_names(node: Node<'_>, text: &str) -> Vec<ImportedName> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|child| {
            let (name, alias) = match child.kind() {
                "dotted_name" => (child, None),
                "aliased_import" => (
                    child.child_by_field_name("name")?,
                    child.child_by_field_name("alias"),
                ),
                _ => return None,
            };
            Some(ImportedName {
                name: node_text(name, text).to_string(),
                alias: alias.map(|a| node_text(a, text).to_string()),
                line: line_of(child),
                column: column_of(child),
            })
        })
        .collect()
}

/// Local name → dotted path bound by the file's imports
#[derive(Debug, Default)]
pub struct ImportTable {
    bindings: HashMap<String, Vec<String>>,
}

impl ImportTable {
    /// Relative imports are not resolvable and bind nothing.
    pub fn from_imports(imports: &[ImportStmt]) -> Self {
        let mut bindings = HashMap::new();
        for stmt in imports.iter().filter(|s| !s.relative) {
            for name in &stmt.names {
                let segments: Vec<String> = stmt.qualified(name).split('.').map(String::from).collect();
                match (&name.alias, stmt.is_from()) {
                    (Some(alias), _) => {
                        bindings.insert(alias.clone(), segments);
                    }
                    // `from m import n` binds `n`
                    (None, true) => {
                        bindings.insert(name.name.clone(), segments);
                    }
                    // `import a.b` binds only `a`
                    (None, false) => {
                        let head = segments[0].clone();
                        bindings.insert(head.clone(), vec![head]);
                    }
                }
            }
        }
        Self { bindings }
    }

    pub fn build(source: &PythonSource) -> Self {
        Self::from_imports(&collect_imports(source))
    }

    /// Dotted path of a local name; unknown names resolve to themselves
    pub fn resolve(&self, name: &str) -> Vec<String> {
        self.bindings
            .get(name)
            .cloned()
            .unwrap_or_else(|| vec![name.to_string()])
    }
}

/// Statically resolved dotted path of an identifier or attribute chain.
///
/// Chains rooted in anything other than a name (calls, subscripts) have no
/// static path.
pub fn resolve_reference(node: Node<'_>, text: &str, table: &ImportTable) -> Option<Vec<String>> {
    match node.kind() {
        "identifier" => Some(table.resolve(node_text(node, text))),
        "attribute" => {
            let mut path = resolve_reference(node.child_by_field_name("object")?, text, table)?;
            path.push(node_text(node.child_by_field_name("attribute")?, text).to_string());
            Some(path)
        }
        "parenthesized_expression" => resolve_reference(node.named_child(0)?, text, table),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(text: &str) -> PythonSource {
        PythonSource::parse(Path::new("t.py"), text).unwrap()
    }

    #[test]
    fn test_collect_imports_forms() {
        let src = parse(
            "import os\nimport boto3.session as bs\nfrom a.b import c, d as e\nfrom . import local\n\ndef f():\n    import json\n",
        );
        let imports = collect_imports(&src);
        assert_eq!(imports.len(), 5);

        assert_eq!(imports[0].names[0].name, "os");
        assert_eq!(imports[1].names[0].name, "boto3.session");
        assert_eq!(imports[1].names[0].alias.as_deref(), Some("bs"));
        assert_eq!(imports[2].module.as_deref(), Some("a.b"));
        assert_eq!(imports[2].qualified(&imports[2].names[1]), "a.b.d");
        assert!(imports[3].relative);
        assert_eq!(imports[4].line, 7);
    }

    #[test]
    fn test_import_table_resolution() {
        let src = parse("import a.b\nimport x.y as xy\nfrom m import n\nfrom m.k import n2 as d\n");
        let table = ImportTable::build(&src);

        assert_eq!(table.resolve("a"), vec!["a"]);
        assert_eq!(table.resolve("xy"), vec!["x", "y"]);
        assert_eq!(table.resolve("n"), vec!["m", "n"]);
        assert_eq!(table.resolve("d"), vec!["m", "k", "n2"]);
        assert_eq!(table.resolve("unknown"), vec!["unknown"]);
    }

    #[test]
    fn test_resolve_reference_through_alias() {
        let src = parse("import pandas as pd\npd.io.read_csv\nget().attr\n");
        let table = ImportTable::build(&src);

        let mut resolved = Vec::new();
        walk(src.root(), |n| {
            if n.kind() == "expression_statement" {
                if let Some(expr) = n.named_child(0) {
                    resolved.push(resolve_reference(expr, &src.text, &table));
                }
            }
        });

        assert_eq!(
            resolved[0],
            Some(vec!["pandas".to_string(), "io".to_string(), "read_csv".to_string()])
        );
        assert_eq!(resolved[1], None);
    }
}
