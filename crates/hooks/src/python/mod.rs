//! Python syntax-tree layer
//!
//! Structure-aware hooks parse each file with tree-sitter's Python grammar and
//! walk the tree for the node kinds they care about, so code that only appears
//! inside strings or comments never matches.

mod disallow;
mod imports;
mod source;

pub use disallow::{DisallowList, DisallowRule, DottedPath};
pub use imports::{collect_imports, resolve_reference, ImportStmt, ImportTable, ImportedName};
pub use source::{
    column_of, in_bare_string_statement, is_bare_string_statement, line_of, node_text,
    string_value, walk, PythonSource,
};
