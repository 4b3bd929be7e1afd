//! Hardcoded bucket detection
//!
//! Flags Tatari S3 bucket names (and optionally AWS region strings) written
//! as string literals, plus environment-conditional bucket selection such as
//! `if is_production(): bucket = "tatari-datalake-prod"`. Comments and bare
//! string statements (docstrings) are never scanned.

use crate::python::{
    column_of, in_bare_string_statement, line_of, node_text, string_value, walk, PythonSource,
};
use crate::report::{HookReport, Violation};
use crate::suppression::{Marker, Suppressions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tatari_hooks_core::config::BucketsConfig;
use tatari_hooks_core::error::Result;
use tree_sitter::Node;

const BUCKET_PATTERNS: &[&str] = &[
    // Datalake
    r"tatari-datalake(?:-(?:dev|staging|prod|test))?(?:-us-(?:east|west)-\d)?",
    // Scratch; prod uses the legacy `useast1` form
    r"tatari-scratch(?:-(?:dev|staging|prod|test))?(?:-us-(?:east|west)-\d)?",
    r"tatari-scratch-useast\d",
    // Temp (90-day expiration)
    r"tatari-datalake-temp-(?:dev|staging|prod)-us-(?:east|west)-\d",
    // Great Expectations
    r"tatari-gx-(?:dev|staging|prod)(?:-us-(?:east|west)-\d)?",
    // Airflow XCom
    r"tatari-xcom-(?:dev|staging|prod)(?:-us-(?:east|west)-\d)?",
    r"tatari-analysis-validation-temp-(?:dev|staging|prod)-us-(?:east|west)-\d",
    // Legacy production bucket
    r"tatari-data-science",
];

const REGION_PATTERNS: &[&str] = &[r"\bus-east-1\b", r"\bus-west-2\b", r"\buseast1\b", r"\buswest2\b"];

fn alternation(patterns: &[&str]) -> Regex {
    let joined = patterns
        .iter()
        .map(|p| format!("({})", p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&joined).unwrap()
}

pub static BUCKET_REGEX: Lazy<Regex> = Lazy::new(|| alternation(BUCKET_PATTERNS));
pub static REGION_REGEX: Lazy<Regex> = Lazy::new(|| alternation(REGION_PATTERNS));
pub static NOQA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)#\s*noqa:\s*hardcoded-bucket").unwrap());

pub const ENV_CHECK_FUNCTIONS: &[&str] = &["is_production", "is_staging", "is_prodlike", "is_dev"];

const CONDITIONAL_MESSAGE: &str = "Environment-conditional bucket logic detected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bucket,
    Region,
    Conditional,
}

/// A finding before it becomes a [`Violation`]
#[derive(Debug, Clone)]
pub struct Finding {
    pub line: usize,
    pub column: usize,
    pub kind: Kind,
    pub matched: String,
}

impl Finding {
    fn message(&self) -> String {
        match self.kind {
            Kind::Bucket => format!("Hardcoded bucket '{}' detected.", self.matched),
            Kind::Region => format!("Hardcoded region '{}' detected.", self.matched),
            Kind::Conditional => CONDITIONAL_MESSAGE.to_string(),
        }
    }

    /// Fix guidance for `--suggest`
    pub fn suggestion(&self) -> String {
        if self.kind == Kind::Conditional {
            return "\
Avoid: if is_production(): bucket = \"tatari-...\"
The bucket utilities handle environment detection automatically:

  from tatari_data_utils import EnvironmentDefinition
  bucket = EnvironmentDefinition.get_default_buckets_for_env().datalake"
                .to_string();
        }

        let m = self.matched.as_str();
        let accessor = if m.contains("datalake") && m.contains("temp") {
            ".temp or .temp['region']"
        } else if m.contains("datalake") {
            ".datalake"
        } else if m.contains("scratch") {
            ".scratch or .scratch['region']"
        } else if m.contains("gx") {
            ".gx"
        } else if m.contains("xcom") {
            ".xcom"
        } else {
            ".<bucket_type>"
        };

        format!(
            "\
Use centralized bucket utilities instead:

For PySpark/Databricks jobs:
  from tatari_pyspark.utils.buckets import DefaultBuckets
  bucket = DefaultBuckets.get_from_environment().scratch['us-east-1']

For other Python code:
  from tatari_data_utils import EnvironmentDefinition
  bucket = EnvironmentDefinition.get_default_buckets_for_env(){accessor}"
        )
    }
}

/// Options for one run
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketOptions {
    pub check_regions: bool,
    pub suggest: bool,
    pub warn_only: bool,
}

impl BucketOptions {
    pub fn from_config(config: &BucketsConfig) -> Self {
        Self {
            check_regions: config.check_regions,
            suggest: config.suggest,
            warn_only: false,
        }
    }
}

/// Bucket and region names inside string literals
pub fn find_literal_violations(source: &PythonSource, check_regions: bool) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut bucket_lines = HashSet::new();
    let mut regions = Vec::new();

    walk(source.root(), |node| {
        if node.kind() != "string_content" {
            return;
        }
        if node.parent().is_some_and(in_bare_string_statement) {
            return;
        }

        let base = node.start_byte();
        let content = source.text_of(node);
        for m in BUCKET_REGEX.find_iter(content) {
            let (line, column) = source.position(base + m.start());
            bucket_lines.insert(line);
            findings.push(Finding {
                line,
                column,
                kind: Kind::Bucket,
                matched: m.as_str().to_string(),
            });
        }
        if check_regions {
            for m in REGION_REGEX.find_iter(content) {
                let (line, column) = source.position(base + m.start());
                regions.push(Finding {
                    line,
                    column,
                    kind: Kind::Region,
                    matched: m.as_str().to_string(),
                });
            }
        }
    });

    // A region on a line that already names a bucket is part of that bucket
    findings.extend(regions.into_iter().filter(|r| !bucket_lines.contains(&r.line)));
    findings
}

fn is_env_check(node: Node<'_>, text: &str) -> bool {
    let node = unparenthesize(node);
    if node.kind() != "call" {
        return false;
    }
    let Some(function) = node.child_by_field_name("function") else {
        return false;
    };
    let name = match function.kind() {
        "identifier" => Some(function),
        "attribute" => function.child_by_field_name("attribute"),
        _ => None,
    };
    name.is_some_and(|n| ENV_CHECK_FUNCTIONS.contains(&node_text(n, text)))
}

fn unparenthesize(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn bucket_literal(node: Node<'_>, text: &str) -> Option<String> {
    string_value(node, text).filter(|value| BUCKET_REGEX.is_match(value))
}

/// Direct assignment or return of a bucket literal in a block
fn check_block(block: Node<'_>, text: &str, findings: &mut Vec<Finding>) {
    let mut cursor = block.walk();
    for stmt in block.named_children(&mut cursor) {
        let value = match stmt.kind() {
            "expression_statement" => stmt
                .named_child(0)
                .filter(|e| e.kind() == "assignment" && e.child_by_field_name("type").is_none())
                .and_then(|mut assignment| {
                    // `a = b = "..."` nests assignments on the right
                    while let Some(right) = assignment.child_by_field_name("right") {
                        if right.kind() != "assignment" {
                            return Some(right);
                        }
                        assignment = right;
                    }
                    None
                }),
            "return_statement" => stmt.named_child(0),
            _ => None,
        };

        if let Some(matched) = value.and_then(|v| bucket_literal(v, text)) {
            findings.push(Finding {
                line: line_of(stmt),
                column: column_of(stmt),
                kind: Kind::Conditional,
                matched,
            });
        }
    }
}

/// Bucket choices guarded by `is_production()`-style checks.
///
/// An `if` guarded by an env check has its body and a trailing `else` body
/// inspected; each `elif` is its own guard over its body and the clause that
/// follows it.
pub fn find_conditional_violations(source: &PythonSource) -> Vec<Finding> {
    let text = source.text.as_str();
    let mut findings = Vec::new();

    walk(source.root(), |node| match node.kind() {
        "if_statement" => {
            let mut cursor = node.walk();
            let alternatives: Vec<Node<'_>> = node
                .children_by_field_name("alternative", &mut cursor)
                .collect();

            let guards = std::iter::once((
                node.child_by_field_name("condition"),
                node.child_by_field_name("consequence"),
            ))
            .chain(alternatives.iter().filter(|a| a.kind() == "elif_clause").map(|a| {
                (a.child_by_field_name("condition"), a.child_by_field_name("consequence"))
            }));

            for (i, (condition, body)) in guards.enumerate() {
                if !condition.is_some_and(|c| is_env_check(c, text)) {
                    continue;
                }
                if let Some(body) = body {
                    check_block(body, text, &mut findings);
                }
                // The clause following guard `i` is its orelse
                if let Some(else_body) = alternatives
                    .get(i)
                    .filter(|a| a.kind() == "else_clause")
                    .and_then(|a| a.child_by_field_name("body"))
                {
                    check_block(else_body, text, &mut findings);
                }
            }
        }
        "conditional_expression" => {
            let Some(condition) = node.named_child(1) else {
                return;
            };
            if !is_env_check(condition, text) {
                return;
            }
            for branch in [node.named_child(0), node.named_child(2)].into_iter().flatten() {
                if let Some(matched) = bucket_literal(branch, text) {
                    findings.push(Finding {
                        line: line_of(node),
                        column: column_of(node),
                        kind: Kind::Conditional,
                        matched,
                    });
                }
            }
        }
        _ => {}
    });

    findings
}

/// Check one file, deduplicating on (line, column, kind)
pub fn check_file(path: &Path, options: &BucketOptions) -> Result<Vec<Violation>> {
    let source = PythonSource::read(path)?;
    Ok(check_source(path, &source, options))
}

pub fn check_source(path: &Path, source: &PythonSource, options: &BucketOptions) -> Vec<Violation> {
    let mut findings = find_literal_violations(source, options.check_regions);
    findings.extend(find_conditional_violations(source));

    let mut seen = HashSet::new();
    findings.retain(|f| seen.insert((f.line, f.column, f.kind)));
    findings.sort_by_key(|f| (f.line, f.column));

    let mut violations: Vec<Violation> = findings
        .iter()
        .map(|f| {
            let v = Violation::on_line(path, f.line, f.message());
            if options.suggest {
                v.with_detail(f.suggestion())
            } else {
                v
            }
        })
        .collect();

    Suppressions::new(&source.text, &Marker::Pattern(&NOQA_PATTERN)).retain_unsuppressed(&mut violations);
    violations
}

pub fn run(paths: &[PathBuf], options: &BucketOptions) -> HookReport {
    HookReport::scan(paths, |path| check_file(path, options)).warn_only(options.warn_only)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> PythonSource {
        PythonSource::parse(Path::new("t.py"), text).unwrap()
    }

    fn check(text: &str, options: BucketOptions) -> Vec<Violation> {
        check_source(Path::new("t.py"), &parse(text), &options)
    }

    #[test]
    fn test_bucket_regex_matches() {
        for name in [
            "tatari-datalake",
            "tatari-datalake-prod",
            "tatari-datalake-dev-us-west-2",
            "tatari-scratch-useast1",
            "tatari-datalake-temp-prod-us-east-1",
            "tatari-gx-staging",
            "tatari-xcom-prod-us-east-1",
            "tatari-analysis-validation-temp-dev-us-west-2",
            "tatari-data-science",
        ] {
            assert!(BUCKET_REGEX.is_match(name), "should match {name}");
        }
        for name in ["tatari-metrics", "my-datalake", "tatari-gx"] {
            assert!(!BUCKET_REGEX.is_match(name), "should not match {name}");
        }
    }

    #[test]
    fn test_region_regex() {
        for region in ["us-east-1", "us-west-2", "useast1", "uswest2"] {
            assert!(REGION_REGEX.is_match(region));
        }
        for region in ["eu-west-1", "us-east-2"] {
            assert!(!REGION_REGEX.is_match(region));
        }
    }

    #[test]
    fn test_literal_bucket_position() {
        let v = check("BUCKET = 'tatari-datalake-prod'\n", BucketOptions::default());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].line, Some(1));
        assert_eq!(v[0].message, "Hardcoded bucket 'tatari-datalake-prod' detected.");
    }

    #[test]
    fn test_comments_and_docstrings_skipped() {
        let text = "\
\"\"\"Writes to tatari-datalake-prod.\"\"\"
# bucket = 'tatari-datalake-prod'


def f():
    '''
    Uses tatari-scratch-dev.
    '''
    return 1
";
        assert!(check(text, BucketOptions::default()).is_empty());
    }

    #[test]
    fn test_noqa_marker() {
        let text = "a = 'tatari-datalake'  # noqa: hardcoded-bucket\nb = 'tatari-datalake'  # NOQA:hardcoded-bucket\nc = 'tatari-datalake'\n";
        let v = check(text, BucketOptions::default());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].line, Some(3));
    }

    #[test]
    fn test_regions_opt_in_and_skipped_on_bucket_lines() {
        let text = "region = 'us-east-1'\nb = 'tatari-datalake-prod-us-east-1'\n";
        assert_eq!(check(text, BucketOptions::default()).len(), 1);

        let v = check(text, BucketOptions { check_regions: true, ..Default::default() });
        let lines: Vec<_> = v.iter().map(|v| (v.line.unwrap(), v.message.clone())).collect();
        assert_eq!(
            lines,
            vec![
                (1, "Hardcoded region 'us-east-1' detected.".to_string()),
                (2, "Hardcoded bucket 'tatari-datalake-prod-us-east-1' detected.".to_string()),
            ]
        );
    }

    #[test]
    fn test_if_else_conditional() {
        let text = "\
if is_production():
    bucket = 'tatari-datalake-prod'
else:
    bucket = 'tatari-datalake-dev'
";
        let conditional = find_conditional_violations(&parse(text));
        let lines: Vec<_> = conditional.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_elif_chain_follows_guards() {
        let text = "\
def bucket():
    if env.is_staging():
        return 'tatari-scratch-staging'
    elif other():
        return 'tatari-scratch-dev'
    elif is_dev():
        return 'tatari-scratch-dev'
    else:
        return 'tatari-scratch-prod'
";
        let lines: Vec<_> = find_conditional_violations(&parse(text)).iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![3, 7, 9]);
    }

    #[test]
    fn test_ternary_conditional() {
        let text = "bucket = 'tatari-gx-prod' if is_prodlike() else 'tatari-gx-dev'\n";
        let findings = find_conditional_violations(&parse(text));
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.line == 1 && f.column == 10));

        let v = check(text, BucketOptions::default());
        let conditional = v.iter().filter(|v| v.message == CONDITIONAL_MESSAGE).count();
        assert_eq!(conditional, 1);
    }

    #[test]
    fn test_non_env_conditional_ignored() {
        let text = "if flag:\n    bucket = 'tatari-datalake'\n";
        assert!(find_conditional_violations(&parse(text)).is_empty());
    }

    #[test]
    fn test_suggestions() {
        let v = check(
            "a = 'tatari-scratch-dev'\n",
            BucketOptions { suggest: true, ..Default::default() },
        );
        let detail = v[0].detail.as_deref().unwrap();
        assert!(detail.contains(".scratch or .scratch['region']"));

        let finding = Finding {
            line: 1,
            column: 1,
            kind: Kind::Conditional,
            matched: String::new(),
        };
        assert!(finding.suggestion().starts_with("Avoid:"));
    }

    #[test]
    fn test_warn_only_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.py");
        std::fs::write(&path, "B = 'tatari-xcom-prod'\n").unwrap();

        let options = BucketOptions { warn_only: true, ..Default::default() };
        let report = run(&[path.clone()], &options);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.exit_code(), 0);

        let report = run(&[path], &BucketOptions::default());
        assert_eq!(report.exit_code(), 1);
    }
}
