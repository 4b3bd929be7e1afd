//! Violation records and the shared printer
//!
//! Every hook funnels its findings into a [`HookReport`], which prints them to
//! stderr in the `path:line:col: message` shape and decides the exit code.

use owo_colors::{OwoColorize, Stream};
use std::fmt;
use std::path::{Path, PathBuf};
use tatari_hooks_core::error::{exit_codes, Error, Result};
use tracing::debug;

/// A single detected instance of a disallowed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    /// 1-based line, `None` for whole-file findings
    pub line: Option<usize>,
    /// 1-based column
    pub column: Option<usize>,
    pub message: String,
    /// Guidance printed indented under the violation
    pub detail: Option<String>,
}

impl Violation {
    /// Violation at a line and column
    pub fn at(path: &Path, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            line: Some(line),
            column: Some(column),
            message: message.into(),
            detail: None,
        }
    }

    /// Violation on a line without a meaningful column
    pub fn on_line(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            line: Some(line),
            column: None,
            message: message.into(),
            detail: None,
        }
    }

    /// Violation about the file as a whole
    pub fn whole_file(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            line: None,
            column: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// `path:line:col`, `path:line` or `path`
    pub fn location(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(col)) => format!("{}:{}:{}", self.path.display(), line, col),
            (Some(line), None) => format!("{}:{}", self.path.display(), line),
            _ => self.path.display().to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location(), self.message)
    }
}

/// Outcome of one hook run
#[derive(Debug, Default)]
pub struct HookReport {
    pub violations: Vec<Violation>,
    /// Tooling errors, kept apart from violations
    pub errors: Vec<Error>,
    /// Printed once after the violations, only when there are any
    pub footer: Option<String>,
    /// Violations are printed but do not fail the run
    pub warn_only: bool,
}

impl HookReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `check` on every path, accumulating violations and errors
    pub fn scan<P, F>(paths: &[P], mut check: F) -> Self
    where
        P: AsRef<Path>,
        F: FnMut(&Path) -> Result<Vec<Violation>>,
    {
        let mut report = Self::new();
        for path in paths {
            let path = path.as_ref();
            debug!(path = %path.display(), "checking");
            report.record(check(path));
        }
        report
    }

    /// Add the result of checking one input
    pub fn record(&mut self, result: Result<Vec<Violation>>) {
        match result {
            Ok(violations) => self.violations.extend(violations),
            Err(err) => self.errors.push(err),
        }
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn push_error(&mut self, err: Error) {
        self.errors.push(err);
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn warn_only(mut self, warn_only: bool) -> Self {
        self.warn_only = warn_only;
        self
    }

    /// No violations and no errors
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.errors.is_empty()
    }

    /// `1` on any tooling error, or on violations unless `warn_only`
    pub fn exit_code(&self) -> i32 {
        if !self.errors.is_empty() || (!self.violations.is_empty() && !self.warn_only) {
            exit_codes::FAILURE
        } else {
            exit_codes::SUCCESS
        }
    }

    /// Render everything that would be printed, without colors
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for v in &self.violations {
            lines.push(v.to_string());
            lines.extend(detail_lines(v));
        }
        if !self.violations.is_empty() {
            if let Some(footer) = &self.footer {
                lines.push(footer.clone());
            }
        }
        for err in &self.errors {
            lines.extend(error_lines(err, &err.label()));
        }
        lines.join("\n")
    }

    /// Print to stderr; nothing is printed for a clean run
    pub fn print(&self) {
        for v in &self.violations {
            let location = v.location();
            if self.warn_only {
                eprintln!(
                    "{}: {}",
                    location.if_supports_color(Stream::Stderr, |t| t.yellow()),
                    v.message
                );
            } else {
                eprintln!(
                    "{}: {}",
                    location.if_supports_color(Stream::Stderr, |t| t.bold()),
                    v.message
                );
            }
            for line in detail_lines(v) {
                eprintln!("{}", line);
            }
        }

        if !self.violations.is_empty() {
            if let Some(footer) = &self.footer {
                eprintln!("{}", footer);
            }
        }

        for err in &self.errors {
            let label = err.label();
            let label = label.if_supports_color(Stream::Stderr, |t| t.red()).to_string();
            for line in error_lines(err, &label) {
                eprintln!("{}", line);
            }
        }
    }

    /// Print and return the exit code
    pub fn finish(self) -> i32 {
        self.print();
        self.exit_code()
    }
}

fn detail_lines(v: &Violation) -> Vec<String> {
    v.detail
        .iter()
        .flat_map(|d| d.lines())
        .map(|l| if l.is_empty() { String::new() } else { format!("  {}", l) })
        .collect()
}

fn error_lines(err: &Error, label: &str) -> Vec<String> {
    let mut lines = vec![format!("{}: {}", label, err.message)];
    if let Some(ctx) = &err.context {
        lines.push(format!("  Context: {}", ctx));
    }
    if let Some(suggestion) = &err.suggestion {
        lines.push(format!("  Suggestion: {}", suggestion));
    }
    lines
}
