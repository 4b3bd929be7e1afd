use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use tatari_hooks_core::error::{Error, Result};

static SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A dotted identifier such as `split` or `pkg.sub.attr`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DottedPath {
    segments: Vec<String>,
}

impl DottedPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// More than one segment
    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn last(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Match a reference.
    ///
    /// `resolved` is the reference's statically resolved path, `attr` the
    /// final attribute name when the reference is an attribute access. A bare
    /// entry matches the attribute name; a qualified entry requires the
    /// resolved path to be identical.
    pub fn matches(&self, resolved: Option<&[String]>, attr: Option<&str>) -> bool {
        if self.is_qualified() {
            resolved.is_some_and(|r| r == self.segments.as_slice())
        } else {
            attr.is_some_and(|a| a == self.last())
        }
    }
}

impl FromStr for DottedPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<String> = s.trim().split('.').map(String::from).collect();
        if segments.iter().any(|seg| !SEGMENT.is_match(seg)) {
            return Err(Error::validation(format!("Invalid dotted identifier: '{}'", s)));
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// A disallowed target and what to use instead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisallowRule {
    pub target: DottedPath,
    pub replacement: String,
}

/// Ordered disallow-list; the first matching rule wins
#[derive(Debug, Clone, Default)]
pub struct DisallowList {
    rules: Vec<DisallowRule>,
}

impl DisallowList {
    /// Pair each disallowed entry with the replacement at the same position
    pub fn from_pairs<S: AsRef<str>>(disallowed: &[S], replacements: &[S]) -> Result<Self> {
        if disallowed.len() != replacements.len() {
            return Err(Error::validation(
                "Number of replacements does not match the number to check",
            )
            .with_context(format!(
                "{} disallowed, {} replacements",
                disallowed.len(),
                replacements.len()
            )));
        }

        let rules = disallowed
            .iter()
            .zip(replacements)
            .map(|(target, replacement)| {
                Ok(DisallowRule {
                    target: target.as_ref().parse()?,
                    replacement: replacement.as_ref().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[DisallowRule] {
        &self.rules
    }

    pub fn find(&self, resolved: Option<&[String]>, attr: Option<&str>) -> Option<&DisallowRule> {
        self.rules.iter().find(|rule| rule.target.matches(resolved, attr))
    }
}
