//! Branch name validation
//!
//! Without configured types the branch must be a valid docker tag (slashes
//! allowed) so it can be used as an image tag. With types the branch must also
//! look like `{type}/{TICKET-ID}-{slug}`.

use crate::report::{HookReport, Violation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tatari_hooks_core::config::BranchNameConfig;
use tatari_hooks_core::error::{Error, Result};
use tatari_hooks_core::git::GitRepo;
use tracing::debug;

static DOCKER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_/][A-Za-z0-9._/-]*$").unwrap());

const SLUG: &str = r"[A-Za-z0-9][A-Za-z0-9._-]*";

/// Compiled branch rules
#[derive(Debug, Clone)]
pub struct BranchRules {
    types: Vec<String>,
    typed: Option<Regex>,
    max_length: usize,
}

impl BranchRules {
    pub fn new(types: &[String], ticket_pattern: &str, max_length: usize) -> Result<Self> {
        let typed = if types.is_empty() {
            None
        } else {
            let alternatives = types
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(
                "^(?:{})/(?:{})-{}$",
                alternatives, ticket_pattern, SLUG
            ))?)
        };

        Ok(Self {
            types: types.to_vec(),
            typed,
            max_length,
        })
    }

    pub fn from_config(config: &BranchNameConfig) -> Result<Self> {
        Self::new(&config.types, &config.ticket_pattern, config.max_length)
    }

    /// `None` when valid, otherwise the single message describing the expected shape
    pub fn validate(&self, branch: &str) -> Option<String> {
        let valid = !branch.is_empty()
            && branch.chars().count() <= self.max_length
            && DOCKER_TAG.is_match(branch)
            && self.typed.as_ref().is_none_or(|re| re.is_match(branch));

        if valid {
            return None;
        }

        Some(match &self.typed {
            None => format!(
                "branch name can't start with hyphen or period, can't be more than {} characters, \
                 and can only contain letters, numbers, and the special characters: ._-/",
                self.max_length
            ),
            Some(_) => format!(
                "branch name must look like {{type}}/{{TICKET-ID}}-{{slug}} with type one of: {} \
                 (e.g. {}/AB-123-add-thing), and be at most {} characters",
                self.types.join(", "),
                self.types[0],
                self.max_length
            ),
        })
    }
}

impl Default for BranchRules {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            typed: None,
            max_length: BranchNameConfig::default().max_length,
        }
    }
}

/// Branch under validation: explicit value, then git.
///
/// CI checkouts are shallow and often detached, so the explicit value
/// (`--branch` or `GITHUB_REF_NAME`) wins.
pub fn resolve_branch(explicit: Option<&str>) -> Result<String> {
    if let Some(branch) = explicit.map(str::trim).filter(|b| !b.is_empty()) {
        return Ok(branch.to_string());
    }
    let branch = GitRepo::open_current()?.resolve_branch()?;
    debug!(branch = %branch, "resolved branch from git");
    Ok(branch)
}

pub fn check(branch: &str, rules: &BranchRules) -> Vec<Violation> {
    rules
        .validate(branch)
        .map(|message| Violation::whole_file(Path::new(branch), message))
        .into_iter()
        .collect()
}

pub fn run(explicit: Option<&str>, rules: &BranchRules) -> HookReport {
    let mut report = HookReport::new();
    match resolve_branch(explicit) {
        Ok(branch) => report.record(Ok(check(&branch, rules))),
        Err(err) => report.push_error(err.with_context("Resolving the current branch")),
    }
    report
}

/// Rules from config, with `types`/`max_length` overrides
pub fn rules_with_overrides(
    config: &BranchNameConfig,
    types: Option<&[String]>,
    max_length: Option<usize>,
) -> Result<BranchRules> {
    let types = types.unwrap_or(&config.types);
    if types.iter().any(|t| t.trim().is_empty()) {
        return Err(Error::validation("Branch types must not be empty"));
    }
    BranchRules::new(
        types,
        &config.ticket_pattern,
        max_length.unwrap_or(config.max_length),
    )
}
