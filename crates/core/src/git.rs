//! Git operations using command-line git
//!
//! Uses command-line git to avoid dependency issues with git2/libgit2.

use crate::error::{Error, Result};
use crate::process::run_command_in_dir;
use std::path::{Path, PathBuf};

/// Git repository wrapper
pub struct GitRepo {
    workdir: PathBuf,
}

impl GitRepo {
    /// Open a git repository at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let result = run_command_in_dir("git", &["rev-parse", "--git-dir"], path)?;
        if !result.success {
            return Err(Error::not_a_git_repo());
        }

        let result = run_command_in_dir("git", &["rev-parse", "--show-toplevel"], path)?;
        let workdir = PathBuf::from(result.stdout.trim());

        Ok(Self { workdir })
    }

    /// Open the repository in the current directory
    pub fn open_current() -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        Self::open(&current_dir)
    }

    /// Get the current branch name (`HEAD` when detached)
    pub fn current_branch(&self) -> Result<String> {
        let result = run_command_in_dir(
            "git",
            &["rev-parse", "--abbrev-ref", "HEAD"],
            &self.workdir,
        )?;

        if !result.success {
            return Err(Error::git(format!(
                "Failed to resolve current branch: {}",
                result.stderr.trim()
            )));
        }

        Ok(result.stdout.trim().to_string())
    }

    /// Get the commit hash of HEAD
    pub fn head_commit(&self) -> Result<String> {
        let result = run_command_in_dir("git", &["rev-parse", "HEAD"], &self.workdir)?;

        if !result.success {
            return Err(Error::git(format!(
                "Failed to resolve HEAD: {}",
                result.stderr.trim()
            )));
        }

        Ok(result.stdout.trim().to_string())
    }

    /// Get the local branches containing a commit
    pub fn branches_containing(&self, commit: &str) -> Result<Vec<String>> {
        let result = run_command_in_dir(
            "git",
            &["branch", "--contains", commit],
            &self.workdir,
        )?;

        if !result.success {
            return Err(Error::git(format!(
                "Failed to list branches containing {}: {}",
                commit,
                result.stderr.trim()
            )));
        }

        Ok(parse_branch_list(&result.stdout))
    }

    /// Resolve the branch being committed to, even from a detached HEAD
    pub fn resolve_branch(&self) -> Result<String> {
        let branch = self.current_branch()?;
        if branch != "HEAD" {
            return Ok(branch);
        }

        let commit = self.head_commit()?;
        self.branches_containing(&commit)?
            .pop()
            .ok_or_else(|| Error::git(format!("No branch contains commit {}", commit)))
    }
}

/// Parse `git branch` output, dropping the current-branch marker
fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty() && !l.starts_with('('))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_branch_list() {
        let output = "  main\n* ABC-123/feature\n";
        assert_eq!(parse_branch_list(output), vec!["main", "ABC-123/feature"]);
    }

    #[test]
    fn test_parse_branch_list_skips_detached_marker() {
        let output = "* (HEAD detached at 1a2b3c4)\n  release/2024\n";
        assert_eq!(parse_branch_list(output), vec!["release/2024"]);
    }

    #[test]
    fn test_open_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        if run_command_in_dir("git", &["--version"], dir.path()).is_err() {
            return;
        }
        assert!(GitRepo::open(dir.path()).is_err());
    }
}
