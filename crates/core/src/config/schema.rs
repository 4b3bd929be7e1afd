//! Configuration schema definitions
//!
//! Every section is optional; command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub branch_name: BranchNameConfig,

    #[serde(default)]
    pub buckets: BucketsConfig,

    #[serde(default)]
    pub gitleaks: GitleaksConfig,
}

/// Branch name validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchNameConfig {
    /// Allowed branch types; empty keeps the docker-tag rule
    #[serde(default)]
    pub types: Vec<String>,

    /// Ticket identifier pattern used by the typed rule
    #[serde(default = "default_ticket_pattern")]
    pub ticket_pattern: String,

    /// Maximum branch name length
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

impl Default for BranchNameConfig {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            ticket_pattern: default_ticket_pattern(),
            max_length: default_max_length(),
        }
    }
}

fn default_ticket_pattern() -> String {
    r"[A-Z][A-Z0-9]+-\d+".to_string()
}

fn default_max_length() -> usize {
    50
}

/// Hardcoded bucket detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BucketsConfig {
    /// Also flag hardcoded region strings
    #[serde(default)]
    pub check_regions: bool,

    /// Print fix suggestions under each violation
    #[serde(default)]
    pub suggest: bool,
}

/// Gitleaks wrapper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitleaksConfig {
    /// Pinned gitleaks release
    #[serde(default = "default_gitleaks_version")]
    pub version: String,

    /// Release download root
    #[serde(default = "default_download_url")]
    pub download_url: String,

    /// Cache root override
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Arguments passed to the binary
    #[serde(default = "default_gitleaks_args")]
    pub args: Vec<String>,

    /// Expected archive sha256 per platform key (e.g. `linux_x64`)
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

impl Default for GitleaksConfig {
    fn default() -> Self {
        Self {
            version: default_gitleaks_version(),
            download_url: default_download_url(),
            cache_dir: None,
            args: default_gitleaks_args(),
            checksums: BTreeMap::new(),
        }
    }
}

fn default_gitleaks_version() -> String {
    "8.18.4".to_string()
}

fn default_download_url() -> String {
    "https://github.com/gitleaks/gitleaks/releases/download".to_string()
}

fn default_gitleaks_args() -> Vec<String> {
    ["protect", "--staged", "--redact", "--verbose"]
        .into_iter()
        .map(String::from)
        .collect()
}
