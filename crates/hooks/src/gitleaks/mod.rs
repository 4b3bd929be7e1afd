//! gitleaks wrapper
//!
//! Installs a pinned, checksum-verified gitleaks release into the user cache
//! and delegates to it. No digests are built in; pins come from
//! `[gitleaks.checksums]` in `.tatari-hooks.toml` or `--checksum`.

pub mod install;
pub mod platform;

pub use install::{ensure_installed, is_valid_executable, sha256_hex, ArchiveSource, HttpSource, InstallSpec};
pub use platform::{Arch, Os, Platform};

use crate::report::{HookReport, Violation};
use std::path::{Path, PathBuf};
use tatari_hooks_core::config::GitleaksConfig;
use tatari_hooks_core::error::{Error, Result};
use tatari_hooks_core::process::run_command_streaming;
use tracing::debug;

const CACHE_DIR_NAME: &str = "tatari-hooks";

/// Command-line overrides for the wrapper
#[derive(Debug, Clone, Default)]
pub struct GitleaksOptions {
    pub cache_dir: Option<PathBuf>,
    pub version: Option<String>,
    /// sha256 for the current platform's archive
    pub checksum: Option<String>,
    /// Appended after the configured arguments
    pub extra_args: Vec<String>,
}

/// `<user cache dir>/tatari-hooks`
pub fn default_cache_root() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join(CACHE_DIR_NAME))
        .ok_or_else(|| {
            Error::config("Could not determine the user cache directory")
                .with_suggestion("Pass --cache-dir or set TATARI_HOOKS_CACHE_DIR")
        })
}

/// Merge config and overrides into one install for `platform`
pub fn resolve_spec(
    config: &GitleaksConfig,
    options: &GitleaksOptions,
    platform: Platform,
) -> Result<InstallSpec> {
    let version = options
        .version
        .clone()
        .unwrap_or_else(|| config.version.clone());
    let version = version.trim_start_matches('v').to_string();

    let cache_root = match options.cache_dir.clone().or_else(|| config.cache_dir.clone()) {
        Some(dir) => dir,
        None => default_cache_root()?,
    };

    let key = platform.key();
    let pinned = options
        .checksum
        .as_deref()
        .or_else(|| config.checksums.get(&key).map(String::as_str))
        .ok_or_else(|| {
            Error::config(format!("No sha256 pinned for gitleaks {} on {}", version, key))
                .with_suggestion(format!(
                    "Add {} = \"<sha256>\" under [gitleaks.checksums] in .tatari-hooks.toml, or pass --checksum",
                    key
                ))
        })?;

    Ok(InstallSpec {
        version,
        download_url: config.download_url.clone(),
        cache_root,
        platform,
        sha256: install::normalize_sha256(pinned)?,
    })
}

fn delegate(binary: &Path, args: &[String]) -> Result<Vec<Violation>> {
    debug!(binary = %binary.display(), ?args, "running gitleaks");
    let code = run_command_streaming(binary, args)?;
    if code == 0 {
        return Ok(Vec::new());
    }
    Ok(vec![Violation::whole_file(
        Path::new("gitleaks"),
        format!("gitleaks exited with status {}", code),
    )])
}

fn arguments(config: &GitleaksConfig, options: &GitleaksOptions) -> Vec<String> {
    config
        .args
        .iter()
        .chain(&options.extra_args)
        .cloned()
        .collect()
}

/// Install (if needed) from `source` and run gitleaks
pub fn run_with(
    config: &GitleaksConfig,
    options: &GitleaksOptions,
    platform: Platform,
    source: &dyn ArchiveSource,
) -> HookReport {
    let mut report = HookReport::new();
    report.record(
        resolve_spec(config, options, platform)
            .and_then(|spec| ensure_installed(&spec, source))
            .and_then(|binary| delegate(&binary, &arguments(config, options))),
    );
    report
}

pub fn run(config: &GitleaksConfig, options: &GitleaksOptions) -> HookReport {
    let setup = Platform::current().and_then(|platform| Ok((platform, HttpSource::new()?)));
    match setup {
        Ok((platform, source)) => run_with(config, options, platform, &source),
        Err(err) => {
            let mut report = HookReport::new();
            report.push_error(err);
            report
        }
    }
}
