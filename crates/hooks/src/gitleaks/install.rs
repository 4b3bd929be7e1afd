//! Verified download and cache install of the gitleaks binary
//!
//! The archive is hashed before anything touches the cache. Extraction
//! happens in a staging directory next to the target and the binary is
//! renamed into place, so the cache path either holds a complete executable
//! or nothing.

use super::platform::Platform;
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tatari_hooks_cli::progress;
use tatari_hooks_core::error::{Error, Result};
use tatari_hooks_core::process::{require_command, run_command};
use tatari_hooks_core::retry::{retry_operation, RetryConfig};
use tracing::{debug, info, warn};

/// Where release archives come from
pub trait ArchiveSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTPS download with bounded retries
pub struct HttpSource {
    client: Client,
    retry: RetryConfig,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("tatari-pre-commit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {}", e)).with_source(e))?;
        Ok(Self {
            client,
            retry: RetryConfig::download(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::network(format!("GET {}: {}", url, e)).with_source(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!("GET {}: HTTP {}", url, status)));
        }
        let bytes = response
            .bytes()
            .map_err(|e| Error::network(format!("Reading {}: {}", url, e)).with_source(e))?;
        Ok(bytes.to_vec())
    }
}

impl ArchiveSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let pb = progress::spinner(&format!("Downloading {}", url));
        let result = retry_operation(self.retry.clone(), "gitleaks download", || self.get(url));
        match &result {
            Ok(bytes) => progress::finish_success(&pb, &format!("Downloaded {} bytes", bytes.len())),
            Err(_) => progress::finish_error(&pb, "Download failed"),
        }
        result
    }
}

/// Everything needed to place one pinned binary in the cache
#[derive(Debug, Clone)]
pub struct InstallSpec {
    pub version: String,
    pub download_url: String,
    pub cache_root: PathBuf,
    pub platform: Platform,
    /// Lowercase hex sha256 of the release archive
    pub sha256: String,
}

impl InstallSpec {
    pub fn asset_name(&self) -> String {
        self.platform.asset_name(&self.version)
    }

    pub fn url(&self) -> String {
        format!(
            "{}/v{}/{}",
            self.download_url.trim_end_matches('/'),
            self.version,
            self.asset_name()
        )
    }

    /// `<cache_root>/gitleaks/<version>/<os>_<arch>/gitleaks[.exe]`
    pub fn binary_path(&self) -> PathBuf {
        self.cache_root
            .join("gitleaks")
            .join(&self.version)
            .join(self.platform.key())
            .join(self.platform.binary_name())
    }
}

/// Validate a pinned digest and normalize it to lowercase
pub fn normalize_sha256(digest: &str) -> Result<String> {
    let digest = digest.trim().to_ascii_lowercase();
    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::validation(format!(
            "Invalid sha256 digest '{}': expected 64 hex characters",
            digest
        )));
    }
    Ok(digest)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Regular, non-empty, and executable on Unix
pub fn is_valid_executable(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() || meta.len() == 0 {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Return the cached binary, downloading and verifying it first if needed
pub fn ensure_installed(spec: &InstallSpec, source: &dyn ArchiveSource) -> Result<PathBuf> {
    let target = spec.binary_path();
    if is_valid_executable(&target) {
        debug!(path = %target.display(), "using cached gitleaks");
        return Ok(target);
    }

    let url = spec.url();
    info!(url = %url, platform = %spec.platform, "installing gitleaks {}", spec.version);
    let archive = source.fetch(&url)?;

    let actual = sha256_hex(&archive);
    if actual != spec.sha256 {
        return Err(Error::integrity(&spec.asset_name(), &spec.sha256, &actual));
    }

    // Another installer may have finished while we downloaded
    if is_valid_executable(&target) {
        return Ok(target);
    }

    let parent = target
        .parent()
        .ok_or_else(|| Error::io(format!("Invalid cache path {}", target.display())))?;
    fs::create_dir_all(parent)
        .map_err(|e| Error::from(e).with_context(format!("Creating {}", parent.display())))?;

    let staging = tempfile::Builder::new()
        .prefix(".gitleaks-")
        .tempdir_in(parent)?;
    let extracted = extract(&archive, &spec.asset_name(), spec.platform.binary_name(), staging.path())?;
    make_executable(&extracted)?;

    if let Err(err) = fs::rename(&extracted, &target) {
        if is_valid_executable(&target) {
            debug!(error = %err, "lost install race, using existing binary");
            return Ok(target);
        }
        return Err(Error::from(err).with_context(format!("Installing {}", target.display())));
    }

    info!(path = %target.display(), "installed gitleaks");
    Ok(target)
}

fn extract(archive: &[u8], asset_name: &str, binary_name: &str, staging: &Path) -> Result<PathBuf> {
    let tar = require_command("tar")?;
    let archive_path = staging.join(asset_name);
    fs::write(&archive_path, archive)?;

    let out = staging.join("out");
    fs::create_dir_all(&out)?;

    let args = [
        OsStr::new("-xf"),
        archive_path.as_os_str(),
        OsStr::new("-C"),
        out.as_os_str(),
    ];
    let result = run_command(&tar, &args)?;
    if !result.success {
        return Err(Error::process(format!(
            "Failed to extract {}: {}",
            asset_name,
            result.combined_output().trim()
        )));
    }

    let binary = out.join(binary_name);
    if !binary.is_file() {
        warn!(archive = asset_name, "archive has no {} at its root", binary_name);
        return Err(Error::process(format!("{} does not contain {}", asset_name, binary_name)));
    }
    Ok(binary)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tatari_hooks_core::error::ErrorCode;

    /// Serves one in-memory archive and counts fetches
    pub(crate) struct StaticSource {
        pub archive: Vec<u8>,
        pub fetches: AtomicUsize,
    }

    impl ArchiveSource for StaticSource {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.archive.clone())
        }
    }

    /// A real tar.gz holding a `gitleaks` shell script
    pub(crate) fn fake_release(script: &str) -> StaticSource {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gitleaks"), script).unwrap();
        fs::write(dir.path().join("LICENSE"), "MIT\n").unwrap();
        let archive = dir.path().join("release.tar.gz");
        let status = Command::new("tar")
            .arg("-czf")
            .arg(&archive)
            .arg("-C")
            .arg(dir.path())
            .arg("gitleaks")
            .arg("LICENSE")
            .status()
            .unwrap();
        assert!(status.success());

        StaticSource {
            archive: fs::read(&archive).unwrap(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn spec_for(source: &StaticSource, cache_root: &Path) -> InstallSpec {
        InstallSpec {
            version: "8.18.4".to_string(),
            download_url: "https://example.invalid/releases".to_string(),
            cache_root: cache_root.to_path_buf(),
            platform: Platform::detect("linux", "x86_64").unwrap(),
            sha256: sha256_hex(&source.archive),
        }
    }

    #[test]
    fn test_paths_and_url() {
        let spec = InstallSpec {
            version: "8.18.4".to_string(),
            download_url: "https://github.com/gitleaks/gitleaks/releases/download/".to_string(),
            cache_root: PathBuf::from("/cache"),
            platform: Platform::detect("macos", "aarch64").unwrap(),
            sha256: "0".repeat(64),
        };
        assert_eq!(
            spec.url(),
            "https://github.com/gitleaks/gitleaks/releases/download/v8.18.4/gitleaks_8.18.4_darwin_arm64.tar.gz"
        );
        assert_eq!(
            spec.binary_path(),
            PathBuf::from("/cache/gitleaks/8.18.4/darwin_arm64/gitleaks")
        );
    }

    #[test]
    fn test_install_then_cache_hit() {
        let cache = tempfile::tempdir().unwrap();
        let source = fake_release("#!/bin/sh\nexit 0\n");
        let spec = spec_for(&source, cache.path());

        let first = ensure_installed(&spec, &source).unwrap();
        assert_eq!(first, spec.binary_path());
        assert!(is_valid_executable(&first));

        let second = ensure_installed(&spec, &source).unwrap();
        assert_eq!(first, second);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        // Staging directories are cleaned up
        let leftovers: Vec<_> = fs::read_dir(first.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".gitleaks-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_checksum_mismatch_installs_nothing() {
        let cache = tempfile::tempdir().unwrap();
        let source = fake_release("#!/bin/sh\nexit 0\n");
        let mut spec = spec_for(&source, cache.path());
        spec.sha256 = "ab".repeat(32);

        let err = ensure_installed(&spec, &source).unwrap_err();
        assert_eq!(err.code, ErrorCode::ChecksumMismatch);
        assert!(err.message.contains(&"ab".repeat(32)));
        assert!(err.message.contains(&sha256_hex(&source.archive)));
        assert!(!spec.binary_path().exists());
    }

    #[test]
    fn test_concurrent_installers_both_succeed() {
        let cache = tempfile::tempdir().unwrap();
        let source = fake_release("#!/bin/sh\nexit 0\n");
        let spec = spec_for(&source, cache.path());

        let results: Vec<Result<PathBuf>> = std::thread::scope(|s| {
            let a = s.spawn(|| ensure_installed(&spec, &source));
            let b = s.spawn(|| ensure_installed(&spec, &source));
            vec![a.join().unwrap(), b.join().unwrap()]
        });

        for result in results {
            assert_eq!(result.unwrap(), spec.binary_path());
        }
        assert!(is_valid_executable(&spec.binary_path()));
    }

    #[test]
    fn test_empty_or_non_executable_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitleaks");
        fs::write(&path, "").unwrap();
        assert!(!is_valid_executable(&path));

        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!is_valid_executable(&path));

        make_executable(&path).unwrap();
        assert!(is_valid_executable(&path));
    }

    #[test]
    fn test_normalize_sha256() {
        assert_eq!(normalize_sha256(&"AB".repeat(32)).unwrap(), "ab".repeat(32));
        assert!(normalize_sha256("abc").is_err());
        assert!(normalize_sha256(&"zz".repeat(32)).is_err());
    }
}
