//! Release asset naming per OS/architecture

use std::fmt;
use tatari_hooks_core::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    Arm64,
    Armv7,
    X32,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
            Self::Armv7 => "armv7",
            Self::X32 => "x32",
        }
    }
}

/// OS/architecture pair used for asset names and checksum keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// Platform of the running process
    pub fn current() -> Result<Self> {
        Self::detect(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map Rust's `consts::OS`/`consts::ARCH` names
    pub fn detect(os: &str, arch: &str) -> Result<Self> {
        let os_kind = match os {
            "linux" => Os::Linux,
            "macos" => Os::Darwin,
            "windows" => Os::Windows,
            _ => return Err(Error::unsupported_platform(os, arch)),
        };
        let arch_kind = match arch {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            "arm" => Arch::Armv7,
            "x86" => Arch::X32,
            _ => return Err(Error::unsupported_platform(os, arch)),
        };
        Ok(Self {
            os: os_kind,
            arch: arch_kind,
        })
    }

    /// Checksum table key, e.g. `linux_x64`
    pub fn key(&self) -> String {
        format!("{}_{}", self.os.as_str(), self.arch.as_str())
    }

    pub fn archive_extension(&self) -> &'static str {
        match self.os {
            Os::Windows => "zip",
            _ => "tar.gz",
        }
    }

    pub fn asset_name(&self, version: &str) -> String {
        format!(
            "gitleaks_{}_{}.{}",
            version,
            self.key(),
            self.archive_extension()
        )
    }

    pub fn binary_name(&self) -> &'static str {
        match self.os {
            Os::Windows => "gitleaks.exe",
            _ => "gitleaks",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tatari_hooks_core::error::ErrorCode;

    #[test]
    fn test_detect_known_platforms() {
        let linux = Platform::detect("linux", "x86_64").unwrap();
        assert_eq!(linux.key(), "linux_x64");
        assert_eq!(linux.asset_name("8.18.4"), "gitleaks_8.18.4_linux_x64.tar.gz");
        assert_eq!(linux.binary_name(), "gitleaks");

        let mac = Platform::detect("macos", "aarch64").unwrap();
        assert_eq!(mac.key(), "darwin_arm64");

        let win = Platform::detect("windows", "x86_64").unwrap();
        assert_eq!(win.asset_name("8.18.4"), "gitleaks_8.18.4_windows_x64.zip");
        assert_eq!(win.binary_name(), "gitleaks.exe");

        assert_eq!(Platform::detect("linux", "arm").unwrap().key(), "linux_armv7");
    }

    #[test]
    fn test_unknown_platform_is_error() {
        let err = Platform::detect("freebsd", "x86_64").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedPlatform);
        assert!(Platform::detect("linux", "riscv64").is_err());
    }

    #[test]
    fn test_current_platform_when_supported() {
        if let Ok(platform) = Platform::current() {
            assert!(!platform.key().is_empty());
        }
    }
}
