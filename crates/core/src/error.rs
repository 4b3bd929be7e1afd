//! Structured error handling with context and recovery suggestions
//!
//! Every hook reports two kinds of problems: violations (expected, user facing,
//! owned by the hooks crate) and tooling errors (this module). Tooling errors carry:
//! - An error code and category for the printed label
//! - Optional context and a recovery suggestion
//! - The underlying source error

use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // General errors (1xxx)
    Unknown = 1000,
    Internal = 1001,

    // IO errors (2xxx)
    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    InvalidConfigValue = 3003,
    ManifestError = 3004,

    // Git errors (4xxx)
    GitError = 4000,
    NotAGitRepo = 4001,

    // Process errors (5xxx)
    ProcessError = 5000,
    CommandNotFound = 5001,
    NetworkError = 5002,

    // Validation errors (6xxx)
    ValidationError = 6000,
    InvalidInput = 6001,

    // Source errors (7xxx)
    ParseError = 7000,
    SyntaxError = 7001,

    // Integrity errors (8xxx)
    IntegrityError = 8000,
    ChecksumMismatch = 8001,

    // Platform errors (9xxx)
    PlatformError = 9000,
    UnsupportedPlatform = 9001,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Git",
            5 => "Process",
            6 => "Validation",
            7 => "Parse",
            8 => "Integrity",
            9 => "Platform",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Label used when the error is printed next to hook output
    pub fn label(&self) -> String {
        format!("{} error {}", self.code.category(), self.code)
    }

    // Convenience constructors

    /// Generic IO failure
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IoError, message)
    }

    /// Input file does not exist
    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("File not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Check that the file exists and you have read permissions")
    }

    /// Invalid hook configuration
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Explicitly requested configuration file is missing
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .tatari-hooks.toml file or use --config to specify a path")
    }

    /// Malformed or unsupported dependency manifest
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ManifestError, message)
    }

    /// Git command failure
    pub fn git(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GitError, message)
    }

    /// Current directory is not inside a repository
    pub fn not_a_git_repo() -> Self {
        Self::new(ErrorCode::NotAGitRepo, "Not a git repository")
            .with_suggestion("Run this command from within a git repository")
    }

    /// External process failure
    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessError, message)
    }

    /// Required executable is not on PATH
    pub fn command_not_found(cmd: &str) -> Self {
        Self::new(
            ErrorCode::CommandNotFound,
            format!("Command not found: {}", cmd),
        )
        .with_suggestion(format!("Install {} and ensure it's in your PATH", cmd))
    }

    /// Download or transport failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }

    /// Invalid arguments or values
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Source file that cannot be turned into a syntax tree
    pub fn parse(path: impl AsRef<std::path::Path>, line: usize, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::SyntaxError,
            format!(
                "Could not parse {} (line {}): {}",
                path.as_ref().display(),
                line,
                message.into()
            ),
        )
        .with_suggestion("Fix the syntax error so the file can be checked")
    }

    /// Downloaded artifact does not match its pinned digest
    pub fn integrity(artifact: &str, expected: &str, actual: &str) -> Self {
        Self::new(
            ErrorCode::ChecksumMismatch,
            format!("sha256 mismatch for {artifact}: expected={expected} actual={actual}"),
        )
        .with_suggestion("The artifact was not installed. Verify the pinned checksum and retry")
    }

    /// OS/architecture combination without a known artifact
    pub fn unsupported_platform(os: &str, arch: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedPlatform,
            format!("Unsupported platform: {os}/{arch}"),
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes shared by every hook
pub mod exit_codes {
    /// No violations
    pub const SUCCESS: i32 = 0;
    /// Violations found or a handled tooling error
    pub const FAILURE: i32 = 1;
}

// Implement From for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::new(ErrorCode::InvalidConfigValue, format!("Regex error: {}", err))
            .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach context to the error branch
    fn context(self, context: impl Into<String>) -> Result<T>;
    /// Attach a recovery suggestion to the error branch
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::ChecksumMismatch.to_string(), "E8001");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::ManifestError.category(), "Configuration");
        assert_eq!(ErrorCode::SyntaxError.category(), "Parse");
        assert_eq!(ErrorCode::UnsupportedPlatform.category(), "Platform");
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::file_not_found("/path/to/file")
            .with_context("While loading configuration");

        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.is_some());
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_integrity_error_names_both_digests() {
        let err = Error::integrity("gitleaks.tar.gz", "aaaa", "bbbb");
        let rendered = err.to_string();

        assert!(rendered.contains("expected=aaaa"));
        assert!(rendered.contains("actual=bbbb"));
        assert_eq!(err.label(), "Integrity error E8001");
    }

    #[test]
    fn test_io_not_found_maps_code() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert_eq!(err.code, ErrorCode::FileNotFound);
    }
}
