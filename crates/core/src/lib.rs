//! Core utilities for the Tatari pre-commit hooks
//!
//! This crate provides shared functionality used by every hook:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Configuration**: `.tatari-hooks.toml` discovery and schema
//! - **Discovery**: Extension filtering and bounded upward file search
//! - **Git operations**: Branch resolution using command-line git
//! - **Process execution**: Running external tools and delegating to them
//! - **Retry**: Bounded retries with exponential backoff for network work
//!
//! # Example
//!
//! ```rust,no_run
//! use tatari_hooks_core::{config::Config, discovery};
//!
//! let config = Config::load(None).expect("invalid .tatari-hooks.toml");
//! let manifest = discovery::find_upward(std::path::Path::new("."), "pyproject.toml");
//! println!("{:?} {:?}", config.path, manifest);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod process;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::git::GitRepo;
    pub use crate::retry::{retry, retry_operation, RetryConfig};
}
