//! Terminal output helpers for the Tatari pre-commit hooks
//!
//! Provides shared CLI functionality:
//! - Status messages on stderr
//! - Progress spinners for downloads

#![warn(missing_docs)]

pub mod output;
pub mod progress;
