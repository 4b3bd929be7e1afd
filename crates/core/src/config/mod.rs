//! Configuration loading and schema definitions
//!
//! Shared configuration types used by every hook.

mod loader;
mod schema;

pub use loader::{Config, CONFIG_FILE_NAME};
pub use schema::*;
