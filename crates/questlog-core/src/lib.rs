//! questlog-core - Shared functionality for the questlog tools
//!
//! Paths, persisted configuration and human-readable formatting.

pub mod config;
pub mod format;
pub mod paths;

pub use config::Config;
pub use paths::Paths;
