//! Timer error types

use thiserror::Error;

/// Errors decoding persisted timer state
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Unsupported snapshot version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}
