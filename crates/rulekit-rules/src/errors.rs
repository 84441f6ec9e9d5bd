//! Rule discovery error types.

use thiserror::Error;

/// A non-fatal error encountered while scanning a rules directory.
///
/// Discovery continues past these; the affected subtree simply contributes
/// zero entries.
#[derive(Clone, Debug, Error)]
#[error("{message}: {path}")]
pub struct DiscoveryError {
    /// Path of the directory or file that failed.
    pub path: String,
    /// Human-readable failure description.
    pub message: String,
}
