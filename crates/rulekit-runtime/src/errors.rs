//! Runtime error types.

use thiserror::Error;

/// Error returned by a [`crate::CapabilitySource`] query.
///
/// A failing query is never fatal: the failed source contributes zero
/// capability ids while the other source's results are still honored.
#[derive(Clone, Debug, Error)]
#[error("capability query failed: {0}")]
pub struct CapabilityError(pub String);

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Layered extraction failed (bad file contents or env values).
    #[error("Failed to load settings: {0}")]
    Extraction(#[from] figment::Error),

    /// No config home directory could be resolved.
    #[error("Could not resolve a config directory")]
    NoConfigDir,
}
