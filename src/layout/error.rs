//! Error types for the layout engine
//!
//! Layout itself is best-effort and never fails; only configuration can be
//! rejected up front.

use thiserror::Error;

/// Errors that can occur while preparing a layout run
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A tunable with a value the geometry cannot work with
    #[error("invalid layout config '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl LayoutError {
    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
