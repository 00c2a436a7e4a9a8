//! Error types with actionable diagnostics.
//!
//! All errors include contextual information to help users resolve issues
//! without needing to consult external documentation. Domain clamps and
//! missing pricing data are deliberately *not* errors: the estimators
//! degrade to advisories and "unavailable" results instead.

use thiserror::Error;

/// Result type alias for estimar operations.
pub type Result<T> = std::result::Result<T, EstimarError>;

/// Errors that can occur in the estimar library and CLI.
#[derive(Error, Debug)]
pub enum EstimarError {
    /// A configuration value is outside its declared domain.
    #[error("Invalid value for '{field}': {message}\n  → {suggestion}")]
    ConfigValue { field: String, message: String, suggestion: String },

    /// Unknown precision format identifier.
    #[error("Unknown precision format: {id}\n  → Run `estimar hardware` to list known formats")]
    UnknownPrecision { id: String },

    /// Unknown model preset identifier.
    #[error("Unknown model preset: {id}\n  → Run `estimar presets` to list known presets")]
    UnknownPreset { id: String },

    /// A persisted or shared configuration string could not be decoded.
    #[error("Could not decode shared configuration: {source}\n  → The link may be truncated or from an incompatible version")]
    ShareDecode {
        #[from]
        source: crate::share::ShareDecodeError,
    },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl EstimarError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Create a configuration value error.
    pub fn config_value(
        field: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::ConfigValue {
            field: field.into(),
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}
