//! Error types for member queries, property-or-field access and synthesis

use typescope_runtime::RuntimeError;

/// Reflection errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReflectError {
    /// Required input missing or blank
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single-result query matched zero or several members
    #[error("Expected exactly one {kind} {target}, found {found}")]
    Cardinality {
        /// Kind of member queried
        kind: &'static str,
        /// What was searched, e.g. `named 'Id' on 'Demo.Person'`
        target: String,
        /// Number of matches
        found: usize,
    },

    /// Member kind not handled by the operation
    #[error("Unsupported member kind: {0}")]
    UnsupportedKind(String),

    /// Read or write capability misused
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// View narrowed to the wrong member kind
    #[error("Invalid cast: {0}")]
    InvalidCast(String),

    /// Failure reported by the runtime
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Reflection result type
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid configuration JSON
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document parsed but holds invalid values
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ReflectError),
}

/// Reject blank names
pub(crate) fn require_name(argument: &str, value: &str) -> ReflectResult<()> {
    if value.trim().is_empty() {
        return Err(ReflectError::InvalidArgument(format!(
            "{} cannot be blank",
            argument
        )));
    }
    Ok(())
}
