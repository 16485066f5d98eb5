//! Error types for the contextual configuration store.

use thiserror::Error;

/// Key model errors
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid key name: {0}")]
    InvalidName(String),
}

/// Errors raised by the contextual resolution core
#[derive(Debug, Error)]
pub enum ContextError {
    /// A contextual value was bound to a name that is absent from the keyset
    /// and its template declares no `default` metadata.
    #[error("No key at {name} and no default declared")]
    Configuration { name: String },

    /// A cached string could not be parsed as the declared value type.
    /// Raised at the moment of caching, never at read time.
    #[error("Cannot convert {value:?} at {name}: {reason}")]
    Conversion {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Key error: {0}")]
    Key(#[from] KeyError),
}

/// Backend and format plugin errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Payload not representable in this format: {0}")]
    UnsupportedPayload(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialize(err.to_string())
    }
}

/// Runtime configuration errors (logging setup, config file loading)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Parse(String),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

/// Per-key conflict report from the merge boundary
#[derive(Debug, Error)]
#[error("Merge conflict on {} key(s): {}", .conflicts.len(), .conflicts.join(", "))]
pub struct MergeConflict {
    /// Names present in both keysets with differing payloads
    pub conflicts: Vec<String>,
}
