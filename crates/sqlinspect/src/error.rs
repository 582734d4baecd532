//! Error types for the inspection engine.
//!
//! Only failures that abort a statement are errors. Validation findings
//! and rollback refusals are data carried by [`crate::audit::AuditResult`]
//! and [`crate::rollback::Rollback`].

use std::path::PathBuf;

use sqlinspect_core::ParseError;

/// Errors raised by a live database connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The driver reported an error.
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// The query did not finish within the configured deadline.
    #[error("Query timed out after {0}s")]
    Timeout(u64),

    /// The server answered with rows of an unexpected shape.
    #[error("Unexpected result shape: {0}")]
    UnexpectedShape(String),
}

/// Errors that abort the inspection of a statement.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// Talking to the database failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The input could not be tokenized.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A stored table definition could not be parsed.
    #[error("Cannot parse definition of table '{table}': {reason}")]
    UnparsableDefinition {
        /// `schema.table` of the definition.
        table: String,
        /// Why parsing failed.
        reason: String,
    },

    /// IO error (reading SQL or configuration files).
    #[error("IO error on '{path}': {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for inspection operations.
pub type Result<T> = std::result::Result<T, InspectError>;
