//! Error types for the tabdefine library.

use std::path::PathBuf;
use thiserror::Error;

/// A column name that cannot be bound to any type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameFormatError {
    /// The name is empty.
    #[error("column name is empty")]
    Empty,

    /// The name contains characters outside `[A-Za-z_]`.
    #[error("'{0}' does not conform to format [A-Za-z_]")]
    InvalidCharacters(String),
}

/// Why a single value was rejected by a type's predicate.
///
/// Produced and consumed inside the classifier; a `ValueFormatError` only
/// means "this type does not fit", it never aborts an inference run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueFormatError {
    /// The value is not written in plain decimal notation.
    #[error("'{0}' is not a number")]
    NotANumber(String),

    /// The number does not fit the target representation.
    #[error("'{0}' is out of range")]
    OutOfRange(String),

    /// Geometry parsing failed.
    #[error("invalid geometry: {0}")]
    Geometry(String),
}

/// Invalid catalog or reader configuration, raised at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The bounded-text length threshold must be positive.
    #[error("maximum varchar length must be greater than zero")]
    ZeroVarcharLength,

    /// No boolean tokens were configured.
    #[error("boolean token set is empty")]
    EmptyBooleanTokens,

    /// A token was configured as both truthy and falsy.
    #[error("boolean token '{0}' is both truthy and falsy")]
    AmbiguousBooleanToken(String),

    /// Unknown geometry kind.
    #[error("unknown geometry kind '{0}'")]
    UnknownGeometryKind(String),

    /// Any other invalid setting.
    #[error("{0}")]
    Invalid(String),
}

/// A column that could not be typed, as listed in [`SchemaError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedColumn {
    /// Source column name.
    pub name: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Errors raised while assembling a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// One or more columns matched no type and the policy is fail-fast.
    #[error("{} column(s) could not be typed: {}", .0.len(), format_unmatched(.0))]
    UnmatchedColumns(Vec<UnmatchedColumn>),
}

fn format_unmatched(columns: &[UnmatchedColumn]) -> String {
    columns
        .iter()
        .map(|c| format!("{} ({})", c.name, c.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by the table API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or the response not read.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status code other than the expected one.
    #[error("{method} {url} returned {actual}, expected {expected}: {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    /// The target table already exists and replacing it was not requested.
    #[error("table '{schema}.{table}' already exists")]
    TableExists { schema: String, table: String },

    /// The token cannot be used as a header value.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Main error type for tabdefine operations.
#[derive(Debug, Error)]
pub enum TabdefError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Schema assembly error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Table API error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error saving or loading a definition file.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for tabdefine operations.
pub type Result<T> = std::result::Result<T, TabdefError>;
