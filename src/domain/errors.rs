//! Domain error types
//!
//! This module defines the error hierarchy for Octograph. Errors coming from the
//! provider API and from the time-series database are kept in their own enums so
//! the resilience layer can classify them without looking at HTTP client types.

use std::time::Duration;
use thiserror::Error;

/// Main Octograph error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum OctographError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider API errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Time-series database errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A raw reading carried a unit the stream kind does not understand
    #[error("Unit mismatch for {kind}: unrecognized unit '{unit}'")]
    UnitMismatch { kind: String, unit: String },

    /// A raw reading that cannot be turned into a point
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    /// State management errors
    #[error("State management error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// The operation was abandoned because shutdown was requested
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

/// Provider API errors
///
/// Errors that occur when talking to the utility provider.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credential rejected (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Meter, account or tariff does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit response (429)
    #[error("Rate limit exceeded{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (other 4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Failed to reach the provider
    #[error("Failed to connect to provider: {0}")]
    ConnectionFailed(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Response body could not be decoded
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),
}

/// Time-series database errors
///
/// Errors that occur when writing to or querying InfluxDB.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Token or credentials rejected (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Retryable write failure (network, 5xx, 429)
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Malformed line or field type conflict (400/413/422)
    #[error("Schema rejected: {0}")]
    SchemaRejected(String),

    /// Failed to reach the database
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Query failed or returned something unreadable
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

/// Coarse classification used by the resilience layer and cycle reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credential rejected
    Auth,
    /// Meter/account/tariff does not exist
    NotFound,
    /// Network failure, timeout, 5xx or rate limit on the provider side
    Transient,
    /// Retryable database write failure
    Write,
    /// Database rejected the batch
    Schema,
    /// Unrecognized unit on a raw reading
    UnitMismatch,
    /// Bad configuration
    Configuration,
    /// Watermark persistence failure
    State,
    /// Undecodable or otherwise invalid data
    Invalid,
    /// Shutdown requested
    Cancelled,
}

impl ErrorKind {
    /// Whether an error of this kind should be retried with backoff
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient | ErrorKind::Write)
    }

    /// Stable lowercase label for structured logs
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transient => "transient",
            ErrorKind::Write => "write",
            ErrorKind::Schema => "schema",
            ErrorKind::UnitMismatch => "unit_mismatch",
            ErrorKind::Configuration => "configuration",
            ErrorKind::State => "state",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProviderError {
    /// Classify this provider error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::AuthenticationFailed(_) => ErrorKind::Auth,
            ProviderError::NotFound(_) => ErrorKind::NotFound,
            ProviderError::RateLimited { .. }
            | ProviderError::ServerError { .. }
            | ProviderError::ConnectionFailed(_)
            | ProviderError::Timeout(_) => ErrorKind::Transient,
            ProviderError::ClientError { .. } | ProviderError::InvalidResponse(_) => {
                ErrorKind::Invalid
            }
        }
    }
}

impl DatabaseError {
    /// Classify this database error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::AuthenticationFailed(_) => ErrorKind::Auth,
            DatabaseError::WriteFailed(_)
            | DatabaseError::ConnectionFailed(_)
            | DatabaseError::Timeout(_) => ErrorKind::Write,
            DatabaseError::SchemaRejected(_) => ErrorKind::Schema,
            DatabaseError::QueryFailed(_) => ErrorKind::State,
        }
    }
}

impl OctographError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OctographError::Configuration(_) => ErrorKind::Configuration,
            OctographError::Provider(e) => e.kind(),
            OctographError::Database(e) => e.kind(),
            OctographError::UnitMismatch { .. } => ErrorKind::UnitMismatch,
            OctographError::InvalidReading(_) | OctographError::Serialization(_) => {
                ErrorKind::Invalid
            }
            OctographError::State(_) | OctographError::Io(_) => ErrorKind::State,
            OctographError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Whether the resilience layer should retry the failed operation
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Server-requested delay before the next attempt, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            OctographError::Provider(ProviderError::RateLimited { retry_after }) => *retry_after,
            _ => None,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for OctographError {
    fn from(err: std::io::Error) -> Self {
        OctographError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for OctographError {
    fn from(err: serde_json::Error) -> Self {
        OctographError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for OctographError {
    fn from(err: toml::de::Error) -> Self {
        OctographError::Configuration(format!("TOML parse error: {err}"))
    }
}
