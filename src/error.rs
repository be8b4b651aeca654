//! Error handling for the ciphersweep auditor
//!
//! Every fallible operation in the crate returns `Result<T, AuditError>`.
//! Worker tasks never raise across the pool boundary: failures travel back
//! to the scheduler as plain values inside the same `Result` the successful
//! payload would use, and callers branch on [`AuditError::kind`] without
//! consuming the error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Resolution error: {0}")]
    ResolutionError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Probe error: {0}")]
    ProbeError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Timeout error")]
    TimeoutError,

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Output error: {0}")]
    OutputError(String),
}

/// Result type alias for audit operations
pub type AuditResult<T> = Result<T, AuditError>;

/// Discriminant of an [`AuditError`], used to branch on the failure class
/// without taking the error apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Resolution,
    Connection,
    Config,
    Probe,
    InvalidArgument,
    Io,
    Timeout,
    Tls,
    Output,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Resolution => "resolution",
            ErrorKind::Connection => "connection",
            ErrorKind::Config => "config",
            ErrorKind::Probe => "probe",
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::Io => "io",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Tls => "tls",
            ErrorKind::Output => "output",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AuditError {
    /// Returns the failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuditError::ResolutionError(_) => ErrorKind::Resolution,
            AuditError::ConnectionError(_) => ErrorKind::Connection,
            AuditError::ConfigError(_) => ErrorKind::Config,
            AuditError::ProbeError(_) => ErrorKind::Probe,
            AuditError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AuditError::IoError(_) => ErrorKind::Io,
            AuditError::TimeoutError => ErrorKind::Timeout,
            AuditError::TlsError(_) => ErrorKind::Tls,
            AuditError::OutputError(_) => ErrorKind::Output,
        }
    }

    /// True if the error belongs to the given failure class
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// True if the error invalidates the whole run rather than one host.
    /// Configuration failures happen before any probe is sent, so nothing
    /// partial exists worth reporting.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AuditError::ConfigError(_) | AuditError::InvalidArgument(_)
        )
    }
}

// Convert common error types
impl From<std::net::AddrParseError> for AuditError {
    fn from(err: std::net::AddrParseError) -> Self {
        AuditError::InvalidArgument(format!("Invalid IP address: {err}"))
    }
}

impl From<std::num::ParseIntError> for AuditError {
    fn from(err: std::num::ParseIntError) -> Self {
        AuditError::InvalidArgument(format!("Invalid port number: {err}"))
    }
}

impl From<tokio::time::error::Elapsed> for AuditError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AuditError::TimeoutError
    }
}

impl From<openssl::error::ErrorStack> for AuditError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        AuditError::TlsError(err.to_string())
    }
}
