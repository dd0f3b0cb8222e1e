//! Error types for scanning, pattern matching and pointer resolution

use std::fmt;
use thiserror::Error;

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Invalid {data_type} literal '{literal}': {reason}")]
    InvalidValue {
        literal: String,
        data_type: String,
        reason: String,
    },

    #[error("Invalid pattern token '{token}' at position {position}: {reason}")]
    InvalidPattern {
        token: String,
        position: usize,
        reason: String,
    },

    #[error("Failed to read memory at {address}: {reason}")]
    ReadFailed { address: String, reason: String },

    #[error("Failed to write memory at {address}: {reason}")]
    WriteFailed { address: String, reason: String },

    #[error("Pointer chain broken at level {level}: {reason}")]
    PointerChainBroken { level: usize, reason: String },

    #[error("Not attached to a process")]
    NotAttached,

    #[error("No candidates to refine; run a first scan")]
    NoCandidates,

    #[error("Invalid range: low {low} is greater than high {high}")]
    InvalidRange { low: String, high: String },

    #[error("Invalid value type: {0}")]
    InvalidValueType(String),

    #[error("Pointer chain '{0}' is not resolved")]
    ChainNotResolved(String),

    #[error("A scan is already in progress")]
    ScanInProgress,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Broad failure classes callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed literal or pattern text, rejected before any reading
    Parse,
    /// Unreadable or unwritable memory
    Access,
    /// Operation invoked in an invalid state
    State,
    /// Session persistence failure
    Io,
}

impl MemoryError {
    /// Classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MemoryError::InvalidAddress(_)
            | MemoryError::InvalidValue { .. }
            | MemoryError::InvalidPattern { .. } => ErrorKind::Parse,
            MemoryError::ReadFailed { .. }
            | MemoryError::WriteFailed { .. }
            | MemoryError::PointerChainBroken { .. }
            | MemoryError::NotAttached => ErrorKind::Access,
            MemoryError::NoCandidates
            | MemoryError::InvalidRange { .. }
            | MemoryError::InvalidValueType(_)
            | MemoryError::ChainNotResolved(_)
            | MemoryError::ScanInProgress
            | MemoryError::InvalidState(_) => ErrorKind::State,
            MemoryError::IoError(_) | MemoryError::JsonError(_) => ErrorKind::Io,
        }
    }

    /// Creates a literal parse error
    pub fn invalid_value(
        literal: impl Into<String>,
        data_type: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        MemoryError::InvalidValue {
            literal: literal.into(),
            data_type: data_type.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a pattern parse error
    pub fn invalid_pattern(
        token: impl Into<String>,
        position: usize,
        reason: impl Into<String>,
    ) -> Self {
        MemoryError::InvalidPattern {
            token: token.into(),
            position,
            reason: reason.into(),
        }
    }

    /// Creates a read failed error
    pub fn read_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::ReadFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a write failed error
    pub fn write_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::WriteFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a pointer chain broken error
    pub fn pointer_chain_broken(level: usize, reason: impl Into<String>) -> Self {
        MemoryError::PointerChainBroken {
            level,
            reason: reason.into(),
        }
    }
}
