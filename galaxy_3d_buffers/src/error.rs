//! Error types for the Galaxy3D buffer layer
//!
//! Every failure raised by vertex declarations, buffers and backends is one
//! of these variants. Validation failures are raised before any native call
//! is issued, so an error never leaves a partially applied native write.

use std::fmt;

/// Result type for Galaxy3D buffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D buffer errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad or missing vertex declaration
    InvalidLayout(String),

    /// Zero-length construction input (no elements, zero capacity)
    EmptyInput(String),

    /// Offset, length or stride violates capacity or alignment
    OutOfRange(String),

    /// Operation not permitted by the usage hint or the backend capabilities
    Unsupported(String),

    /// Combination explicitly left unimplemented by a backend
    NotImplemented(String),

    /// Native call failed or the device context could not be acquired
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Resource used after disposal
    InvalidResource(String),
}

impl Error {
    /// Short name of the error kind, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidLayout(_) => "InvalidLayout",
            Error::EmptyInput(_) => "EmptyInput",
            Error::OutOfRange(_) => "OutOfRange",
            Error::Unsupported(_) => "Unsupported",
            Error::NotImplemented(_) => "NotImplemented",
            Error::BackendError(_) => "BackendError",
            Error::OutOfMemory => "OutOfMemory",
            Error::InvalidResource(_) => "InvalidResource",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidLayout(msg) => write!(f, "Invalid layout: {}", msg),
            Error::EmptyInput(msg) => write!(f, "Empty input: {}", msg),
            Error::OutOfRange(msg) => write!(f, "Out of range: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
