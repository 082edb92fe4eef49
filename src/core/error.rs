//! Error types for Dynamic Depth operations
//!
//! Malformed input (truncated JPEG, bad segment length, illegal base64,
//! size-limit overflow) is always recoverable and surfaces as an `Err` or a
//! `None`, never as a panic. Caller-contract violations (unregistered
//! namespace, property written on a list wrapper) use the same shape but are
//! logged at error severity, since they indicate a caller bug rather than
//! bad data.

use thiserror::Error;

/// Error types for Dynamic Depth operations
#[derive(Debug, Error)]
pub enum DepthError {
    /// Bad parameter provided to a function (caller-contract violation)
    #[error("Bad parameter: {0}")]
    BadParam(String),

    /// Bad value encountered in input data
    #[error("Bad value: {0}")]
    BadValue(String),

    /// Parse error (JPEG section or XML parsing failed)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Serialization error (tree or packet rendering failed)
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A size-bounded packet section exceeded its ceiling
    #[error("Size limit exceeded: {0}")]
    SizeLimitExceeded(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),
}

/// Result type alias for Dynamic Depth operations
pub type DepthResult<T> = Result<T, DepthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DepthError::BadParam("test".to_string());
        assert!(err.to_string().contains("Bad parameter: test"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DepthError = io_err.into();
        assert!(matches!(err, DepthError::IoError(_)));
    }
}
