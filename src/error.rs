//! Error types for filehunt.
//!
//! Structured errors using thiserror so library callers can match on the
//! failure class instead of parsing strings.

use thiserror::Error;

/// Main error type for filehunt operations.
#[derive(Debug, Error)]
pub enum FilehuntError {
    /// Target image could not be parsed as a known executable format
    #[error("Invalid image format: {0}")]
    InvalidFormat(String),

    /// Address arithmetic errors (overflow, inverted ranges)
    #[error("Address error: {0}")]
    AddressError(String),

    /// An access touched bytes outside any mapped segment
    #[error("Memory access error at {addr:#x}: {message}")]
    MemoryAccess { addr: u64, message: String },

    /// Reference pattern problems (empty set, unusable file)
    #[error("Pattern error: {0}")]
    PatternError(String),

    /// Annotation could not be applied (conflicting data unit, bad template)
    #[error("Annotation error: {0}")]
    AnnotationError(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for filehunt operations.
pub type Result<T> = std::result::Result<T, FilehuntError>;

impl From<serde_json::Error> for FilehuntError {
    fn from(err: serde_json::Error) -> Self {
        FilehuntError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FilehuntError::InvalidFormat("unknown magic".to_string());
        assert_eq!(err.to_string(), "Invalid image format: unknown magic");

        let err = FilehuntError::MemoryAccess {
            addr: 0x1234,
            message: "unmapped".to_string(),
        };
        assert_eq!(err.to_string(), "Memory access error at 0x1234: unmapped");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FilehuntError = io.into();
        assert!(matches!(err, FilehuntError::Io(_)));
    }
}
