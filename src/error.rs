use std::fmt;

/// Result type for Pallas operations
pub type Result<T> = std::result::Result<T, PallasError>;

/// Main error type for the Pallas library
#[derive(Debug, Clone)]
pub enum PallasError {
    /// A stored matrix does not have the shape the receiving layer expects
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid construction parameter
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// The stream ended before a complete matrix record was read
    ShortRead(String),
}

impl fmt::Display for PallasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PallasError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            PallasError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            PallasError::IoError(msg) => write!(f, "IO error: {}", msg),
            PallasError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            PallasError::ShortRead(msg) => write!(f, "Short read: {}", msg),
        }
    }
}

impl std::error::Error for PallasError {}

impl From<std::io::Error> for PallasError {
    fn from(err: std::io::Error) -> Self {
        PallasError::IoError(err.to_string())
    }
}

// An exhausted reader arrives as an Io error of kind UnexpectedEof.
impl From<bincode::Error> for PallasError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                PallasError::ShortRead(io.to_string())
            }
            bincode::ErrorKind::Io(ref io) => PallasError::IoError(io.to_string()),
            ref other => PallasError::SerializationError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PallasError {
    fn from(err: serde_json::Error) -> Self {
        PallasError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl PallasError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        PallasError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        PallasError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_truncated_stream_maps_to_short_read() {
        let mut reader = Cursor::new(vec![1u8, 0]);
        let err: PallasError = bincode::deserialize_from::<_, i32>(&mut reader)
            .unwrap_err()
            .into();
        assert!(matches!(err, PallasError::ShortRead(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = PallasError::dimension_mismatch("3x2", "2x3");
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3x2, got 2x3");

        let err = PallasError::invalid_parameter("batch_size", "must be positive");
        assert_eq!(err.to_string(), "Invalid parameter 'batch_size': must be positive");
    }
}
