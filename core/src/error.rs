//! Error types for kws-harness.

use std::path::PathBuf;
use thiserror::Error;

use crate::inference::PortKind;

/// Result type alias for kws-harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors raised by the model wrapper, timing instruments and tooling.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A port index outside the engine's declared port count.
    #[error("Invalid {kind} port index {index} (engine declares {count})")]
    InvalidIndex {
        kind: PortKind,
        index: usize,
        count: usize,
    },

    /// Input length differs from the engine's declared input size.
    #[error("Input size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Elapsed time or cycle count read before any start.
    #[error("Timer read before it was started")]
    TimerNotStarted,

    /// Every session slot of the callback registry is in use.
    #[error("Session registry is full")]
    SessionLimit,

    /// Label count does not match the classifier output size.
    #[error("Found {found} categories, expected {expected}")]
    CategoryCount { found: usize, expected: usize },

    /// Shaped view does not fit the port buffer.
    #[error("Invalid tensor: {0}")]
    Tensor(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl HarnessError {
    /// Create an invalid port index error.
    pub fn invalid_index(kind: PortKind, index: usize, count: usize) -> Self {
        Self::InvalidIndex { kind, index, count }
    }

    /// Create an input size mismatch error.
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Create a tensor error.
    pub fn tensor(msg: impl Into<String>) -> Self {
        Self::Tensor(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarnessError::invalid_index(PortKind::Sink, 2, 1);
        assert_eq!(
            format!("{}", err),
            "Invalid sink port index 2 (engine declares 1)"
        );

        let err = HarnessError::size_mismatch(80, 79);
        assert_eq!(
            format!("{}", err),
            "Input size mismatch: expected 80 elements, got 79"
        );

        let err = HarnessError::config("invalid engine");
        assert_eq!(format!("{}", err), "Configuration error: invalid engine");

        let err = HarnessError::FileNotFound(PathBuf::from("/path/to/categories.txt"));
        assert_eq!(format!("{}", err), "File not found: /path/to/categories.txt");
    }
}
