//! Error types for dotqc-core.

use thiserror::Error;

/// Result type alias for dotqc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for dotqc operations.
///
/// Analysis boundary conditions (no points, too few points for a statistic)
/// are never errors; they are reported as `0`, `false` or `None` in the
/// metrics record. Only violated preconditions end up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The input image has no pixels.
    #[error("image must be at least 1x1, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::EmptyImage {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "image must be at least 1x1, got 0x12");

        let err = Error::ConfigError("grid_n must be at least 2".into());
        assert_eq!(
            err.to_string(),
            "configuration error: grid_n must be at least 2"
        );
    }
}
