//! Error types for the governor
//!
//! Only construction can fail on the library side. Failures of the governed
//! work are reported through [`Outcome`](crate::Outcome) and, when fatal,
//! come back to the caller as the caller's own error type.

use std::path::PathBuf;
use std::time::Duration;

/// Invalid governor configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Minimum interval must be strictly positive
    #[error("minimum interval must be greater than zero")]
    NonPositiveMinInterval,

    /// Ceiling below the floor
    #[error("maximum interval {max:?} is below minimum interval {min:?}")]
    MaxBelowMin {
        /// Configured minimum interval
        min: Duration,
        /// Configured maximum interval
        max: Duration,
    },

    /// Backoff factor must be finite and greater than one
    #[error("backoff factor must be a finite number greater than 1, got {0}")]
    InvalidBackoffFactor(f64),

    /// Configuration file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for a governor config
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Whether the error came from rejecting a value rather than loading it
    #[inline]
    #[must_use]
    pub fn is_invalid_value(&self) -> bool {
        matches!(
            self,
            Self::NonPositiveMinInterval | Self::MaxBelowMin { .. } | Self::InvalidBackoffFactor(_)
        )
    }
}

/// Text that is neither `forever` nor a positive cycle count
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid iteration budget {0:?}: expected \"forever\" or a positive integer")]
pub struct BudgetParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidBackoffFactor(0.5);
        assert!(err.to_string().contains("greater than 1"));

        let err = ConfigError::MaxBelowMin {
            min: Duration::from_secs(10),
            max: Duration::from_secs(5),
        };
        assert!(err.to_string().contains("below minimum"));
    }

    #[test]
    fn config_error_classification() {
        assert!(ConfigError::NonPositiveMinInterval.is_invalid_value());

        let io = ConfigError::Io {
            path: PathBuf::from("missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(!io.is_invalid_value());
    }
}
