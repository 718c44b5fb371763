//! Governor configuration and iteration budgets
//!
//! Durations are carried as [`Duration`] in code and as floating point
//! seconds in TOML:
//!
//! ```toml
//! min_interval_secs = 10.0
//! max_interval_secs = 3600.0
//! backoff_factor = 1.5
//! ```

use crate::error::{BudgetParseError, ConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default floor between cycle starts
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(10);
/// Default ceiling for locally computed pacing
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(3600);
/// Default geometric growth per generic failure, before jitter
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.5;

/// Pacing limits shared by every run of a governor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GovernorConfig {
    /// Minimum time between the starts of consecutive cycles
    #[serde(rename = "min_interval_secs", with = "secs_f64")]
    pub min_interval: Duration,
    /// Ceiling for the computed target interval (hint sleeps are exempt)
    #[serde(rename = "max_interval_secs", with = "secs_f64")]
    pub max_interval: Duration,
    /// Multiplier applied per generic failure, widened by jitter
    pub backoff_factor: f64,
}

impl GovernorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With minimum interval
    #[inline]
    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// With maximum interval
    #[inline]
    #[must_use]
    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    /// With backoff factor
    #[inline]
    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Check the pacing invariants
    ///
    /// # Errors
    /// Returns the first violated constraint: a zero minimum, a maximum
    /// below the minimum, or a backoff factor that is not finite and > 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval.is_zero() {
            return Err(ConfigError::NonPositiveMinInterval);
        }
        if self.max_interval < self.min_interval {
            return Err(ConfigError::MaxBelowMin {
                min: self.min_interval,
                max: self.max_interval,
            });
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 1.0 {
            return Err(ConfigError::InvalidBackoffFactor(self.backoff_factor));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// Keys that are absent keep their default values.
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for malformed TOML or unknown keys, otherwise
    /// whatever [`GovernorConfig::validate`] rejects.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, then as
    /// [`GovernorConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

/// How many cycles a single `run` performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IterationBudget {
    /// Keep cycling until a fatal outcome
    #[default]
    Forever,
    /// Run exactly this many cycles
    Exactly(NonZeroU64),
}

impl IterationBudget {
    /// Finite budget of `cycles`, or `None` for zero
    #[inline]
    #[must_use]
    pub fn exactly(cycles: u64) -> Option<Self> {
        NonZeroU64::new(cycles).map(Self::Exactly)
    }

    /// Whether `completed` cycles use up the budget
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self, completed: u64) -> bool {
        match self {
            Self::Forever => false,
            Self::Exactly(limit) => completed >= limit.get(),
        }
    }
}

impl fmt::Display for IterationBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forever => f.write_str("forever"),
            Self::Exactly(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for IterationBudget {
    type Err = BudgetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("forever") {
            return Ok(Self::Forever);
        }
        trimmed
            .parse::<u64>()
            .ok()
            .and_then(Self::exactly)
            .ok_or_else(|| BudgetParseError(s.to_string()))
    }
}

impl From<NonZeroU64> for IterationBudget {
    fn from(value: NonZeroU64) -> Self {
        Self::Exactly(value)
    }
}

/// Serde adapter: `Duration` as floating point seconds
mod secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GovernorConfig::default();
        assert_eq!(config.min_interval, Duration::from_secs(10));
        assert_eq!(config.max_interval, Duration::from_secs(3600));
        assert!((config.backoff_factor - 1.5).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_min_interval() {
        let config = GovernorConfig::new().with_min_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveMinInterval)
        ));
    }

    #[test]
    fn rejects_max_below_min() {
        let config = GovernorConfig::new()
            .with_min_interval(Duration::from_secs(20))
            .with_max_interval(Duration::from_secs(19));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxBelowMin { .. })
        ));
    }

    #[test]
    fn max_equal_to_min_is_allowed() {
        let config = GovernorConfig::new()
            .with_min_interval(Duration::from_secs(5))
            .with_max_interval(Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_backoff_factor() {
        for factor in [1.0, 0.5, -2.0, f64::NAN, f64::INFINITY] {
            let config = GovernorConfig::new().with_backoff_factor(factor);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidBackoffFactor(_))),
                "factor {factor} should be rejected"
            );
        }
    }

    #[test]
    fn toml_partial_document_keeps_defaults() {
        let config = GovernorConfig::from_toml_str("min_interval_secs = 2.5\n").unwrap();
        assert_eq!(config.min_interval, Duration::from_millis(2500));
        assert_eq!(config.max_interval, DEFAULT_MAX_INTERVAL);
    }

    #[test]
    fn toml_rejects_unknown_keys_and_invalid_values() {
        assert!(matches!(
            GovernorConfig::from_toml_str("interval = 3\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            GovernorConfig::from_toml_str("min_interval_secs = -1.0\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            GovernorConfig::from_toml_str("backoff_factor = 1.0\n"),
            Err(ConfigError::InvalidBackoffFactor(_))
        ));
    }

    #[test]
    fn budget_parsing() {
        assert_eq!("forever".parse::<IterationBudget>().unwrap(), IterationBudget::Forever);
        assert_eq!(" FOREVER ".parse::<IterationBudget>().unwrap(), IterationBudget::Forever);
        assert_eq!(
            "3".parse::<IterationBudget>().unwrap(),
            IterationBudget::exactly(3).unwrap()
        );
        assert!("0".parse::<IterationBudget>().is_err());
        assert!("-1".parse::<IterationBudget>().is_err());
        assert!("soon".parse::<IterationBudget>().is_err());
    }

    #[test]
    fn budget_exhaustion() {
        let budget = IterationBudget::exactly(2).unwrap();
        assert!(!budget.is_exhausted(1));
        assert!(budget.is_exhausted(2));
        assert!(!IterationBudget::Forever.is_exhausted(u64::MAX));
        assert_eq!(IterationBudget::exactly(0), None);
        assert_eq!(budget.to_string(), "2");
    }
}
