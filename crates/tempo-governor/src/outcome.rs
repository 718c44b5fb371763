//! Classified result of one unit of work
//!
//! The governor never inspects the caller's errors. The unit of work hands
//! back an [`Outcome`] and the governor matches on the tag.

use crate::hint::parse_backoff_hint;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// What happened in one invocation of the governed work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<E> {
    /// The work completed
    Success,
    /// Recoverable failure carrying an explicit backoff instruction
    RecoverableWithHint(Duration),
    /// Recoverable failure of a kind that asks for caution but gave no timing
    RecoverableNoHint,
    /// Any other recoverable failure
    RecoverableGeneric,
    /// Unrecoverable failure, returned from `run` as is
    Fatal(E),
}

impl<E> Outcome<E> {
    /// Adapt a plain `Result`, classifying the error with `classify`
    ///
    /// ```
    /// use tempo_governor::Outcome;
    ///
    /// let res: Result<(), &str> = Err("timeout");
    /// let outcome: Outcome<&str> = Outcome::from_result(res, |e| {
    ///     if e == "timeout" { Outcome::RecoverableGeneric } else { Outcome::Fatal(e) }
    /// });
    /// assert_eq!(outcome, Outcome::RecoverableGeneric);
    /// ```
    pub fn from_result<T, F>(result: Result<T, F>, classify: impl FnOnce(F) -> Self) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => classify(err),
        }
    }

    /// Classify a throttling message by its embedded backoff instruction
    ///
    /// Messages without a usable "backoff for ..." suffix become
    /// [`Outcome::RecoverableNoHint`].
    #[must_use]
    pub fn from_throttle_message(message: &str) -> Self {
        match parse_backoff_hint(message) {
            Some(hint) => Self::RecoverableWithHint(hint),
            None => Self::RecoverableNoHint,
        }
    }

    /// Check if this outcome ends the run
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Check if this outcome is a retried failure
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RecoverableWithHint(_) | Self::RecoverableNoHint | Self::RecoverableGeneric
        )
    }

    /// Map the fatal payload
    pub fn map_fatal<G>(self, f: impl FnOnce(E) -> G) -> Outcome<G> {
        match self {
            Self::Success => Outcome::Success,
            Self::RecoverableWithHint(hint) => Outcome::RecoverableWithHint(hint),
            Self::RecoverableNoHint => Outcome::RecoverableNoHint,
            Self::RecoverableGeneric => Outcome::RecoverableGeneric,
            Self::Fatal(err) => Outcome::Fatal(f(err)),
        }
    }
}

/// How a non-fatal cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleDecision {
    /// Success, pacing reset to the minimum
    Succeeded,
    /// Hint honoured, pacing reset to the minimum afterwards
    RecoverableHinted,
    /// No usable timing, pacing jumped to the ceiling
    RecoverableCeiling,
    /// Generic failure, pacing grown geometrically
    RecoverableBackoff,
}

impl CycleDecision {
    /// Stable lowercase name, used in logs
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::RecoverableHinted => "recoverable_hinted",
            Self::RecoverableCeiling => "recoverable_ceiling",
            Self::RecoverableBackoff => "recoverable_backoff",
        }
    }
}

impl fmt::Display for CycleDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
