//! Deterministic harness for exercising the governor
//!
//! - [`VirtualClock`] is a clock and a sleeper at once: sleeping advances
//!   virtual time instantly and records the requested duration.
//! - [`FixedRandom`] always returns the same jitter draw.
//! - [`ScriptedWork`] replays a list of [`ScriptStep`]s, spending a fixed
//!   amount of virtual time per cycle.
//! - [`run_simulator`] wires those together and produces a report.

pub mod simulator;

pub use simulator::{run_simulator, JitterMode, SimulatorConfig, SimulatorReport};

use crate::clock::{Clock, RandomSource, Sleeper};
use crate::hint::parse_backoff_hint;
use crate::outcome::Outcome;
use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct VirtualTime {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// Virtual monotonic clock that doubles as the sleep primitive
///
/// Clones share the same timeline.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    inner: Arc<Mutex<VirtualTime>>,
}

impl VirtualClock {
    /// Clock starting at zero
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let mut time = self.inner.lock();
        time.now = time.now.saturating_add(duration);
    }

    /// Every sleep requested so far, in order
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().sleeps.clone()
    }

    /// Sum of all recorded sleeps
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        self.inner
            .lock()
            .sleeps
            .iter()
            .fold(Duration::ZERO, |total, sleep| total.saturating_add(*sleep))
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.inner.lock().now
    }
}

impl Sleeper for VirtualClock {
    fn sleep(&self, duration: Duration) {
        let mut time = self.inner.lock();
        time.sleeps.push(duration);
        time.now = time.now.saturating_add(duration);
    }
}

/// Random source pinned to one value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

/// Scripted fatal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("scripted fatal failure at cycle {cycle}")]
pub struct ScriptedFatal {
    /// Cycle (1-based) that reported the failure
    pub cycle: u64,
}

/// One scripted cycle outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// `ok`
    Succeed,
    /// `fail`
    FailGeneric,
    /// `nohint`
    FailNoHint,
    /// `hint:<duration>`, e.g. `hint:44m0s`
    FailWithHint(Duration),
    /// `throttle:<message>`, classified through the hint parser
    Throttle(String),
    /// `fatal`
    Fatal,
}

impl ScriptStep {
    fn outcome(&self, cycle: u64) -> Outcome<ScriptedFatal> {
        match self {
            Self::Succeed => Outcome::Success,
            Self::FailGeneric => Outcome::RecoverableGeneric,
            Self::FailNoHint => Outcome::RecoverableNoHint,
            Self::FailWithHint(hint) => Outcome::RecoverableWithHint(*hint),
            Self::Throttle(message) => Outcome::from_throttle_message(message),
            Self::Fatal => Outcome::Fatal(ScriptedFatal { cycle }),
        }
    }

    /// Parse a comma separated script such as `ok,fail,hint:44m0s`
    ///
    /// # Errors
    /// Returns the first token that is not a known step.
    pub fn parse_script(script: &str) -> Result<Vec<Self>, ScriptParseError> {
        script
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for ScriptStep {
    type Err = ScriptParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let lower = token.to_ascii_lowercase();
        match lower.as_str() {
            "ok" | "success" => return Ok(Self::Succeed),
            "fail" | "generic" => return Ok(Self::FailGeneric),
            "nohint" => return Ok(Self::FailNoHint),
            "fatal" => return Ok(Self::Fatal),
            _ => {}
        }
        if lower.starts_with("hint:") {
            let duration = &token["hint:".len()..];
            return parse_backoff_hint(&format!("backoff for {duration}"))
                .map(Self::FailWithHint)
                .ok_or_else(|| ScriptParseError(token.to_string()));
        }
        if lower.starts_with("throttle:") {
            return Ok(Self::Throttle(token["throttle:".len()..].to_string()));
        }
        Err(ScriptParseError(token.to_string()))
    }
}

impl fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeed => f.write_str("ok"),
            Self::FailGeneric => f.write_str("fail"),
            Self::FailNoHint => f.write_str("nohint"),
            Self::FailWithHint(hint) => write!(f, "hint:{}s", hint.as_secs_f64()),
            Self::Throttle(message) => write!(f, "throttle:{message}"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// Unknown script token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown script step {0:?}: expected ok, fail, nohint, fatal, hint:<duration> or throttle:<message>")]
pub struct ScriptParseError(pub String);

/// Unit of work that replays a script on a [`VirtualClock`]
///
/// Each call spends `work` of virtual time, then reports the next scripted
/// step. Once the script runs out the last step repeats; an empty script
/// always succeeds.
#[derive(Debug, Clone)]
pub struct ScriptedWork {
    steps: Vec<ScriptStep>,
    work: Duration,
    clock: VirtualClock,
    invocations: u64,
}

impl ScriptedWork {
    /// Create scripted work on `clock`
    #[must_use]
    pub fn new(steps: Vec<ScriptStep>, work: Duration, clock: VirtualClock) -> Self {
        Self {
            steps,
            work,
            clock,
            invocations: 0,
        }
    }

    /// Number of times the work has been invoked
    #[inline]
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Perform one cycle's worth of work
    pub fn invoke(&mut self) -> Outcome<ScriptedFatal> {
        self.invocations += 1;
        self.clock.advance(self.work);
        let index = usize::try_from(self.invocations - 1).unwrap_or(usize::MAX);
        match self.steps.get(index).or_else(|| self.steps.last()) {
            Some(step) => step.outcome(self.invocations),
            None => Outcome::Success,
        }
    }
}
