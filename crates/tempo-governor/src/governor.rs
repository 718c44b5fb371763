//! Loop governor
//!
//! Drives a periodic, fallible unit of work:
//! - never starts cycles closer together than `min_interval`
//! - grows the interval geometrically (with jitter) under generic failures
//! - jumps straight to `max_interval` when a failure gives no timing
//! - honours explicit backoff hints, even past `max_interval`
//! - returns to `min_interval` on the first success
//!
//! Cycles are paced start-to-start: time spent inside the work (and inside
//! a hint sleep) is subtracted from the pacing sleep, and a cycle that
//! overran its target starts the next one immediately.

use crate::clock::{Clock, RandomSource, Sleeper, SystemClock, ThreadRandom, ThreadSleeper};
use crate::config::{GovernorConfig, IterationBudget};
use crate::error::ConfigError;
use crate::outcome::{CycleDecision, Outcome};
use std::time::Duration;

/// Counters for one completed `run`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Unit of work invocations
    pub cycles: u64,
    /// Cycles that succeeded
    pub successes: u64,
    /// Cycles that honoured a backoff hint
    pub hinted: u64,
    /// Cycles that jumped to the ceiling
    pub ceiling: u64,
    /// Cycles that grew the interval geometrically
    pub backoffs: u64,
    /// Number of pacing sleeps taken
    pub pacing_sleeps: u64,
    /// Time spent in pacing sleeps
    pub total_pacing_sleep: Duration,
    /// Time spent in hint sleeps
    pub total_hint_sleep: Duration,
    /// Target interval in force when the run ended
    pub final_target: Duration,
}

impl RunSummary {
    fn record(&mut self, decision: CycleDecision) {
        self.cycles += 1;
        match decision {
            CycleDecision::Succeeded => self.successes += 1,
            CycleDecision::RecoverableHinted => self.hinted += 1,
            CycleDecision::RecoverableCeiling => self.ceiling += 1,
            CycleDecision::RecoverableBackoff => self.backoffs += 1,
        }
    }

    /// Cycles that ended in a recoverable failure
    #[inline]
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.hinted + self.ceiling + self.backoffs
    }
}

/// Mutable pacing state, scoped to one `run`
#[derive(Debug)]
struct PacingState {
    target: Duration,
    completed: u64,
}

/// Iteration pacing and failure backoff around a unit of work
///
/// Configuration and collaborators are read-only after construction, so a
/// governor can serve any number of sequential `run` calls.
///
/// ```
/// use std::time::Duration;
/// use tempo_governor::prelude::*;
/// use tempo_governor::test_harness::VirtualClock;
///
/// let clock = VirtualClock::new();
/// let config = GovernorConfig::default();
/// let governor = LoopGovernor::new(config, clock.clone(), clock.clone(), || 0.4)?;
///
/// let budget = IterationBudget::exactly(3).unwrap();
/// let summary = governor.run(budget, || Outcome::<std::io::Error>::Success)?;
/// assert_eq!(summary.cycles, 3);
/// assert_eq!(clock.sleeps(), vec![Duration::from_secs(10); 2]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct LoopGovernor<C = SystemClock, S = ThreadSleeper, R = ThreadRandom> {
    config: GovernorConfig,
    clock: C,
    sleeper: S,
    random: R,
}

impl LoopGovernor {
    /// Governor on the real monotonic clock, blocking sleep and thread RNG
    ///
    /// # Errors
    /// Returns [`ConfigError`] if `config` violates the pacing invariants.
    pub fn with_system_defaults(config: GovernorConfig) -> Result<Self, ConfigError> {
        Self::new(config, SystemClock::new(), ThreadSleeper, ThreadRandom)
    }
}

impl<C, S, R> LoopGovernor<C, S, R>
where
    C: Clock,
    S: Sleeper,
    R: RandomSource,
{
    /// Create a governor
    ///
    /// # Errors
    /// Returns [`ConfigError`] if `min_interval` is zero, `max_interval` is
    /// below `min_interval`, or `backoff_factor` is not a finite value > 1.
    pub fn new(
        config: GovernorConfig,
        clock: C,
        sleeper: S,
        random: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            sleeper,
            random,
        })
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Run `work` under the pacing policy until `budget` is used up
    ///
    /// Blocks the calling thread for the whole run. With a finite budget of
    /// N cycles, `work` is invoked exactly N times and no pacing sleep
    /// follows the last cycle.
    ///
    /// # Errors
    /// Returns the payload of the first [`Outcome::Fatal`], unchanged.
    /// Recoverable outcomes never surface here.
    pub fn run<E, W>(&self, budget: IterationBudget, mut work: W) -> Result<RunSummary, E>
    where
        W: FnMut() -> Outcome<E>,
    {
        let span = tracing::info_span!("governor.run", %budget);
        let _guard = span.enter();

        let mut state = PacingState {
            target: self.config.min_interval,
            completed: 0,
        };
        let mut summary = RunSummary::default();

        loop {
            let cycle_start = self.clock.now();
            let cycle = state.completed + 1;

            let decision = match work() {
                Outcome::Success => {
                    state.target = self.config.min_interval;
                    CycleDecision::Succeeded
                }
                Outcome::RecoverableWithHint(hint) => {
                    tracing::warn!(cycle, hint_secs = hint.as_secs_f64(), "honouring backoff hint");
                    if !hint.is_zero() {
                        self.sleeper.sleep(hint);
                    }
                    summary.total_hint_sleep = summary.total_hint_sleep.saturating_add(hint);
                    state.target = self.config.min_interval;
                    CycleDecision::RecoverableHinted
                }
                Outcome::RecoverableNoHint => {
                    tracing::warn!(cycle, "failure without timing, backing off to ceiling");
                    state.target = self.config.max_interval;
                    CycleDecision::RecoverableCeiling
                }
                Outcome::RecoverableGeneric => {
                    state.target = self.grow(state.target);
                    CycleDecision::RecoverableBackoff
                }
                Outcome::Fatal(cause) => {
                    tracing::error!(cycle, "fatal outcome, stopping run");
                    return Err(cause);
                }
            };

            state.target = state.target.min(self.config.max_interval);
            state.completed = cycle;
            summary.record(decision);

            tracing::debug!(
                cycle,
                elapsed_secs = self.clock.now().saturating_sub(cycle_start).as_secs_f64(),
                %decision,
                target_secs = state.target.as_secs_f64(),
                "cycle finished"
            );

            if budget.is_exhausted(state.completed) {
                break;
            }

            let deadline = cycle_start.saturating_add(state.target);
            let corrective = deadline.saturating_sub(self.clock.now());
            if !corrective.is_zero() {
                self.sleeper.sleep(corrective);
                summary.pacing_sleeps += 1;
                summary.total_pacing_sleep = summary.total_pacing_sleep.saturating_add(corrective);
            }
        }

        summary.final_target = state.target;
        tracing::info!(
            cycles = summary.cycles,
            failures = summary.failures(),
            "run finished"
        );
        Ok(summary)
    }

    /// Next target after a generic failure
    ///
    /// The jitter draw widens the factor into `[factor, factor + 0.5)`.
    fn grow(&self, previous: Duration) -> Duration {
        let draw = self.random.next_unit();
        let jitter = if draw.is_finite() { draw.clamp(0.0, 1.0) } else { 0.0 };
        let factor = self.config.backoff_factor + jitter / 2.0;
        Duration::try_from_secs_f64(previous.as_secs_f64() * factor)
            .unwrap_or(self.config.max_interval)
    }
}
