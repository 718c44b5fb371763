//! Governor simulator
//!
//! Runs a [`LoopGovernor`] against scripted work on virtual time and
//! reports every sleep it asked for. Nothing actually sleeps, so long
//! backoff schedules can be inspected instantly.

use super::{FixedRandom, ScriptStep, ScriptedFatal, ScriptedWork, VirtualClock};
use crate::clock::{Clock, RandomSource, SeededRandom};
use crate::config::{GovernorConfig, IterationBudget};
use crate::error::ConfigError;
use crate::governor::{LoopGovernor, RunSummary};
use serde_json::json;
use std::fmt::Write as _;
use std::num::NonZeroU64;
use std::time::Duration;

/// Jitter draw used by the simulated governor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JitterMode {
    /// Same draw every time
    Fixed(f64),
    /// Reproducible pseudo-random draws
    Seeded(u64),
}

impl Default for JitterMode {
    fn default() -> Self {
        Self::Fixed(0.4)
    }
}

/// Concrete random source chosen from [`JitterMode`]
#[derive(Debug)]
enum SimulatedRandom {
    Fixed(FixedRandom),
    Seeded(SeededRandom),
}

impl RandomSource for SimulatedRandom {
    fn next_unit(&self) -> f64 {
        match self {
            Self::Fixed(random) => random.next_unit(),
            Self::Seeded(random) => random.next_unit(),
        }
    }
}

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Governor pacing limits
    pub governor: GovernorConfig,
    /// Number of cycles; always finite so the simulation ends
    pub cycles: NonZeroU64,
    /// Outcome script, last step repeating
    pub script: Vec<ScriptStep>,
    /// Virtual time spent inside each invocation
    pub work: Duration,
    /// Jitter source
    pub jitter: JitterMode,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            governor: GovernorConfig::default(),
            cycles: NonZeroU64::MIN.saturating_add(2),
            script: vec![ScriptStep::Succeed],
            work: Duration::ZERO,
            jitter: JitterMode::default(),
        }
    }
}

/// Final report from simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration the report was produced from
    pub config: SimulatorConfig,
    /// Unit of work invocations
    pub invocations: u64,
    /// Every sleep requested, hint sleeps included, in order
    pub sleeps: Vec<Duration>,
    /// Virtual time at the end of the run
    pub elapsed: Duration,
    /// Run counters when the run completed
    pub summary: Option<RunSummary>,
    /// Fatal failure that ended the run early
    pub fatal: Option<ScriptedFatal>,
}

impl SimulatorReport {
    /// Check that the run used its whole budget
    #[must_use]
    pub fn completed(&self) -> bool {
        self.fatal.is_none()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Governor Simulation ===\n\n");
        let _ = writeln!(
            report,
            "Config: min={}s max={}s factor={}",
            self.config.governor.min_interval.as_secs_f64(),
            self.config.governor.max_interval.as_secs_f64(),
            self.config.governor.backoff_factor
        );
        let _ = writeln!(report, "Cycles Budgeted: {}", self.config.cycles);
        let _ = writeln!(report, "Invocations: {}", self.invocations);
        let _ = writeln!(report, "Virtual Elapsed: {:.3}s", self.elapsed.as_secs_f64());

        if let Some(summary) = &self.summary {
            let _ = writeln!(
                report,
                "Outcomes: {} ok, {} hinted, {} ceiling, {} backoff",
                summary.successes, summary.hinted, summary.ceiling, summary.backoffs
            );
            let _ = writeln!(report, "Final Target: {:.3}s", summary.final_target.as_secs_f64());
        }

        report.push_str("\nSleeps:\n");
        if self.sleeps.is_empty() {
            report.push_str("  (none)\n");
        }
        for (i, sleep) in self.sleeps.iter().enumerate() {
            let _ = writeln!(report, "  {:>3}: {:.3}s", i + 1, sleep.as_secs_f64());
        }

        if let Some(fatal) = &self.fatal {
            let _ = writeln!(report, "\nStopped: {fatal}");
        }
        report
    }

    /// Machine readable report
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "config": {
                "min_interval_secs": self.config.governor.min_interval.as_secs_f64(),
                "max_interval_secs": self.config.governor.max_interval.as_secs_f64(),
                "backoff_factor": self.config.governor.backoff_factor,
                "cycles": self.config.cycles.get(),
                "work_secs": self.config.work.as_secs_f64(),
                "script": self.config.script.iter().map(ToString::to_string).collect::<Vec<_>>(),
            },
            "invocations": self.invocations,
            "elapsed_secs": self.elapsed.as_secs_f64(),
            "sleeps_secs": self.sleeps.iter().map(Duration::as_secs_f64).collect::<Vec<_>>(),
            "summary": self.summary.as_ref().map(|s| json!({
                "cycles": s.cycles,
                "successes": s.successes,
                "hinted": s.hinted,
                "ceiling": s.ceiling,
                "backoffs": s.backoffs,
                "pacing_sleeps": s.pacing_sleeps,
                "total_pacing_sleep_secs": s.total_pacing_sleep.as_secs_f64(),
                "total_hint_sleep_secs": s.total_hint_sleep.as_secs_f64(),
                "final_target_secs": s.final_target.as_secs_f64(),
            })),
            "fatal": self.fatal.map(|f| f.to_string()),
        })
    }
}

/// Run the simulator
///
/// # Errors
/// Returns [`ConfigError`] if the governor configuration is invalid.
pub fn run_simulator(config: SimulatorConfig) -> Result<SimulatorReport, ConfigError> {
    let random = match config.jitter {
        JitterMode::Fixed(draw) => SimulatedRandom::Fixed(FixedRandom(draw)),
        JitterMode::Seeded(seed) => SimulatedRandom::Seeded(SeededRandom::new(seed)),
    };
    let clock = VirtualClock::new();
    let governor = LoopGovernor::new(config.governor, clock.clone(), clock.clone(), random)?;

    let mut work = ScriptedWork::new(config.script.clone(), config.work, clock.clone());
    let result = governor.run(IterationBudget::Exactly(config.cycles), || work.invoke());

    let (summary, fatal) = match result {
        Ok(summary) => (Some(summary), None),
        Err(fatal) => (None, Some(fatal)),
    };

    Ok(SimulatorReport {
        invocations: work.invocations(),
        sleeps: clock.sleeps(),
        elapsed: clock.now(),
        summary,
        fatal,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate(script: &str, work_secs: u64, cycles: u64) -> SimulatorReport {
        run_simulator(SimulatorConfig {
            cycles: NonZeroU64::new(cycles).unwrap(),
            script: ScriptStep::parse_script(script).unwrap(),
            work: Duration::from_secs(work_secs),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn simulator_reports_sleeps() {
        let report = simulate("ok", 1, 3);
        assert!(report.completed());
        assert_eq!(report.invocations, 3);
        assert_eq!(report.sleeps, vec![Duration::from_secs(9); 2]);
        assert_eq!(report.elapsed, Duration::from_secs(21));
    }

    #[test]
    fn simulator_stops_on_fatal() {
        let report = simulate("ok,fatal", 0, 10);
        assert!(!report.completed());
        assert_eq!(report.invocations, 2);
        assert_eq!(report.fatal, Some(ScriptedFatal { cycle: 2 }));
        assert!(report.generate_text().contains("Stopped"));
    }

    #[test]
    fn simulator_rejects_invalid_config() {
        let config = SimulatorConfig {
            governor: GovernorConfig::new().with_backoff_factor(0.9),
            ..Default::default()
        };
        assert!(run_simulator(config).is_err());
    }

    #[test]
    fn seeded_jitter_stays_within_band() {
        let report = run_simulator(SimulatorConfig {
            cycles: NonZeroU64::new(2).unwrap(),
            script: vec![ScriptStep::FailGeneric],
            jitter: JitterMode::Seeded(7),
            ..Default::default()
        })
        .unwrap();
        let sleep = report.sleeps[0].as_secs_f64();
        assert!((15.0..20.0).contains(&sleep), "sleep {sleep} outside [15, 20)");
    }

    #[test]
    fn json_report_shape() {
        let report = simulate("nohint", 1, 2);
        let value = report.to_json();
        assert_eq!(value["invocations"], 2);
        assert_eq!(value["sleeps_secs"][0], 3599.0);
        assert_eq!(value["summary"]["ceiling"], 2);
        assert!(value["fatal"].is_null());
    }
}
