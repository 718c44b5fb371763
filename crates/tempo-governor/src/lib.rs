//! Tempo Governor
//!
//! Paces a periodic, fallible unit of work:
//! 1. **Cadence**: cycles start no closer together than `min_interval`
//! 2. **Backoff**: generic failures grow the interval geometrically, with jitter
//! 3. **Hints**: explicit backoff instructions are slept as given
//! 4. **Recovery**: one success resets pacing to `min_interval`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tempo_governor::prelude::*;
//!
//! # fn fetch_and_upload() -> Result<(), String> { Ok(()) }
//! let governor = LoopGovernor::with_system_defaults(GovernorConfig::default())?;
//!
//! governor.run(IterationBudget::Forever, || {
//!     Outcome::from_result(fetch_and_upload(), |message: String| {
//!         if message.contains("RESOURCE_EXHAUSTED") {
//!             Outcome::from_throttle_message(&message)
//!         } else if message.contains("unauthenticated") {
//!             Outcome::Fatal(message)
//!         } else {
//!             Outcome::RecoverableGeneric
//!         }
//!     })
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod clock;
pub mod config;
pub mod error;
pub mod governor;
pub mod hint;
pub mod outcome;

// Ambient
pub mod logging;

// Test harness
pub mod test_harness;

// Re-exports
pub use config::{GovernorConfig, IterationBudget};
pub use error::{BudgetParseError, ConfigError};
pub use governor::{LoopGovernor, RunSummary};
pub use outcome::{CycleDecision, Outcome};

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::clock::{Clock, RandomSource, Sleeper, SystemClock, ThreadRandom, ThreadSleeper};
    pub use crate::config::{GovernorConfig, IterationBudget};
    pub use crate::error::ConfigError;
    pub use crate::governor::{LoopGovernor, RunSummary};
    pub use crate::hint::parse_backoff_hint;
    pub use crate::outcome::{CycleDecision, Outcome};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
