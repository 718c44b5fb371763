//! Time and randomness seams
//!
//! The governor never reads the wall clock, sleeps, or draws random numbers
//! on its own. Each of those goes through a trait handed to the constructor,
//! so tests can substitute a virtual clock and a fixed jitter draw.
//!
//! Closures implement the traits directly:
//!
//! ```
//! use std::time::Duration;
//! use tempo_governor::clock::{Clock, RandomSource, Sleeper};
//!
//! let clock = || Duration::from_secs(5);
//! let sleeper = |_d: Duration| {};
//! let random = || 0.25;
//! assert_eq!(clock.now(), Duration::from_secs(5));
//! sleeper.sleep(Duration::from_secs(1));
//! assert_eq!(random.next_unit(), 0.25);
//! ```

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin
    ///
    /// Successive calls never go backwards.
    fn now(&self) -> Duration;
}

/// Blocking sleep primitive
pub trait Sleeper {
    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Uniform random source
pub trait RandomSource {
    /// Draw from `[0, 1)`
    fn next_unit(&self) -> f64;
}

impl<F: Fn() -> Duration> Clock for F {
    fn now(&self) -> Duration {
        self()
    }
}

impl<F: Fn(Duration)> Sleeper for F {
    fn sleep(&self, duration: Duration) {
        self(duration);
    }
}

impl<F: Fn() -> f64> RandomSource for F {
    fn next_unit(&self) -> f64 {
        self()
    }
}

/// Monotonic clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Clock whose origin is the moment of creation
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Real blocking sleep via [`std::thread::sleep`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Uniform `[0, 1)` draws from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Reproducible `[0, 1)` draws from a seeded generator
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Generator seeded with `seed`
    #[inline]
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        self.rng.lock().random::<f64>()
    }
}
