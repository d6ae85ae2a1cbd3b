//! [`Clock`] – monotonic time source for mission timers.
//!
//! Station-keeping dwell timers and docking state timers compare elapsed
//! wall-clock time against their configured durations.  They read it through
//! this trait so tests and simulations can drive time explicitly.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use usv_mission::clock::{Clock, ManualClock};
//!
//! let clock = ManualClock::new();
//! let view = clock.clone();
//!
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(view.elapsed(), Duration::from_secs(5));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic source of elapsed time since an arbitrary, fixed epoch.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Time elapsed since the clock's epoch.  Never decreases.
    fn elapsed(&self) -> Duration;
}

/// Clock handle shared between the manager and every mission it owns.
pub type SharedClock = Arc<dyn Clock>;

// ────────────────────────────────────────────────────────────────────────────
// SystemClock
// ────────────────────────────────────────────────────────────────────────────

/// Real time, measured from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Convenience constructor for a [`SharedClock`].
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ManualClock
// ────────────────────────────────────────────────────────────────────────────

/// A clock that only moves when told to.
///
/// Clones share the same underlying counter, so a test can keep one handle
/// and pass another into the code under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        let step = u64::try_from(step.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_add(step)));
    }

    /// Move the clock forward by `secs` seconds.  Non-positive or non-finite
    /// values are ignored.
    pub fn advance_secs(&self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.advance(Duration::from_secs_f64(secs));
        }
    }

    /// Return this handle as a [`SharedClock`].
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        assert_eq!(ManualClock::new().elapsed(), Duration::ZERO);
    }

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new();
        let shared = clock.shared();
        clock.advance(Duration::from_millis(250));
        clock.advance_secs(1.5);
        assert_eq!(shared.elapsed(), Duration::from_millis(1750));
    }

    #[test]
    fn negative_and_nan_steps_are_ignored() {
        let clock = ManualClock::new();
        clock.advance_secs(-3.0);
        clock.advance_secs(f64::NAN);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);
    }
}
