//! Accelerated simulation clock.
//!
//! The clock is the single source of truth for simulated time. Each call to
//! [`SimulationClock::advance`] measures the wall-clock time since the
//! previous call, scales it by the configured multiplier, and adds it to the
//! simulated calendar.
//!
//! # Design Principles
//!
//! - Simulated time never decreases. Wall-clock deltas come from a
//!   monotonic [`Instant`], and calendar overflow saturates instead of
//!   wrapping.
//! - Simulated time is reset only by [`SimulationClock::initialize`], which
//!   the runner calls once per process.
//! - Wall-clock readings use [`tokio::time::Instant`] so tests can drive the
//!   clock with a paused runtime.

use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ClockConfig;

/// Simulated calendar driven by wall-clock deltas.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    /// Simulated date the clock starts at.
    epoch: NaiveDateTime,

    /// Current simulated date and time.
    now: NaiveDateTime,

    /// Wall-clock instant of the last initialize or advance call.
    last_instant: Option<Instant>,

    /// Simulated milliseconds per wall-clock millisecond.
    multiplier: u32,
}

impl SimulationClock {
    /// Create a clock positioned at the configured start date.
    ///
    /// The wall-clock reference is not recorded until
    /// [`initialize`](Self::initialize) is called.
    pub const fn new(config: &ClockConfig) -> Self {
        Self::from_parts(config.start_date, config.time_multiplier)
    }

    /// Create a clock from an explicit epoch and multiplier.
    pub const fn from_parts(epoch: NaiveDateTime, multiplier: u32) -> Self {
        Self {
            epoch,
            now: epoch,
            last_instant: None,
            multiplier,
        }
    }

    /// Reset simulated time to the epoch and record the current wall-clock
    /// instant.
    pub fn initialize(&mut self) {
        self.now = self.epoch;
        self.last_instant = Some(Instant::now());
        debug!(epoch = %self.epoch, multiplier = self.multiplier, "Simulation clock initialized");
    }

    /// Re-anchor the wall-clock reference without moving simulated time.
    ///
    /// Used after pauses and reconnects so the idle period is not added
    /// on the next [`advance`](Self::advance).
    pub fn resync(&mut self) {
        self.last_instant = Some(Instant::now());
    }

    /// Whether [`initialize`](Self::initialize) has been called.
    pub const fn is_initialized(&self) -> bool {
        self.last_instant.is_some()
    }

    /// Advance simulated time by the scaled wall-clock delta since the
    /// previous call and return the new simulated time.
    ///
    /// Calling this on an uninitialized clock initializes it instead.
    pub fn advance(&mut self) -> NaiveDateTime {
        let current = Instant::now();
        let Some(last) = self.last_instant.replace(current) else {
            self.now = self.epoch;
            return self.now;
        };

        let elapsed = current.saturating_duration_since(last);
        self.now = self.apply(elapsed);
        self.now
    }

    /// Current simulated time.
    pub const fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Simulated date the clock started at.
    pub const fn epoch(&self) -> NaiveDateTime {
        self.epoch
    }

    /// Configured acceleration multiplier.
    pub const fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Add `elapsed` wall-clock time, scaled, to the current simulated time.
    fn apply(&self, elapsed: Duration) -> NaiveDateTime {
        let scaled = elapsed
            .checked_mul(self.multiplier)
            .and_then(|d| TimeDelta::from_std(d).ok())
            .and_then(|delta| self.now.checked_add_signed(delta));

        scaled.unwrap_or_else(|| {
            warn!(
                now = %self.now,
                elapsed_ms = elapsed.as_millis(),
                "Simulated time overflow, clock saturated"
            );
            NaiveDateTime::MAX
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn epoch() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2004, 12, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn new_clock_sits_at_epoch() {
        let clock = SimulationClock::new(&ClockConfig::default());
        assert_eq!(clock.now(), epoch());
        assert_eq!(clock.multiplier(), 200);
        assert!(!clock.is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn advance_scales_wall_clock_delta() {
        let mut clock = SimulationClock::from_parts(epoch(), 200);
        clock.initialize();

        tokio::time::advance(Duration::from_millis(50)).await;
        let now = clock.advance();

        // 50 ms * 200 = 10 simulated seconds.
        assert_eq!(now, epoch() + TimeDelta::seconds(10));
        assert_eq!(clock.now(), now);
    }

    #[tokio::test(start_paused = true)]
    async fn advance_accumulates_across_ticks() {
        let mut clock = SimulationClock::from_parts(epoch(), 200);
        clock.initialize();

        for _ in 0..20 {
            tokio::time::advance(Duration::from_millis(50)).await;
            clock.advance();
        }

        // 20 ticks * 10 simulated seconds.
        assert_eq!(clock.now(), epoch() + TimeDelta::seconds(200));
    }

    #[tokio::test(start_paused = true)]
    async fn advance_is_monotonic() {
        let mut clock = SimulationClock::from_parts(epoch(), 1_000);
        clock.initialize();

        let mut previous = clock.now();
        for step in [0_u64, 1, 0, 7, 13, 0, 250] {
            tokio::time::advance(Duration::from_millis(step)).await;
            let now = clock.advance();
            assert!(now >= previous, "{now} went backwards from {previous}");
            previous = now;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn initialize_resets_to_epoch() {
        let mut clock = SimulationClock::from_parts(epoch(), 200);
        clock.initialize();
        tokio::time::advance(Duration::from_secs(1)).await;
        clock.advance();
        assert!(clock.now() > epoch());

        clock.initialize();
        assert_eq!(clock.now(), epoch());
    }

    #[tokio::test(start_paused = true)]
    async fn resync_skips_idle_time() {
        let mut clock = SimulationClock::from_parts(epoch(), 200);
        clock.initialize();
        tokio::time::advance(Duration::from_millis(100)).await;
        let before_idle = clock.advance();

        tokio::time::advance(Duration::from_secs(30)).await;
        clock.resync();
        assert_eq!(clock.now(), before_idle);

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(clock.advance(), before_idle + TimeDelta::seconds(10));
    }

    #[tokio::test(start_paused = true)]
    async fn advance_without_initialize_starts_at_epoch() {
        let mut clock = SimulationClock::from_parts(epoch(), 200);
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(clock.advance(), epoch());
        assert!(clock.is_initialized());
    }

    #[test]
    fn overflow_saturates() {
        let clock = SimulationClock::from_parts(NaiveDateTime::MAX, 200);
        assert_eq!(clock.apply(Duration::from_secs(1)), NaiveDateTime::MAX);
    }

    #[test]
    fn real_time_advance_is_within_tolerance() {
        let mut clock = SimulationClock::from_parts(epoch(), 100);
        clock.initialize();
        std::thread::sleep(Duration::from_millis(20));
        let now = clock.advance();

        let advanced = now.signed_duration_since(epoch());
        // At least 20 ms * 100, and well under a generous scheduling ceiling.
        assert!(advanced >= TimeDelta::seconds(2));
        assert!(advanced < TimeDelta::seconds(60));
    }
}
