//=========================================================================
// Time Source
//=========================================================================
//
// Scaled-clock contract consumed by the invoke scheduler and the
// deferred-destroy queue.
//
// "Waiting" in this runtime is never a blocking operation: every timer is
// a stored timestamp compared against `now()` inside a tick. Pausing or
// slowing the scaled clock therefore pauses or slows every timed invoke
// and every pending destruction at once.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

//=== TimeSource Trait ====================================================

/// Clock contract for the lifecycle runtime.
///
/// `now()` is scaled, pause-aware game time; `unscaled_now()` is real
/// wall-clock time. Both are monotonic seconds. The scheduler and destroy
/// queue use `now()` exclusively.
pub trait TimeSource {
    /// Current scaled game time in seconds.
    fn now(&self) -> f64;

    /// Current real (unscaled) time in seconds.
    fn unscaled_now(&self) -> f64;
}

//=== ScaledClock =========================================================

/// Production clock backed by [`Instant`], with time-scale and pause
/// controls.
///
/// While paused, `now()` is frozen and `unscaled_now()` keeps advancing.
/// Scale changes take effect from the moment of the call; already-elapsed
/// scaled time is preserved.
pub struct ScaledClock {
    origin: Instant,
    scale: f64,
    paused: bool,
    /// Scaled seconds accumulated up to the last scale/pause change.
    scaled_base: f64,
    /// Real seconds elapsed at the last scale/pause change.
    real_base: f64,
}

impl ScaledClock {
    /// Creates a running clock at scale 1.0.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            scale: 1.0,
            paused: false,
            scaled_base: 0.0,
            real_base: 0.0,
        }
    }

    /// Sets the time scale (1.0 = real time, 0.5 = slow motion, 0.0 = hold).
    ///
    /// Negative scales are clamped to zero.
    pub fn set_scale(&mut self, scale: f64) {
        self.rebase();
        self.scale = scale.max(0.0);
    }

    /// Current time scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Freezes scaled time. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.rebase();
            self.paused = true;
        }
    }

    /// Resumes scaled time from where it was frozen. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.real_base = self.origin.elapsed().as_secs_f64();
            self.paused = false;
        }
    }

    /// Whether scaled time is currently frozen.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // Folds elapsed scaled time into the base so scale changes do not
    // rewrite history.
    fn rebase(&mut self) {
        let real = self.origin.elapsed().as_secs_f64();
        if !self.paused {
            self.scaled_base += (real - self.real_base) * self.scale;
        }
        self.real_base = real;
    }
}

impl Default for ScaledClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ScaledClock {
    fn now(&self) -> f64 {
        if self.paused {
            self.scaled_base
        } else {
            let real = self.origin.elapsed().as_secs_f64();
            self.scaled_base + (real - self.real_base) * self.scale
        }
    }

    fn unscaled_now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

//=== ManualClock =========================================================

/// Hand-advanced clock for tests and deterministic drivers.
///
/// Cloning produces a shared handle: the test keeps one clone and hands
/// the other to the scene, then advances time explicitly between ticks.
///
/// # Example
///
/// ```
/// use orrery_engine::core::time::{ManualClock, TimeSource};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(1.5);
/// assert_eq!(clock.now(), 1.5);
/// ```
#[derive(Clone)]
pub struct ManualClock {
    scaled: Rc<Cell<f64>>,
    unscaled: Rc<Cell<f64>>,
}

impl ManualClock {
    /// Creates a clock at t = 0.
    pub fn new() -> Self {
        Self {
            scaled: Rc::new(Cell::new(0.0)),
            unscaled: Rc::new(Cell::new(0.0)),
        }
    }

    /// Advances both scaled and unscaled time by `dt` seconds.
    pub fn advance(&self, dt: f64) {
        self.scaled.set(self.scaled.get() + dt);
        self.unscaled.set(self.unscaled.get() + dt);
    }

    /// Advances scaled time only (simulates slow motion or pause catch-up).
    pub fn advance_scaled(&self, dt: f64) {
        self.scaled.set(self.scaled.get() + dt);
    }

    /// Advances unscaled time only (simulates a paused game clock).
    pub fn advance_unscaled(&self, dt: f64) {
        self.unscaled.set(self.unscaled.get() + dt);
    }

    /// Sets scaled time to an absolute value.
    pub fn set(&self, now: f64) {
        self.scaled.set(now);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        self.scaled.get()
    }

    fn unscaled_now(&self) -> f64 {
        self.unscaled.get()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
