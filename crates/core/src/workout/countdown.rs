use serde::Serialize;

/// A per-second countdown owned by the workout state machine.
///
/// The countdown never schedules anything itself: a single external driver
/// calls [`Countdown::tick`] once per second. Leaving a phase calls
/// [`Countdown::clear`], so no countdown outlives the phase that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Countdown {
    remaining_seconds: u32,
    active: bool,
}

impl Countdown {
    /// A cleared countdown: nothing remaining, not running.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Loaded with `seconds` but waiting for [`Countdown::start`].
    #[must_use]
    pub fn armed(seconds: u32) -> Self {
        Self {
            remaining_seconds: seconds,
            active: false,
        }
    }

    /// Loaded with `seconds` and already running.
    #[must_use]
    pub fn running(seconds: u32) -> Self {
        Self {
            remaining_seconds: seconds,
            active: true,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn clear(&mut self) {
        *self = Self::idle();
    }

    /// Advance by one second.
    ///
    /// Returns `true` exactly once: on the tick that brings a running countdown
    /// to zero (or the first tick of a running countdown loaded with zero).
    /// The countdown stops itself at that point, so later ticks return `false`.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.active = false;
            return true;
        }
        false
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}
