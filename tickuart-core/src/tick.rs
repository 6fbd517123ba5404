//! Quarter-bit tick generator
//!
//! Counts down from the configured divisor once per step and emits a single
//! tick when the counter expires. Four ticks span one bit period.

/// Clock divider producing one tick every `divisor` steps
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickGenerator {
    /// Steps per quarter bit (always >= 1)
    divisor: u32,
    /// Steps left until the next tick, in [1, divisor] between steps
    counter: u32,
}

impl TickGenerator {
    /// Create a generator with the given divisor
    ///
    /// A divisor of 0 is treated as 1 (a tick on every step); use
    /// [`crate::BaudConfig::divisor`] to obtain a validated value.
    pub const fn new(divisor: u32) -> Self {
        let divisor = if divisor == 0 { 1 } else { divisor };
        Self {
            divisor,
            counter: divisor,
        }
    }

    /// Configured steps per tick
    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    /// Advance by one step
    ///
    /// Returns `true` on the step where the counter expires.
    pub fn step(&mut self) -> bool {
        self.counter = self.counter.saturating_sub(1);
        if self.counter == 0 {
            self.counter = self.divisor;
            true
        } else {
            false
        }
    }

    /// Reload the counter so the next tick is a full divisor away
    ///
    /// Called by the owning state machine when a frame starts so that tick
    /// boundaries line up with the frame edge.
    pub fn resync(&mut self) {
        self.counter = self.divisor;
    }
}
