//! Receive state machine
//!
//! Samples the serial input at quarter-bit resolution. A falling edge while
//! idle starts a half-bit wait so that every later full-bit wait lands in the
//! middle of a bit cell:
//!
//! ```text
//!  line  ▔▔▔▔╲____start____╱▔▔ d0 ▔▔╲__ d1 __ ... ╱▔▔ stop ▔▔▔
//!  ticks      | | | | | | | | | | | | | ...
//!  sample         ^ (2)         ^ (+4)   ^ (+4) ...     ^
//! ```

use super::{DATA_BITS, HALF_BIT, QUARTERS_PER_BIT, RESTART_DELAY};
use crate::tick::TickGenerator;

/// Receiver states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Line idle, waiting for a falling edge
    Idle,
    /// Falling edge seen, waiting to re-sample mid start bit
    CheckStart,
    /// Shifting in data bits at mid-bit instants
    ReadBits,
    /// Waiting to sample the stop bit
    CheckStop,
    /// Framing error recovery wait
    DelayRestart,
    /// Framing error detected (lasts one step)
    Error,
    /// Byte complete (lasts one step)
    Received,
}

impl RxState {
    /// Check if a frame is in progress or being recovered from
    pub fn is_busy(&self) -> bool {
        !matches!(self, RxState::Idle)
    }
}

/// Outcome of a single receiver step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// Nothing to report this step
    None,
    /// A correctly framed byte completed this step
    Byte(u8),
    /// Start confirmation or stop bit check failed this step
    FramingError,
}

/// Receive state machine
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Receiver {
    state: RxState,
    ticks: TickGenerator,
    /// Quarter bits until the next sample point
    countdown: u8,
    /// Data bits shift in at the top, so the first (LSB) ends up at bit 0
    shift: u8,
    /// Only meaningful in `ReadBits`
    bits_remaining: u8,
}

impl Receiver {
    /// Create an idle receiver with the given steps-per-quarter-bit divisor
    pub const fn new(divisor: u32) -> Self {
        Self {
            state: RxState::Idle,
            ticks: TickGenerator::new(divisor),
            countdown: 0,
            shift: 0,
            bits_remaining: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> RxState {
        self.state
    }

    /// Check if a frame is being received (any state other than idle)
    pub fn is_receiving(&self) -> bool {
        self.state.is_busy()
    }

    /// Force the receiver back to idle
    ///
    /// The shift register and countdown are left as they are; the next
    /// frame overwrites them before use.
    pub fn reset(&mut self) {
        self.state = RxState::Idle;
    }

    /// Advance one step with the registered level of the serial input
    pub fn step(&mut self, serial_in: bool) -> RxEvent {
        if self.ticks.step() {
            self.countdown = self.countdown.saturating_sub(1);
        }

        match self.state {
            RxState::Idle => {
                if !serial_in {
                    self.ticks.resync();
                    self.countdown = HALF_BIT;
                    self.state = RxState::CheckStart;
                }
                RxEvent::None
            }
            RxState::CheckStart => {
                if self.countdown == 0 {
                    if serial_in {
                        // Pulse shorter than half a bit
                        self.state = RxState::Error;
                    } else {
                        self.countdown = QUARTERS_PER_BIT;
                        self.bits_remaining = DATA_BITS;
                        self.state = RxState::ReadBits;
                    }
                }
                RxEvent::None
            }
            RxState::ReadBits => {
                if self.countdown == 0 {
                    self.shift = ((serial_in as u8) << 7) | (self.shift >> 1);
                    self.countdown = QUARTERS_PER_BIT;
                    self.bits_remaining -= 1;
                    if self.bits_remaining == 0 {
                        self.state = RxState::CheckStop;
                    }
                }
                RxEvent::None
            }
            RxState::CheckStop => {
                if self.countdown == 0 {
                    self.state = if serial_in {
                        RxState::Received
                    } else {
                        RxState::Error
                    };
                }
                RxEvent::None
            }
            RxState::Received => {
                self.state = RxState::Idle;
                RxEvent::Byte(self.shift)
            }
            RxState::Error => {
                self.countdown = RESTART_DELAY;
                self.state = RxState::DelayRestart;
                RxEvent::FramingError
            }
            RxState::DelayRestart => {
                if self.countdown == 0 {
                    self.state = RxState::Idle;
                }
                RxEvent::None
            }
        }
    }
}
