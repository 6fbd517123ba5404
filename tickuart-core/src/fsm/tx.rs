//! Transmit state machine
//!
//! On request, drives a start bit, shifts out 8 data bits LSB first, then
//! holds the line high for two bit periods of stop/guard time before
//! accepting the next byte.

use super::{DATA_BITS, QUARTERS_PER_BIT, RESTART_DELAY};
use crate::tick::TickGenerator;

/// Transmitter states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    /// Line held high, ready for a request
    Idle,
    /// Start bit or data bits on the line
    Sending,
    /// Stop bit and guard time
    DelayRestart,
}

/// Transmit state machine
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transmitter {
    state: TxState,
    ticks: TickGenerator,
    countdown: u8,
    shift: u8,
    bits_remaining: u8,
    /// Current serial output level
    out: bool,
}

impl Transmitter {
    /// Create an idle transmitter with the given steps-per-quarter-bit divisor
    pub const fn new(divisor: u32) -> Self {
        Self {
            state: TxState::Idle,
            ticks: TickGenerator::new(divisor),
            countdown: 0,
            shift: 0,
            bits_remaining: 0,
            out: true,
        }
    }

    /// Current state
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Busy from the step a request is accepted until the guard time ends
    pub fn is_transmitting(&self) -> bool {
        self.state != TxState::Idle
    }

    /// Current level of the serial output
    pub fn serial_out(&self) -> bool {
        self.out
    }

    /// Force the transmitter back to idle with the line high
    pub fn reset(&mut self) {
        self.state = TxState::Idle;
        self.out = true;
    }

    /// Advance one step
    ///
    /// `request` carries the byte to send while a send request is asserted.
    /// It is only honored in `Idle`; otherwise it is ignored. Returns the
    /// serial output level for this step.
    pub fn step(&mut self, request: Option<u8>) -> bool {
        if self.ticks.step() {
            self.countdown = self.countdown.saturating_sub(1);
        }

        match self.state {
            TxState::Idle => {
                if let Some(byte) = request {
                    self.shift = byte;
                    self.ticks.resync();
                    self.countdown = QUARTERS_PER_BIT;
                    self.out = false;
                    self.bits_remaining = DATA_BITS;
                    self.state = TxState::Sending;
                }
            }
            TxState::Sending => {
                if self.countdown == 0 {
                    if self.bits_remaining != 0 {
                        self.bits_remaining -= 1;
                        self.out = self.shift & 1 == 1;
                        self.shift >>= 1;
                        self.countdown = QUARTERS_PER_BIT;
                    } else {
                        self.out = true;
                        self.countdown = RESTART_DELAY;
                        self.state = TxState::DelayRestart;
                    }
                }
            }
            TxState::DelayRestart => {
                if self.countdown == 0 {
                    self.state = TxState::Idle;
                }
            }
        }

        self.out
    }
}
