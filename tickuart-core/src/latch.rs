//! Receive latch and overrun tracker
//!
//! Holds at most one unread byte between the receiver (producer) and an
//! external consumer. A byte that completes while the previous one is still
//! unread is dropped and flagged as an overrun, never queued.

use crate::config::OverrunPolicy;

/// Single-byte receive storage with data-ready and overrun flags
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxLatch {
    policy: OverrunPolicy,
    byte: u8,
    data_ready: bool,
    overrun: bool,
}

impl RxLatch {
    /// Create an empty latch
    pub const fn new(policy: OverrunPolicy) -> Self {
        Self {
            policy,
            byte: 0,
            data_ready: false,
            overrun: false,
        }
    }

    /// Last successfully stored byte
    pub fn byte(&self) -> u8 {
        self.byte
    }

    /// A byte is stored and has not been acknowledged
    pub fn data_ready(&self) -> bool {
        self.data_ready
    }

    /// A byte was lost because the previous one was unread
    pub fn overrun(&self) -> bool {
        self.overrun
    }

    /// How the overrun flag is cleared
    pub fn policy(&self) -> OverrunPolicy {
        self.policy
    }

    /// Offer a completed byte from the receiver
    ///
    /// Returns `true` if it was stored, `false` if it was dropped as an
    /// overrun.
    pub fn offer(&mut self, byte: u8) -> bool {
        if self.data_ready {
            self.overrun = true;
            false
        } else {
            self.byte = byte;
            self.data_ready = true;
            true
        }
    }

    /// Consumer read acknowledgment
    ///
    /// Clears data-ready; under [`OverrunPolicy::ClearOnRead`] also clears
    /// the overrun flag. A no-op when nothing is pending.
    pub fn acknowledge(&mut self) {
        self.data_ready = false;
        if self.policy == OverrunPolicy::ClearOnRead {
            self.overrun = false;
        }
    }

    /// Explicit overrun clear, honored under either policy
    pub fn clear_overrun(&mut self) {
        self.overrun = false;
    }

    /// Drop the pending byte and both flags
    pub fn reset(&mut self) {
        self.data_ready = false;
        self.overrun = false;
    }
}
