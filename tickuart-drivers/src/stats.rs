//! Per-link frame counters

use tickuart_core::Outputs;

/// Frame counters for one end of a serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames stored in the receive latch
    pub frames_received: u32,
    /// Start or stop bit failures
    pub framing_errors: u32,
    /// Frames dropped because the previous byte was unread
    pub overruns: u32,
    /// Frames fully transmitted, guard time included
    pub frames_sent: u32,
}

impl LinkStats {
    /// Account for one step
    ///
    /// `prev` are the outputs of the previous step and `acked` whether the
    /// step carried a read acknowledgment. Returns `true` if a frame was
    /// dropped as an overrun on this step.
    pub fn record(&mut self, prev: &Outputs, out: &Outputs, acked: bool) -> bool {
        let mut lost = false;

        if out.received {
            // The acknowledgment is applied before the new byte is offered
            if prev.data_ready && !acked {
                self.overruns = self.overruns.saturating_add(1);
                lost = true;
            } else {
                self.frames_received = self.frames_received.saturating_add(1);
            }
        }

        if out.recv_error {
            self.framing_errors = self.framing_errors.saturating_add(1);
        }

        if prev.is_transmitting && !out.is_transmitting {
            self.frames_sent = self.frames_sent.saturating_add(1);
        }

        lost
    }

    /// Total frames seen on the receive side, good or bad
    pub fn frames_seen(&self) -> u32 {
        self.frames_received
            .saturating_add(self.framing_errors)
            .saturating_add(self.overruns)
    }
}
