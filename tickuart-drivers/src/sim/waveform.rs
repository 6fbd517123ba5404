//! Serial line waveform generator
//!
//! Produces the line level, one step at a time, for a sequence of 8N1
//! frames. Each frame is followed by an optional idle gap:
//!
//! ```text
//!  ▔▔╲_start_╱ d0 ╲ d1 ... d7 ╱▔ stop ▔▔ gap ▔▔╲_start_ ...
//! ```

use tickuart_core::config::TICKS_PER_BIT;

/// Line levels for a sequence of frames
#[derive(Debug, Clone)]
pub struct Waveform<'a> {
    bytes: &'a [u8],
    /// Steps per bit cell
    bit_len: u32,
    /// Idle steps after each stop bit
    gap: u32,
    /// Level driven during the stop bit
    stop_level: bool,
    frame: usize,
    at: u32,
}

impl<'a> Waveform<'a> {
    /// Frames for `bytes` at the bit period implied by `divisor`
    pub fn new(bytes: &'a [u8], divisor: u32) -> Self {
        Self {
            bytes,
            bit_len: divisor.max(1) * TICKS_PER_BIT,
            gap: 0,
            stop_level: true,
            frame: 0,
            at: 0,
        }
    }

    /// Insert `steps` of idle line after every frame
    pub fn with_gap(mut self, steps: u32) -> Self {
        self.gap = steps;
        self
    }

    /// Override the bit cell length, e.g. to model a sender running fast
    /// or slow relative to the receiver
    pub fn with_bit_len(mut self, steps: u32) -> Self {
        self.bit_len = steps.max(1);
        self
    }

    /// Hold the stop bit low, producing a framing error on every frame
    pub fn with_broken_stop(mut self) -> Self {
        self.stop_level = false;
        self
    }

    /// Steps per frame, gap included
    pub fn frame_len(&self) -> u32 {
        10 * self.bit_len + self.gap
    }

    /// Steps remaining until the waveform ends
    fn remaining(&self) -> usize {
        let frames_left = self.bytes.len().saturating_sub(self.frame);
        if frames_left == 0 {
            return 0;
        }
        frames_left * self.frame_len() as usize - self.at as usize
    }
}

impl Iterator for Waveform<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let byte = *self.bytes.get(self.frame)?;

        let level = match self.at / self.bit_len {
            0 => false,
            cell @ 1..=8 => (byte >> (cell - 1)) & 1 == 1,
            9 => self.stop_level,
            _ => true,
        };

        self.at += 1;
        if self.at == self.frame_len() {
            self.at = 0;
            self.frame += 1;
        }

        Some(level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Waveform<'_> {}
