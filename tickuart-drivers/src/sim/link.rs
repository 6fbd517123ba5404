//! Back-to-back serial link
//!
//! Two transceiver cores wired TX to RX in both directions, stepped in lock
//! step. Each wire has one step of delay, as if the far end registered it.
//! Bytes queued at either end are sent as soon as that transmitter is idle,
//! and bytes arriving at either end are acknowledged and collected
//! immediately, so overruns only happen if the collection buffer is full.

use heapless::{Deque, Vec};
use tickuart_core::{Inputs, Outputs, Uart};

use crate::stats::LinkStats;

/// One side of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum End {
    /// Drives the wire read by `B`
    A,
    /// Drives the wire read by `A`
    B,
}

/// Link simulation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Not enough room in the send queue for all bytes
    QueueFull,
    /// The link did not go idle within the step budget
    Timeout,
}

/// A transceiver plus its host-side buffers
#[derive(Debug)]
struct Port<const N: usize> {
    uart: Uart,
    last: Outputs,
    tx_queue: Deque<u8, N>,
    rx_buffer: Vec<u8, N>,
    read_pending: bool,
    stats: LinkStats,
    /// Bytes received while `rx_buffer` was full
    dropped: u32,
}

impl<const N: usize> Port<N> {
    fn new(uart: Uart) -> Self {
        Self {
            last: uart.status(),
            uart,
            tx_queue: Deque::new(),
            rx_buffer: Vec::new(),
            read_pending: false,
            stats: LinkStats::default(),
            dropped: 0,
        }
    }

    fn step(&mut self, serial_in: bool) {
        let request = if self.last.is_transmitting {
            None
        } else {
            self.tx_queue.front().copied()
        };

        let inputs = Inputs {
            serial_in,
            send_request: request.is_some(),
            tx_byte: request.unwrap_or(0),
            data_read: self.read_pending,
            ..Inputs::idle()
        };
        let out = self.uart.step(&inputs);

        if request.is_some() && out.is_transmitting {
            self.tx_queue.pop_front();
        }

        let lost = self.stats.record(&self.last, &out, inputs.data_read);
        if out.received && !lost && self.rx_buffer.push(out.rcvd_byte).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }

        self.read_pending = out.data_ready;
        self.last = out;
    }

    fn is_idle(&self) -> bool {
        self.tx_queue.is_empty()
            && !self.last.is_transmitting
            && !self.last.is_receiving
            && !self.read_pending
    }
}

/// Two cores connected back to back, with up to `N` bytes buffered per
/// direction and per end
#[derive(Debug)]
pub struct Link<const N: usize> {
    a: Port<N>,
    b: Port<N>,
    /// Forced levels for the wire driven by A and by B
    faults: [Option<bool>; 2],
    steps: u64,
}

impl<const N: usize> Link<N> {
    /// Wire two cores together
    pub fn new(a: Uart, b: Uart) -> Self {
        Self {
            a: Port::new(a),
            b: Port::new(b),
            faults: [None; 2],
            steps: 0,
        }
    }

    fn port(&self, end: End) -> &Port<N> {
        match end {
            End::A => &self.a,
            End::B => &self.b,
        }
    }

    fn port_mut(&mut self, end: End) -> &mut Port<N> {
        match end {
            End::A => &mut self.a,
            End::B => &mut self.b,
        }
    }

    /// Queue bytes for transmission from `end`
    ///
    /// Either all bytes are queued or none are.
    pub fn send(&mut self, end: End, bytes: &[u8]) -> Result<(), LinkError> {
        let queue = &mut self.port_mut(end).tx_queue;
        if queue.capacity() - queue.len() < bytes.len() {
            return Err(LinkError::QueueFull);
        }
        for &byte in bytes {
            queue.push_back(byte).map_err(|_| LinkError::QueueFull)?;
        }
        Ok(())
    }

    /// Bytes collected at `end` so far
    pub fn received(&self, end: End) -> &[u8] {
        &self.port(end).rx_buffer
    }

    /// Discard the bytes collected at `end`
    pub fn clear_received(&mut self, end: End) {
        self.port_mut(end).rx_buffer.clear();
    }

    /// Frame counters for `end`
    pub fn stats(&self, end: End) -> LinkStats {
        self.port(end).stats
    }

    /// Bytes received at `end` but dropped because its buffer was full
    pub fn dropped(&self, end: End) -> u32 {
        self.port(end).dropped
    }

    /// The core at `end`
    pub fn uart(&self, end: End) -> &Uart {
        &self.port(end).uart
    }

    /// Steps simulated so far
    pub fn elapsed(&self) -> u64 {
        self.steps
    }

    /// Force the wire driven by `end` to a fixed level, or release it
    pub fn force_line(&mut self, end: End, level: Option<bool>) {
        self.faults[end as usize] = level;
    }

    /// Level currently on the wire driven by `end`
    pub fn line(&self, end: End) -> bool {
        self.faults[end as usize].unwrap_or(self.port(end).last.serial_out)
    }

    /// Advance both ends by one step
    pub fn step(&mut self) {
        let a_line = self.line(End::A);
        let b_line = self.line(End::B);
        self.a.step(b_line);
        self.b.step(a_line);
        self.steps += 1;
    }

    /// Advance `steps` steps
    pub fn run(&mut self, steps: u32) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Nothing queued, in flight, or waiting to be collected at either end
    pub fn is_idle(&self) -> bool {
        self.a.is_idle() && self.b.is_idle()
    }

    /// Step until the link is idle, returning the number of steps taken
    pub fn run_until_idle(&mut self, max_steps: u32) -> Result<u32, LinkError> {
        for taken in 0..max_steps {
            if self.is_idle() {
                return Ok(taken);
            }
            self.step();
        }
        if self.is_idle() {
            Ok(max_steps)
        } else {
            Err(LinkError::Timeout)
        }
    }
}
