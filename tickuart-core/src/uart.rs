//! Top-level transceiver
//!
//! Owns both state machines and the receive latch, and advances all of them
//! exactly once per call to [`Uart::step`]. Inputs are taken as a snapshot so
//! every piece of logic sees the same levels within a step; the returned
//! [`Outputs`] are what the surrounding system observes until the next step.

use crate::config::{ConfigError, OverrunPolicy, UartConfig};
use crate::fsm::{Receiver, RxEvent, Transmitter};
use crate::latch::RxLatch;

/// Levels sampled once at the start of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Inputs {
    /// Synchronous reset, active while asserted
    pub reset: bool,
    /// Raw incoming serial line (idle high)
    pub serial_in: bool,
    /// Request to begin transmitting `tx_byte`
    pub send_request: bool,
    /// Byte to transmit, latched when a request is accepted
    pub tx_byte: u8,
    /// Acknowledges the received byte
    pub data_read: bool,
    /// Explicitly clears the overrun flag
    pub overrun_clear: bool,
}

impl Default for Inputs {
    fn default() -> Self {
        Self::idle()
    }
}

impl Inputs {
    /// Idle line, no requests
    pub const fn idle() -> Self {
        Self {
            reset: false,
            serial_in: true,
            send_request: false,
            tx_byte: 0,
            data_read: false,
            overrun_clear: false,
        }
    }

    /// Idle inputs with the given serial line level
    pub const fn line(serial_in: bool) -> Self {
        let mut inputs = Self::idle();
        inputs.serial_in = serial_in;
        inputs
    }
}

/// State visible to the surrounding system after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Outputs {
    /// Outgoing serial line (idle high)
    pub serial_out: bool,
    /// Transmit path busy
    pub is_transmitting: bool,
    /// Receive path busy (frame or error recovery in progress)
    pub is_receiving: bool,
    /// An unread byte is in `rcvd_byte`
    pub data_ready: bool,
    /// Last successfully received byte
    pub rcvd_byte: u8,
    /// Framing error, true for one step
    pub recv_error: bool,
    /// A byte was lost because the previous one was unread
    pub rcvr_overrun: bool,
    /// A frame completed this step (stored or lost to overrun)
    pub received: bool,
}

/// 8N1 transceiver core
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uart {
    rx: Receiver,
    tx: Transmitter,
    latch: RxLatch,
    divisor: u32,
}

impl Uart {
    /// Create a transceiver from a validated configuration
    pub fn new(config: &UartConfig) -> Result<Self, ConfigError> {
        let divisor = config.baud.divisor()?;
        Ok(Self::with_divisor(divisor, config.overrun))
    }

    /// Create a transceiver with a raw steps-per-quarter-bit divisor
    ///
    /// A divisor of 0 is treated as 1, as in
    /// [`TickGenerator::new`](crate::tick::TickGenerator::new).
    pub const fn with_divisor(divisor: u32, policy: OverrunPolicy) -> Self {
        let divisor = if divisor == 0 { 1 } else { divisor };
        Self {
            rx: Receiver::new(divisor),
            tx: Transmitter::new(divisor),
            latch: RxLatch::new(policy),
            divisor,
        }
    }

    /// Apply a new configuration
    ///
    /// The divisor must be recomputed whenever the step rate or the baud
    /// rate changes. Both paths are reset; any frame in flight is lost.
    pub fn reconfigure(&mut self, config: &UartConfig) -> Result<(), ConfigError> {
        *self = Self::new(config)?;
        Ok(())
    }

    /// Steps per quarter-bit tick
    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    /// Receive state machine
    pub fn receiver(&self) -> &Receiver {
        &self.rx
    }

    /// Transmit state machine
    pub fn transmitter(&self) -> &Transmitter {
        &self.tx
    }

    /// Receive latch
    pub fn latch(&self) -> &RxLatch {
        &self.latch
    }

    /// Current outputs without advancing; one-step pulses read as false
    pub fn status(&self) -> Outputs {
        self.outputs(false, false)
    }

    /// Advance everything by one step
    pub fn step(&mut self, inputs: &Inputs) -> Outputs {
        if inputs.reset {
            self.rx.reset();
            self.tx.reset();
            self.latch.reset();
            return self.outputs(false, false);
        }

        // Acknowledge before the receiver offers, so a byte completing on
        // the same step as the read is stored rather than lost
        if inputs.data_read {
            self.latch.acknowledge();
        }
        if inputs.overrun_clear {
            self.latch.clear_overrun();
        }

        let (recv_error, received) = match self.rx.step(inputs.serial_in) {
            RxEvent::None => (false, false),
            RxEvent::Byte(byte) => {
                self.latch.offer(byte);
                (false, true)
            }
            RxEvent::FramingError => (true, false),
        };

        self.tx.step(inputs.send_request.then_some(inputs.tx_byte));

        self.outputs(recv_error, received)
    }

    fn outputs(&self, recv_error: bool, received: bool) -> Outputs {
        Outputs {
            serial_out: self.tx.serial_out(),
            is_transmitting: self.tx.is_transmitting(),
            is_receiving: self.rx.is_receiving(),
            data_ready: self.latch.data_ready(),
            rcvd_byte: self.latch.byte(),
            recv_error,
            rcvr_overrun: self.latch.overrun(),
            received,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaudConfig;
    use crate::fsm::frame_steps;

    const DIV: u32 = 2;
    const BIT: u32 = 4 * DIV;

    /// Line level `at` steps after the start edge of a frame carrying `byte`
    fn line_level(byte: u8, at: u32, stop: bool) -> bool {
        match at / BIT {
            0 => false,
            cell @ 1..=8 => (byte >> (cell - 1)) & 1 == 1,
            9 => stop,
            _ => true,
        }
    }

    /// What a frame produced on the outputs
    #[derive(Debug, Default)]
    struct Trace {
        recv_errors: usize,
        received: usize,
        first_ready_at: Option<u32>,
        last: Option<Outputs>,
    }

    /// Feed one frame followed by idle line, long enough for any error
    /// recovery to finish
    fn drive(uart: &mut Uart, byte: u8, stop: bool) -> Trace {
        let mut trace = Trace::default();
        for at in 0..13 * BIT {
            let out = uart.step(&Inputs::line(line_level(byte, at, stop)));
            trace.recv_errors += out.recv_error as usize;
            trace.received += out.received as usize;
            if out.data_ready && trace.first_ready_at.is_none() {
                trace.first_ready_at = Some(at);
            }
            trace.last = Some(out);
        }
        trace
    }

    /// Send `byte` with the output looped back to the input (one step of
    /// wire delay), then acknowledge whatever arrived
    fn loopback(uart: &mut Uart, line: &mut bool, byte: u8) -> Option<u8> {
        let mut received = None;
        let mut out = uart.step(&Inputs {
            serial_in: *line,
            send_request: true,
            tx_byte: byte,
            ..Inputs::idle()
        });
        for _ in 0..=frame_steps(DIV) {
            *line = out.serial_out;
            if out.data_ready && received.is_none() {
                received = Some(out.rcvd_byte);
            }
            if !out.is_transmitting {
                break;
            }
            out = uart.step(&Inputs::line(*line));
        }
        uart.step(&Inputs {
            serial_in: *line,
            data_read: true,
            ..Inputs::idle()
        });
        received
    }

    #[test]
    fn test_new_from_config() {
        let uart = Uart::new(&UartConfig::new(BaudConfig::new(1_843_200, 115_200))).unwrap();
        assert_eq!(uart.divisor(), 4);

        let bad = UartConfig::new(BaudConfig::new(1_000, 115_200));
        assert_eq!(Uart::new(&bad).err(), Some(ConfigError::ClockTooSlow));
    }

    #[test]
    fn test_receive_frame() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        let trace = drive(&mut uart, 0x5A, true);
        let last = trace.last.unwrap();

        assert_eq!(trace.received, 1);
        assert_eq!(trace.recv_errors, 0);
        assert!(last.data_ready);
        assert_eq!(last.rcvd_byte, 0x5A);
        assert!(!last.is_receiving);
        // Within the stop bit
        assert!(trace.first_ready_at.unwrap() < 10 * BIT);
    }

    #[test]
    fn test_loopback_all_bytes() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        let mut line = true;
        for byte in 0..=255u8 {
            assert_eq!(loopback(&mut uart, &mut line, byte), Some(byte));
        }
        assert!(!uart.latch().overrun());
    }

    #[test]
    fn test_stop_bit_low() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        let trace = drive(&mut uart, 0xC3, false);

        assert_eq!(trace.recv_errors, 1);
        assert_eq!(trace.received, 0);
        assert_eq!(trace.first_ready_at, None);

        // Receiver re-arms for the next frame
        let trace = drive(&mut uart, 0x3C, true);
        assert_eq!(trace.last.unwrap().rcvd_byte, 0x3C);
    }

    #[test]
    fn test_overrun_clear_on_read() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        drive(&mut uart, 0x11, true);
        let trace = drive(&mut uart, 0x22, true);
        let last = trace.last.unwrap();

        assert_eq!(trace.received, 1);
        assert!(last.rcvr_overrun);
        assert!(last.data_ready);
        assert_eq!(last.rcvd_byte, 0x11);

        let out = uart.step(&Inputs {
            data_read: true,
            ..Inputs::idle()
        });
        assert!(!out.data_ready);
        assert!(!out.rcvr_overrun);
    }

    #[test]
    fn test_overrun_sticky() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::Sticky);
        drive(&mut uart, 0x11, true);
        drive(&mut uart, 0x22, true);

        let read = Inputs {
            data_read: true,
            ..Inputs::idle()
        };
        let out = uart.step(&read);
        assert!(!out.data_ready);
        assert!(out.rcvr_overrun);

        // Persists across further successful receptions
        let last = drive(&mut uart, 0x33, true).last.unwrap();
        assert_eq!(last.rcvd_byte, 0x33);
        assert!(last.rcvr_overrun);
        uart.step(&read);
        let last = drive(&mut uart, 0x44, true).last.unwrap();
        assert_eq!(last.rcvd_byte, 0x44);
        assert!(last.rcvr_overrun);

        let out = uart.step(&Inputs {
            overrun_clear: true,
            ..Inputs::idle()
        });
        assert!(!out.rcvr_overrun);
        assert!(out.data_ready);
    }

    #[test]
    fn test_read_on_completion_step_is_not_overrun() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        drive(&mut uart, 0x01, true);

        // Find the step on which the second frame completes
        let mut probe = uart.clone();
        let done_at = (0..13 * BIT)
            .find(|&at| probe.step(&Inputs::line(line_level(0x02, at, true))).received)
            .unwrap();

        for at in 0..13 * BIT {
            let out = uart.step(&Inputs {
                serial_in: line_level(0x02, at, true),
                data_read: at == done_at,
                ..Inputs::idle()
            });
            if at == done_at {
                assert!(out.received);
                assert!(out.data_ready);
                assert_eq!(out.rcvd_byte, 0x02);
                assert!(!out.rcvr_overrun);
            }
        }
    }

    #[test]
    fn test_transmitting_span() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        let mut busy = 0;
        let mut inputs = Inputs {
            send_request: true,
            tx_byte: 0x80,
            ..Inputs::idle()
        };
        for _ in 0..2 * frame_steps(DIV) {
            busy += uart.step(&inputs).is_transmitting as u32;
            inputs.send_request = false;
        }

        // Start + 8 data + 2 stop-bit periods
        assert_eq!(busy, 11 * BIT);
        assert_eq!(busy, frame_steps(DIV));
    }

    #[test]
    fn test_send_request_while_busy_ignored() {
        let mut a = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        let mut b = a.clone();
        let start = Inputs {
            send_request: true,
            tx_byte: 0x96,
            ..Inputs::idle()
        };
        a.step(&start);
        b.step(&start);

        let spam = Inputs {
            tx_byte: 0x00,
            ..start
        };
        for _ in 1..frame_steps(DIV) {
            let out_a = a.step(&Inputs::idle());
            let out_b = b.step(&spam);
            assert_eq!(out_a.serial_out, out_b.serial_out);
            assert!(out_b.is_transmitting);
        }
    }

    #[test]
    fn test_data_read_idempotent() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        let read = Inputs {
            data_read: true,
            ..Inputs::idle()
        };
        let before = uart.step(&Inputs::idle());
        for _ in 0..10 {
            assert_eq!(uart.step(&read), before);
        }
    }

    #[test]
    fn test_reset() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::Sticky);
        drive(&mut uart, 0x11, true);
        drive(&mut uart, 0x22, true);

        // Mid transmit and mid receive
        uart.step(&Inputs {
            serial_in: false,
            send_request: true,
            tx_byte: 0x00,
            ..Inputs::idle()
        });
        let out = uart.step(&Inputs {
            reset: true,
            serial_in: false,
            ..Inputs::idle()
        });

        assert!(out.serial_out);
        assert!(!out.is_transmitting);
        assert!(!out.is_receiving);
        assert!(!out.data_ready);
        assert!(!out.rcvr_overrun);
        assert!(!out.recv_error);
    }

    #[test]
    fn test_zero_divisor_clamped() {
        let mut uart = Uart::with_divisor(0, OverrunPolicy::ClearOnRead);
        assert_eq!(uart.divisor(), 1);
        assert_eq!(frame_steps(uart.divisor()), 44);

        let mut busy = 0;
        let mut out = uart.step(&Inputs {
            send_request: true,
            tx_byte: 0x5A,
            ..Inputs::idle()
        });
        while out.is_transmitting {
            busy += 1;
            out = uart.step(&Inputs::idle());
        }
        assert_eq!(busy, frame_steps(uart.divisor()));
    }

    #[test]
    fn test_reconfigure() {
        let mut uart = Uart::with_divisor(DIV, OverrunPolicy::ClearOnRead);
        let config = UartConfig::new(BaudConfig::new(1_843_200, 9600))
            .with_overrun(OverrunPolicy::Sticky);
        uart.reconfigure(&config).unwrap();

        assert_eq!(uart.divisor(), 48);
        assert_eq!(uart.latch().policy(), OverrunPolicy::Sticky);
    }
}
