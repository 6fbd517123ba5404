//! Bit-banged UART over GPIO pins
//!
//! Drives the transceiver core from a periodic timer interrupt. Each call to
//! [`SoftUart::poll`] samples the RX pin once, advances the core by one step
//! and writes the resulting level to the TX pin.
//!
//! # Usage
//!
//! The timer must fire at the configured step rate (`BaudConfig::clock_hz`).
//!
//! ```ignore
//! let config = UartConfig::new(BaudConfig::new(38_400, 9600));
//! let mut uart = SoftUart::new(rx_pin, tx_pin, &config)?;
//!
//! // In the timer interrupt:
//! uart.poll()?;
//!
//! // In the main loop:
//! if let Ok(Some(byte)) = uart.try_read() {
//!     let _ = uart.try_write(byte); // echo
//! }
//! ```

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use tickuart_core::{ConfigError, Inputs, Outputs, Uart, UartConfig};

use crate::stats::LinkStats;

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError<E> {
    /// Transmitter busy or a byte is already waiting to go out
    Busy,
    /// At least one received byte was lost (reported once, then cleared)
    Overrun,
    /// GPIO access failed
    Pin(E),
}

/// Software UART on a pair of GPIO pins
pub struct SoftUart<RX, TX> {
    rx_pin: RX,
    tx_pin: TX,
    core: Uart,
    /// Outputs of the most recent step
    last: Outputs,
    /// Byte waiting for the transmitter to accept it
    pending_tx: Option<u8>,
    /// Read acknowledgment to present on the next step
    read_ack: bool,
    /// Overrun clear to present on the next step
    overrun_ack: bool,
    stats: LinkStats,
}

impl<RX, TX, E> SoftUart<RX, TX>
where
    RX: InputPin<Error = E>,
    TX: OutputPin<Error = E>,
{
    /// Create a driver; the TX pin is driven to the idle (high) level on the
    /// first poll
    pub fn new(rx_pin: RX, tx_pin: TX, config: &UartConfig) -> Result<Self, ConfigError> {
        let core = Uart::new(config)?;
        Ok(Self {
            rx_pin,
            tx_pin,
            last: core.status(),
            core,
            pending_tx: None,
            read_ack: false,
            overrun_ack: false,
            stats: LinkStats::default(),
        })
    }

    /// Release the pins
    pub fn release(self) -> (RX, TX) {
        (self.rx_pin, self.tx_pin)
    }

    /// Frame counters since creation
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// The underlying transceiver
    pub fn core(&self) -> &Uart {
        &self.core
    }

    /// Transmitter busy or a byte is waiting to be accepted
    pub fn is_busy(&self) -> bool {
        self.pending_tx.is_some() || self.last.is_transmitting
    }

    /// Advance one step; call from the timer interrupt
    pub fn poll(&mut self) -> Result<(), UartError<E>> {
        let serial_in = self.rx_pin.is_high().map_err(UartError::Pin)?;

        let inputs = Inputs {
            reset: false,
            serial_in,
            send_request: self.pending_tx.is_some(),
            tx_byte: self.pending_tx.unwrap_or(0),
            data_read: core::mem::take(&mut self.read_ack),
            overrun_clear: core::mem::take(&mut self.overrun_ack),
        };

        let out = self.core.step(&inputs);
        if inputs.send_request && !self.last.is_transmitting && out.is_transmitting {
            self.pending_tx = None;
        }

        // The core has already consumed this step's acknowledgments, so the
        // bookkeeping must land even if the pin write fails
        let written = self.tx_pin.set_state(PinState::from(out.serial_out));

        let lost = self.stats.record(&self.last, &out, inputs.data_read);
        log_step(&out, lost);
        self.last = out;

        written.map_err(UartError::Pin)
    }

    /// Queue a byte for transmission
    ///
    /// Fails with [`UartError::Busy`] until the previous frame, including its
    /// guard time, has gone out.
    pub fn try_write(&mut self, byte: u8) -> Result<(), UartError<E>> {
        if self.is_busy() {
            return Err(UartError::Busy);
        }
        self.pending_tx = Some(byte);
        Ok(())
    }

    /// Take the received byte, if any
    ///
    /// A pending overrun is reported first, once; the byte that was kept
    /// is returned by the next call.
    pub fn try_read(&mut self) -> Result<Option<u8>, UartError<E>> {
        if self.last.rcvr_overrun && !self.overrun_ack {
            self.overrun_ack = true;
            return Err(UartError::Overrun);
        }

        if self.last.data_ready && !self.read_ack {
            self.read_ack = true;
            return Ok(Some(self.last.rcvd_byte));
        }

        Ok(None)
    }

    /// Reset both paths, dropping any pending or in-flight bytes
    pub fn reset(&mut self) -> Result<(), UartError<E>> {
        let out = self.core.step(&Inputs {
            reset: true,
            ..Inputs::idle()
        });
        self.pending_tx = None;
        self.read_ack = false;
        self.overrun_ack = false;
        self.last = out;
        self.tx_pin.set_high().map_err(UartError::Pin)
    }
}

#[cfg(feature = "defmt")]
fn log_step(out: &Outputs, lost: bool) {
    if lost {
        defmt::warn!("soft uart: overrun, byte dropped");
    } else if out.received {
        defmt::trace!("soft uart: received {=u8:#x}", out.rcvd_byte);
    }
    if out.recv_error {
        defmt::warn!("soft uart: framing error");
    }
}

#[cfg(not(feature = "defmt"))]
fn log_step(_out: &Outputs, _lost: bool) {}
