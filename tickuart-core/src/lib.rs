//! Board-agnostic 8N1 serial transceiver core
//!
//! This crate contains the timing and framing logic of a bit-level UART,
//! independent of any pin or timer hardware:
//!
//! - Quarter-bit tick generation (clock divider)
//! - Receive state machine (start detection, mid-bit sampling, stop check)
//! - Transmit state machine (start, 8 data bits LSB first, stop/guard time)
//! - Single-byte receive latch with overrun tracking
//! - Top-level transceiver stepped once per timing step
//! - Baud rate configuration and divisor calculation
//!
//! # Timing model
//!
//! ```text
//!  step ──► TickGenerator ──► tick every `divisor` steps (4 per bit)
//!                 │
//!                 ▼
//!  countdown (quarter bits) ──► FSM acts when countdown reaches 0
//! ```
//!
//! Every call to [`Uart::step`] advances both tick generators and both state
//! machines by exactly one step.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod fsm;
pub mod latch;
pub mod tick;
pub mod uart;

pub use config::{BaudConfig, ConfigError, OverrunPolicy, UartConfig};
pub use fsm::{Receiver, RxEvent, RxState, Transmitter, TxState};
pub use latch::RxLatch;
pub use tick::TickGenerator;
pub use uart::{Inputs, Outputs, Uart};
