//! Drivers for the tickuart core
//!
//! This crate binds the board-agnostic transceiver in `tickuart-core` to
//! the outside world:
//!
//! - Bit-banged UART over `embedded-hal` digital pins, polled from a timer
//! - Link statistics shared by the driver and the simulator
//! - Discrete-time simulation (waveform generator, back-to-back link)

#![no_std]
#![deny(unsafe_code)]

pub mod sim;
pub mod soft_uart;
pub mod stats;

pub use soft_uart::{SoftUart, UartError};
pub use stats::LinkStats;
