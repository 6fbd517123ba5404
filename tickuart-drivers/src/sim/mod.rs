//! Discrete-time simulation
//!
//! Drives transceiver cores from an explicit step loop instead of a timer
//! interrupt. Used for host testing and for exercising a configuration
//! before it goes onto hardware.

pub mod link;
pub mod waveform;

pub use link::{End, Link, LinkError};
pub use waveform::Waveform;
