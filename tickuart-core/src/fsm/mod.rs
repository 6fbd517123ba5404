//! Bit-timing and framing state machines
//!
//! Both machines are explicit, finite and deterministic. Each owns its own
//! [`TickGenerator`](crate::tick::TickGenerator) and a quarter-bit countdown
//! that is decremented on every tick; states that wait for a sample point
//! act on the first step where the countdown reads zero.

pub mod rx;
pub mod tx;

pub use rx::{Receiver, RxEvent, RxState};
pub use tx::{Transmitter, TxState};

/// Data bits per frame
pub const DATA_BITS: u8 = 8;

/// Countdown for one full bit period
pub const QUARTERS_PER_BIT: u8 = 4;

/// Countdown from a falling edge to the middle of the start bit
pub const HALF_BIT: u8 = QUARTERS_PER_BIT / 2;

/// Countdown spent in `DelayRestart` (two bit periods)
pub const RESTART_DELAY: u8 = 2 * QUARTERS_PER_BIT;

/// Steps spanned by one full transmitted frame, including the guard time
///
/// Start bit, data bits, then the two-bit-period stop/guard delay.
pub const fn frame_steps(divisor: u32) -> u32 {
    ((1 + DATA_BITS as u32) * QUARTERS_PER_BIT as u32 + RESTART_DELAY as u32) * divisor
}
