//! Configuration type definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Quarter-bit ticks per bit period
pub const TICKS_PER_BIT: u32 = crate::fsm::QUARTERS_PER_BIT as u32;

/// Largest accepted deviation of the achieved baud rate, in parts per thousand
///
/// Both ends of a link may be off in opposite directions, and the receiver
/// has a half-bit sampling margin spread over ten bit cells.
pub const MAX_RATE_ERROR_PERMILLE: u32 = 25;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Baud rate of zero requested
    ZeroBaudRate,
    /// Clock too slow to produce four ticks per bit at this baud rate
    ClockTooSlow,
    /// Achieved baud rate deviates too far from the requested one
    RateErrorTooHigh {
        /// Deviation in parts per thousand
        permille: u32,
    },
}

/// How the receive overrun flag is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OverrunPolicy {
    /// A read acknowledgment clears overrun together with data-ready
    #[default]
    ClearOnRead,
    /// Overrun stays set across reads until explicitly cleared
    Sticky,
}

/// Tick source frequency and desired baud rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BaudConfig {
    /// Step rate of the caller's scheduler in Hz
    pub clock_hz: u32,
    /// Desired baud rate in bits per second
    pub baud_rate: u32,
}

impl Default for BaudConfig {
    fn default() -> Self {
        Self {
            clock_hz: 12_000_000,
            baud_rate: 115_200,
        }
    }
}

impl BaudConfig {
    /// Create a new baud configuration
    pub const fn new(clock_hz: u32, baud_rate: u32) -> Self {
        Self {
            clock_hz,
            baud_rate,
        }
    }

    /// Steps per quarter-bit tick, rounded to nearest, before validation
    fn raw_divisor(&self) -> Result<u32, ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }

        let ticks_hz = self.baud_rate as u64 * TICKS_PER_BIT as u64;
        let divisor = (self.clock_hz as u64 + ticks_hz / 2) / ticks_hz;
        if divisor == 0 {
            return Err(ConfigError::ClockTooSlow);
        }

        // clock_hz / ticks_hz fits in u32 since ticks_hz >= 4
        Ok(divisor as u32)
    }

    /// Steps per quarter-bit tick
    ///
    /// `clock_hz / (baud_rate * 4)`, rounded to nearest, and rejected if the
    /// resulting rate is off by more than [`MAX_RATE_ERROR_PERMILLE`].
    pub fn divisor(&self) -> Result<u32, ConfigError> {
        let divisor = self.raw_divisor()?;
        let permille = self.rate_error_permille()?;
        if permille > MAX_RATE_ERROR_PERMILLE {
            return Err(ConfigError::RateErrorTooHigh { permille });
        }
        Ok(divisor)
    }

    /// Baud rate actually produced by the rounded divisor
    pub fn actual_baud_rate(&self) -> Result<u32, ConfigError> {
        let divisor = self.raw_divisor()?;
        let period = divisor as u64 * TICKS_PER_BIT as u64;
        Ok((self.clock_hz as u64 / period) as u32)
    }

    /// Deviation of the achieved rate from the requested one (‰)
    pub fn rate_error_permille(&self) -> Result<u32, ConfigError> {
        let actual = self.actual_baud_rate()? as u64;
        let wanted = self.baud_rate as u64;
        Ok((actual.abs_diff(wanted) * 1000 / wanted) as u32)
    }
}

/// Complete transceiver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartConfig {
    /// Timing parameters
    pub baud: BaudConfig,
    /// Overrun clearing behavior
    pub overrun: OverrunPolicy,
}

impl UartConfig {
    /// Create a config with the default overrun policy
    pub const fn new(baud: BaudConfig) -> Self {
        Self {
            baud,
            overrun: OverrunPolicy::ClearOnRead,
        }
    }

    /// Use a different overrun policy
    pub const fn with_overrun(mut self, overrun: OverrunPolicy) -> Self {
        self.overrun = overrun;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_bit_matches_state_machines() {
        assert_eq!(TICKS_PER_BIT, crate::fsm::QUARTERS_PER_BIT as u32);
        // Eleven bit periods per frame, guard time included
        assert_eq!(crate::fsm::frame_steps(1), 11 * TICKS_PER_BIT);
    }

    #[test]
    fn test_exact_divisor() {
        let cfg = BaudConfig::new(1_843_200, 115_200);
        assert_eq!(cfg.divisor(), Ok(4));
        assert_eq!(cfg.actual_baud_rate(), Ok(115_200));
        assert_eq!(cfg.rate_error_permille(), Ok(0));
    }

    #[test]
    fn test_default_config() {
        let cfg = BaudConfig::default();
        // 12 MHz / 460800 = 26.04
        assert_eq!(cfg.divisor(), Ok(26));
        assert_eq!(cfg.rate_error_permille(), Ok(1));
    }

    #[test]
    fn test_divisor_rounds_to_nearest() {
        // 103 kHz / 4 kHz = 25.75; 101 kHz / 4 kHz = 25.25
        assert_eq!(BaudConfig::new(103_000, 1000).divisor(), Ok(26));
        assert_eq!(BaudConfig::new(101_000, 1000).divisor(), Ok(25));
    }

    #[test]
    fn test_zero_baud_rate() {
        let cfg = BaudConfig::new(1_000_000, 0);
        assert_eq!(cfg.divisor(), Err(ConfigError::ZeroBaudRate));
    }

    #[test]
    fn test_clock_too_slow() {
        let cfg = BaudConfig::new(100_000, 115_200);
        assert_eq!(cfg.divisor(), Err(ConfigError::ClockTooSlow));
    }

    #[test]
    fn test_rate_error_too_high() {
        // 600 kHz / 460800 = 1.3 -> 1, actual 150000 (302 ‰ off)
        let cfg = BaudConfig::new(600_000, 115_200);
        assert_eq!(
            cfg.divisor(),
            Err(ConfigError::RateErrorTooHigh { permille: 302 })
        );
    }

    #[test]
    fn test_uart_config_builder() {
        let cfg = UartConfig::new(BaudConfig::new(1_843_200, 9600))
            .with_overrun(OverrunPolicy::Sticky);
        assert_eq!(cfg.overrun, OverrunPolicy::Sticky);
        assert_eq!(cfg.baud.divisor(), Ok(48));
        assert_eq!(UartConfig::default().overrun, OverrunPolicy::ClearOnRead);
    }
}
