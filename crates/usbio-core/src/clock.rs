//! Bus clock selection
//!
//! The FT4222H derives its SPI clock from one of four system clocks
//! (60/24/48/80 MHz) divided by a power of two (2 to 512). Requested
//! frequencies are quantized against a fixed breakpoint table rather
//! than searched, because one band of the table carries a hardware
//! erratum work-around that no closed-form search would produce.

use core::fmt;

/// Default bus frequency in kHz used before the first `set_frequency`
pub const DEFAULT_FREQUENCY_KHZ: u64 = 10_000;

/// System clock options (base frequencies)
///
/// Discriminants are the FT4222H clock register index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemClock {
    /// 60 MHz system clock
    Clock60MHz = 0,
    /// 24 MHz system clock
    Clock24MHz = 1,
    /// 48 MHz system clock
    Clock48MHz = 2,
    /// 80 MHz system clock
    Clock80MHz = 3,
}

impl SystemClock {
    /// Get the frequency in Hz
    pub fn hz(self) -> u32 {
        match self {
            SystemClock::Clock60MHz => 60_000_000,
            SystemClock::Clock24MHz => 24_000_000,
            SystemClock::Clock48MHz => 48_000_000,
            SystemClock::Clock80MHz => 80_000_000,
        }
    }

    /// Get the register index value
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SystemClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MHz", self.hz() / 1_000_000)
    }
}

/// Clock divisor (power of 2)
///
/// Discriminants are the FT4222H SPI clock divider code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockDivisor {
    /// Divide by 2
    Div2 = 1,
    /// Divide by 4
    Div4 = 2,
    /// Divide by 8
    Div8 = 3,
    /// Divide by 16
    Div16 = 4,
    /// Divide by 32
    Div32 = 5,
    /// Divide by 64
    Div64 = 6,
    /// Divide by 128
    Div128 = 7,
    /// Divide by 256
    Div256 = 8,
    /// Divide by 512
    Div512 = 9,
}

impl ClockDivisor {
    /// Get the actual divisor value
    pub fn divisor(self) -> u32 {
        1 << (self as u32)
    }

    /// Get the register value
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ClockDivisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.divisor())
    }
}

/// Quantized clock configuration for one frequency request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    /// Frequency the caller asked for, in Hz
    pub requested_hz: u64,
    /// System clock selection
    pub sys_clock: SystemClock,
    /// Clock divisor
    pub divisor: ClockDivisor,
    /// Frequency reported for this selection, in Hz
    ///
    /// This is the table value, not `sys_clock / divisor`; the two differ
    /// for the rounded 117.18 kHz step.
    pub achieved_hz: u32,
}

impl ClockConfig {
    /// Requested frequency in kHz
    pub fn requested_khz(&self) -> f64 {
        self.requested_hz as f64 / 1000.0
    }

    /// Achieved frequency in kHz
    pub fn achieved_khz(&self) -> f64 {
        self.achieved_hz as f64 / 1000.0
    }

    /// The (clock, divisor, achieved) triple, ignoring what was requested
    pub fn selection(&self) -> (SystemClock, ClockDivisor, u32) {
        (self.sys_clock, self.divisor, self.achieved_hz)
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        resolve(DEFAULT_FREQUENCY_KHZ)
    }
}

/// One row of the quantization table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    /// Upper bound (exclusive) of the requested Hz covered by this row
    pub below_hz: u32,
    /// System clock selection
    pub sys_clock: SystemClock,
    /// Clock divisor
    pub divisor: ClockDivisor,
    /// Reported frequency in Hz
    pub achieved_hz: u32,
}

const fn bp(below_hz: u32, sys_clock: SystemClock, divisor: ClockDivisor, achieved_hz: u32) -> Breakpoint {
    Breakpoint {
        below_hz,
        sys_clock,
        divisor,
        achieved_hz,
    }
}

use ClockDivisor::*;
use SystemClock::*;

/// Quantization table, ascending by threshold
pub const BREAKPOINTS: [Breakpoint; 27] = [
    bp(93_750, Clock24MHz, Div512, 46_875),
    bp(117_180, Clock48MHz, Div512, 93_750),
    bp(156_250, Clock60MHz, Div512, 117_180),
    bp(187_500, Clock80MHz, Div512, 156_250),
    bp(234_375, Clock48MHz, Div256, 187_500),
    bp(312_500, Clock60MHz, Div256, 234_375),
    bp(375_000, Clock80MHz, Div256, 312_500),
    bp(468_750, Clock48MHz, Div128, 375_000),
    bp(625_000, Clock60MHz, Div128, 468_750),
    bp(750_000, Clock80MHz, Div128, 625_000),
    bp(937_500, Clock48MHz, Div64, 750_000),
    bp(1_250_000, Clock60MHz, Div64, 937_500),
    bp(1_500_000, Clock80MHz, Div64, 1_250_000),
    bp(1_875_000, Clock48MHz, Div32, 1_500_000),
    bp(2_500_000, Clock60MHz, Div32, 1_875_000),
    bp(3_000_000, Clock80MHz, Div32, 2_500_000),
    bp(3_750_000, Clock48MHz, Div16, 3_000_000),
    bp(5_000_000, Clock60MHz, Div16, 3_750_000),
    bp(6_000_000, Clock80MHz, Div16, 5_000_000),
    bp(7_500_000, Clock48MHz, Div8, 6_000_000),
    bp(10_000_000, Clock60MHz, Div8, 7_500_000),
    bp(12_000_000, Clock80MHz, Div8, 10_000_000),
    bp(15_000_000, Clock48MHz, Div4, 12_000_000),
    bp(20_000_000, Clock60MHz, Div4, 15_000_000),
    bp(24_000_000, Clock80MHz, Div16, 20_000_000),
    bp(30_000_000, Clock48MHz, Div2, 24_000_000),
    bp(40_000_000, Clock60MHz, Div2, 30_000_000),
];

/// Selection for requests at or above the last threshold
pub const CATCH_ALL: (SystemClock, ClockDivisor, u32) = (Clock80MHz, Div2, 40_000_000);

/// Requested Hz band replaced by the erratum selection
pub const ERRATUM_BAND_HZ: core::ops::Range<u64> = 20_000_000..24_000_000;

/// Selection forced for the erratum band (80 MHz / 16 = 5 MHz)
pub const ERRATUM_SELECTION: (SystemClock, ClockDivisor, u32) = (Clock80MHz, Div16, 5_000_000);

/// Resolve a requested frequency given in kHz
pub fn resolve(requested_khz: u64) -> ClockConfig {
    resolve_hz(requested_khz.saturating_mul(1000))
}

/// Resolve a requested frequency given in Hz
pub fn resolve_hz(requested_hz: u64) -> ClockConfig {
    let (sys_clock, divisor, achieved_hz) = BREAKPOINTS
        .iter()
        .find(|row| requested_hz < row.below_hz as u64)
        .map(|row| (row.sys_clock, row.divisor, row.achieved_hz))
        .unwrap_or(CATCH_ALL);

    // The override runs after the lookup and wins over the 20 MHz row.
    let (sys_clock, divisor, achieved_hz) = if ERRATUM_BAND_HZ.contains(&requested_hz) {
        ERRATUM_SELECTION
    } else {
        (sys_clock, divisor, achieved_hz)
    };

    ClockConfig {
        requested_hz,
        sys_clock,
        divisor,
        achieved_hz,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_values() {
        assert_eq!(SystemClock::Clock60MHz.hz(), 60_000_000);
        assert_eq!(SystemClock::Clock24MHz.hz(), 24_000_000);
        assert_eq!(SystemClock::Clock48MHz.hz(), 48_000_000);
        assert_eq!(SystemClock::Clock80MHz.hz(), 80_000_000);
        assert_eq!(SystemClock::Clock80MHz.index(), 3);
    }

    #[test]
    fn test_divisor_values() {
        assert_eq!(ClockDivisor::Div2.divisor(), 2);
        assert_eq!(ClockDivisor::Div4.divisor(), 4);
        assert_eq!(ClockDivisor::Div512.divisor(), 512);
        assert_eq!(ClockDivisor::Div512.value(), 9);
    }

    #[test]
    fn test_100khz_rounds_to_93_75khz() {
        let config = resolve(100);
        assert_eq!(config.requested_hz, 100_000);
        assert_eq!(config.sys_clock, SystemClock::Clock48MHz);
        assert_eq!(config.divisor, ClockDivisor::Div512);
        assert_eq!(config.achieved_hz, 93_750);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for khz in [0, 1, 93, 94, 500, 10_000, 21_000, 39_999, 1_000_000] {
            assert_eq!(resolve(khz), resolve(khz));
        }
    }

    #[test]
    fn test_table_is_ascending() {
        for pair in BREAKPOINTS.windows(2) {
            assert!(pair[0].below_hz < pair[1].below_hz);
        }
    }

    #[test]
    fn test_transition_at_every_breakpoint() {
        for row in BREAKPOINTS.iter() {
            let below = resolve_hz(row.below_hz as u64 - 1).selection();
            let at = resolve_hz(row.below_hz as u64).selection();
            assert_ne!(below, at, "no transition at {} Hz", row.below_hz);
        }
    }

    #[test]
    fn test_row_selected_just_below_threshold() {
        // The erratum band hides the nominal 20 MHz row.
        for row in BREAKPOINTS.iter().filter(|r| r.below_hz != 24_000_000) {
            let config = resolve_hz(row.below_hz as u64 - 1);
            assert_eq!(config.selection(), (row.sys_clock, row.divisor, row.achieved_hz));
        }
    }

    #[test]
    fn test_erratum_band() {
        for khz in (20_000..24_000).step_by(7).chain([20_000, 23_999]) {
            let config = resolve(khz);
            assert_eq!(config.achieved_hz, 5_000_000, "at {} kHz", khz);
            assert_eq!(config.sys_clock, SystemClock::Clock80MHz);
            assert_eq!(config.divisor, ClockDivisor::Div16);
        }
        assert_eq!(resolve(19_999).achieved_hz, 15_000_000);
        assert_eq!(resolve(24_000).achieved_hz, 24_000_000);
    }

    #[test]
    fn test_lowest_and_catch_all() {
        assert_eq!(resolve(0).selection(), (Clock24MHz, Div512, 46_875));
        assert_eq!(resolve(40_000).selection(), CATCH_ALL);
        assert_eq!(resolve(u64::MAX).selection(), CATCH_ALL);
    }

    #[test]
    fn test_achieved_may_exceed_requested() {
        // Anything below the first threshold reports 46.875 kHz.
        let config = resolve(10);
        assert!(config.achieved_hz as u64 > config.requested_hz);
    }

    #[test]
    fn test_default_is_10mhz() {
        let config = ClockConfig::default();
        assert_eq!(config.requested_hz, 10_000_000);
        assert_eq!(config.selection(), (Clock80MHz, Div8, 10_000_000));
    }
}
