//! Parameter types and transaction requests

use core::fmt;

/// Number of SPI data lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpiLines {
    Single = 1,
    Dual = 2,
    Quad = 4,
}

impl SpiLines {
    /// Parse a line count (1, 2 or 4)
    pub fn from_count(count: i64) -> Option<Self> {
        match count {
            1 => Some(SpiLines::Single),
            2 => Some(SpiLines::Dual),
            4 => Some(SpiLines::Quad),
            _ => None,
        }
    }

    pub fn count(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SpiLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-line", self.count())
    }
}

/// SPI clock polarity (CPOL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockPolarity {
    IdleLow = 0,
    IdleHigh = 1,
}

impl ClockPolarity {
    pub fn from_bit(bit: i64) -> Option<Self> {
        match bit {
            0 => Some(ClockPolarity::IdleLow),
            1 => Some(ClockPolarity::IdleHigh),
            _ => None,
        }
    }
}

/// SPI clock phase (CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockPhase {
    /// Sample on the leading edge
    Leading = 0,
    /// Sample on the trailing edge
    Trailing = 1,
}

impl ClockPhase {
    pub fn from_bit(bit: i64) -> Option<Self> {
        match bit {
            0 => Some(ClockPhase::Leading),
            1 => Some(ClockPhase::Trailing),
            _ => None,
        }
    }
}

/// Output drive strength of the SPI pins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveStrength {
    Ma4 = 0,
    Ma8 = 1,
    Ma12 = 2,
    Ma16 = 3,
}

impl DriveStrength {
    /// Parse the level index (0..=3)
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(DriveStrength::Ma4),
            1 => Some(DriveStrength::Ma8),
            2 => Some(DriveStrength::Ma12),
            3 => Some(DriveStrength::Ma16),
            _ => None,
        }
    }

    pub fn milliamps(self) -> u8 {
        4 * (self as u8 + 1)
    }
}

/// Whether chip-select stays asserted after an SPI single transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Continuation {
    /// Deassert chip-select; the transfer ends the transaction
    #[default]
    End,
    /// Keep chip-select asserted for a following transfer
    Keep,
}

impl Continuation {
    /// Value of the vendor `isEndTransaction` argument
    pub fn is_end_transaction(self) -> bool {
        self == Continuation::End
    }
}

impl From<bool> for Continuation {
    fn from(keep: bool) -> Self {
        if keep {
            Continuation::Keep
        } else {
            Continuation::End
        }
    }
}

/// Start/stop framing of an extended I2C transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I2cCondition {
    Start,
    RepeatedStart,
    Stop,
    StartAndStop,
}

impl I2cCondition {
    pub const ALL: [I2cCondition; 4] = [
        I2cCondition::Start,
        I2cCondition::RepeatedStart,
        I2cCondition::Stop,
        I2cCondition::StartAndStop,
    ];

    /// Parse a condition token
    ///
    /// `Repeated_START` is accepted as an alias of `REPEATED_START`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "START" => Some(I2cCondition::Start),
            "REPEATED_START" | "Repeated_START" => Some(I2cCondition::RepeatedStart),
            "STOP" => Some(I2cCondition::Stop),
            "START_AND_STOP" => Some(I2cCondition::StartAndStop),
            _ => None,
        }
    }

    /// Canonical token
    pub fn token(self) -> &'static str {
        match self {
            I2cCondition::Start => "START",
            I2cCondition::RepeatedStart => "REPEATED_START",
            I2cCondition::Stop => "STOP",
            I2cCondition::StartAndStop => "START_AND_STOP",
        }
    }

    /// Flag bits passed to the extended primitives
    pub fn bits(self) -> u8 {
        match self {
            I2cCondition::Start => 0x02,
            I2cCondition::RepeatedStart => 0x03,
            I2cCondition::Stop => 0x04,
            I2cCondition::StartAndStop => 0x06,
        }
    }
}

impl fmt::Display for I2cCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One logical bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionRequest<'a> {
    SpiSingleWrite {
        data: &'a [u8],
        length: usize,
        continuation: Continuation,
    },
    SpiSingleRead {
        length: usize,
        continuation: Continuation,
    },
    SpiSingleReadWrite {
        data: &'a [u8],
        length: usize,
        continuation: Continuation,
    },
    SpiMultiReadWrite {
        data: &'a [u8],
        single_write: usize,
        multi_write: usize,
        multi_read: usize,
    },
    I2cRead {
        slave: u16,
        length: usize,
    },
    I2cWrite {
        slave: u16,
        data: &'a [u8],
        length: usize,
    },
    I2cReadExtended {
        slave: u16,
        length: usize,
        condition: I2cCondition,
    },
    I2cWriteExtended {
        slave: u16,
        data: &'a [u8],
        length: usize,
        condition: I2cCondition,
    },
}

impl TransactionRequest<'_> {
    /// True for requests that yield a payload
    pub fn returns_payload(&self) -> bool {
        !matches!(
            self,
            TransactionRequest::SpiSingleWrite { .. }
                | TransactionRequest::I2cWrite { .. }
                | TransactionRequest::I2cWriteExtended { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_bits() {
        assert_eq!(I2cCondition::parse("START").map(I2cCondition::bits), Some(0x02));
        assert_eq!(I2cCondition::parse("REPEATED_START").map(I2cCondition::bits), Some(0x03));
        assert_eq!(I2cCondition::parse("Repeated_START").map(I2cCondition::bits), Some(0x03));
        assert_eq!(I2cCondition::parse("STOP").map(I2cCondition::bits), Some(0x04));
        assert_eq!(I2cCondition::parse("START_AND_STOP").map(I2cCondition::bits), Some(0x06));
        assert_eq!(I2cCondition::parse("start"), None);
        assert_eq!(I2cCondition::parse("RESTART"), None);
    }

    #[test]
    fn test_condition_token_round_trips() {
        for cond in I2cCondition::ALL {
            assert_eq!(I2cCondition::parse(cond.token()), Some(cond));
        }
    }

    #[test]
    fn test_parameter_ranges() {
        assert_eq!(SpiLines::from_count(4), Some(SpiLines::Quad));
        assert_eq!(SpiLines::from_count(3), None);
        assert_eq!(ClockPolarity::from_bit(2), None);
        assert_eq!(ClockPhase::from_bit(1), Some(ClockPhase::Trailing));
        assert_eq!(DriveStrength::from_level(3).map(DriveStrength::milliamps), Some(16));
        assert_eq!(DriveStrength::from_level(0).map(DriveStrength::milliamps), Some(4));
        assert_eq!(DriveStrength::from_level(4), None);
    }

    #[test]
    fn test_continuation_default_ends() {
        assert!(Continuation::default().is_end_transaction());
        assert!(!Continuation::from(true).is_end_transaction());
    }
}
