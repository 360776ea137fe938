//! Names of the bridge primitives

use core::fmt;

/// Functional block a primitive belongs to
///
/// Used as context when classifying statuses that mean different things
/// depending on what was being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Adapter lifecycle and chip-wide configuration
    Adapter,
    /// SPI master
    Spi,
    /// I2C master
    I2c,
}

/// Every bridge primitive the command layer can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Close,
    Uninitialize,
    GetVersion,
    ChipReset,
    SetClock,
    SpiReset,
    SpiResetTransaction,
    SpiSetDrivingStrength,
    SpiMasterInit,
    SpiMasterSetLines,
    SpiMasterSetMode,
    SpiMasterSingleWrite,
    SpiMasterSingleRead,
    SpiMasterSingleReadWrite,
    SpiMasterMultiReadWrite,
    I2cMasterInit,
    I2cMasterRead,
    I2cMasterWrite,
    I2cMasterReadEx,
    I2cMasterWriteEx,
    I2cMasterGetStatus,
    I2cMasterReset,
    I2cMasterResetBus,
}

impl Operation {
    /// All operations, in declaration order
    pub const ALL: [Operation; 24] = [
        Operation::Open,
        Operation::Close,
        Operation::Uninitialize,
        Operation::GetVersion,
        Operation::ChipReset,
        Operation::SetClock,
        Operation::SpiReset,
        Operation::SpiResetTransaction,
        Operation::SpiSetDrivingStrength,
        Operation::SpiMasterInit,
        Operation::SpiMasterSetLines,
        Operation::SpiMasterSetMode,
        Operation::SpiMasterSingleWrite,
        Operation::SpiMasterSingleRead,
        Operation::SpiMasterSingleReadWrite,
        Operation::SpiMasterMultiReadWrite,
        Operation::I2cMasterInit,
        Operation::I2cMasterRead,
        Operation::I2cMasterWrite,
        Operation::I2cMasterReadEx,
        Operation::I2cMasterWriteEx,
        Operation::I2cMasterGetStatus,
        Operation::I2cMasterReset,
        Operation::I2cMasterResetBus,
    ];

    /// Block this primitive belongs to
    ///
    /// The SPI clock and drive settings count as SPI context; `SetClock`
    /// is chip-wide.
    pub fn subsystem(self) -> Subsystem {
        use Operation::*;
        match self {
            Open | Close | Uninitialize | GetVersion | ChipReset | SetClock => Subsystem::Adapter,
            SpiReset
            | SpiResetTransaction
            | SpiSetDrivingStrength
            | SpiMasterInit
            | SpiMasterSetLines
            | SpiMasterSetMode
            | SpiMasterSingleWrite
            | SpiMasterSingleRead
            | SpiMasterSingleReadWrite
            | SpiMasterMultiReadWrite => Subsystem::Spi,
            I2cMasterInit | I2cMasterRead | I2cMasterWrite | I2cMasterReadEx
            | I2cMasterWriteEx | I2cMasterGetStatus | I2cMasterReset | I2cMasterResetBus => {
                Subsystem::I2c
            }
        }
    }

    /// Name used in diagnostics
    pub fn name(self) -> &'static str {
        use Operation::*;
        match self {
            Open => "open",
            Close => "close",
            Uninitialize => "uninitialize",
            GetVersion => "get_version",
            ChipReset => "chip_reset",
            SetClock => "set_clock",
            SpiReset => "spi_reset",
            SpiResetTransaction => "spi_reset_transaction",
            SpiSetDrivingStrength => "spi_set_driving_strength",
            SpiMasterInit => "spi_master_init",
            SpiMasterSetLines => "spi_master_set_lines",
            SpiMasterSetMode => "spi_master_set_mode",
            SpiMasterSingleWrite => "spi_master_single_write",
            SpiMasterSingleRead => "spi_master_single_read",
            SpiMasterSingleReadWrite => "spi_master_single_read_write",
            SpiMasterMultiReadWrite => "spi_master_multi_read_write",
            I2cMasterInit => "i2c_master_init",
            I2cMasterRead => "i2c_master_read",
            I2cMasterWrite => "i2c_master_write",
            I2cMasterReadEx => "i2c_master_read_ex",
            I2cMasterWriteEx => "i2c_master_write_ex",
            I2cMasterGetStatus => "i2c_master_get_status",
            I2cMasterReset => "i2c_master_reset",
            I2cMasterResetBus => "i2c_master_reset_bus",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Operation::ALL.iter().map(|op| op.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Operation::ALL.len());
    }

    #[test]
    fn test_subsystems() {
        assert_eq!(Operation::SetClock.subsystem(), Subsystem::Adapter);
        assert_eq!(Operation::SpiMasterMultiReadWrite.subsystem(), Subsystem::Spi);
        assert_eq!(Operation::I2cMasterWriteEx.subsystem(), Subsystem::I2c);
        for op in Operation::ALL {
            if op.name().starts_with("spi_") {
                assert_eq!(op.subsystem(), Subsystem::Spi);
            } else if op.name().starts_with("i2c_") {
                assert_eq!(op.subsystem(), Subsystem::I2c);
            }
        }
    }
}
