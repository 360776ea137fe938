//! Bridge transport trait definitions
//!
//! A [`BridgeTransport`] is an opened adapter. It exposes one method per
//! vendor primitive and reports failures as the raw [`FtStatus`]; turning
//! that into an outcome is the session's job, not the transport's.
//!
//! Adapters are obtained from an [`AdapterProvider`], which stands in for
//! the device enumeration side of the vendor library.

use core::fmt;

use bitflags::bitflags;

use crate::clock::{ClockDivisor, SystemClock};
use crate::request::{ClockPhase, ClockPolarity, DriveStrength, SpiLines};
use crate::status::FtStatus;

/// Result of a bridge primitive
pub type FtResult<T> = core::result::Result<T, FtStatus>;

/// Owned, type-erased transport as handed out by providers
pub type BoxedTransport = Box<dyn BridgeTransport + Send>;

/// Chip and support library versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipVersion {
    /// Chip revision word
    pub chip: u32,
    /// Support library version word
    pub dll: u32,
}

impl fmt::Display for ChipVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chip 0x{:08X}, library 0x{:08X}", self.chip, self.dll)
    }
}

bitflags! {
    /// I2C master controller status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct I2cControllerStatus: u8 {
        /// Controller busy, other bits invalid
        const BUSY         = 1 << 0;
        /// Error condition
        const ERROR        = 1 << 1;
        /// Slave address was not acknowledged
        const ADDRESS_NACK = 1 << 2;
        /// Data was not acknowledged
        const DATA_NACK    = 1 << 3;
        /// Arbitration lost
        const ARB_LOST     = 1 << 4;
        /// Controller idle
        const IDLE         = 1 << 5;
        /// Bus busy
        const BUS_BUSY     = 1 << 6;
    }
}

/// One opened FT4222H-class bridge
///
/// Transfer methods return the number of bytes the device actually moved.
/// A count differing from the buffer length is not an error at this level.
pub trait BridgeTransport {
    /// Release the chip's mode configuration
    fn uninitialize(&mut self) -> FtResult<()>;

    /// Read the chip and library versions
    fn version(&mut self) -> FtResult<ChipVersion>;

    /// Reset the chip
    fn chip_reset(&mut self) -> FtResult<()>;

    /// Select the system clock
    fn set_clock(&mut self, clock: SystemClock) -> FtResult<()>;

    /// Enter SPI master mode
    fn spi_master_init(
        &mut self,
        lines: SpiLines,
        divisor: ClockDivisor,
        cpol: ClockPolarity,
        cpha: ClockPhase,
        cs_mask: u8,
    ) -> FtResult<()>;

    /// Change the number of data lines
    fn spi_set_lines(&mut self, lines: SpiLines) -> FtResult<()>;

    /// Change clock polarity and phase
    fn spi_set_mode(&mut self, cpol: ClockPolarity, cpha: ClockPhase) -> FtResult<()>;

    /// Abort the transaction on one chip-select index
    fn spi_reset_transaction(&mut self, index: u8) -> FtResult<()>;

    /// Reset the SPI master
    fn spi_reset(&mut self) -> FtResult<()>;

    /// Set pin drive strength for clock, data and chip-select
    fn spi_set_drive_strength(
        &mut self,
        clk: DriveStrength,
        io: DriveStrength,
        cs: DriveStrength,
    ) -> FtResult<()>;

    /// Single-line write
    fn spi_single_write(&mut self, data: &[u8], end_transaction: bool) -> FtResult<usize>;

    /// Single-line read into `buf`
    fn spi_single_read(&mut self, buf: &mut [u8], end_transaction: bool) -> FtResult<usize>;

    /// Full-duplex single-line transfer; `read` and `write` have equal length
    fn spi_single_read_write(
        &mut self,
        read: &mut [u8],
        write: &[u8],
        end_transaction: bool,
    ) -> FtResult<usize>;

    /// Multi-line transfer
    ///
    /// `write` holds `single_write` bytes sent on one line followed by
    /// `multi_write` bytes sent on all lines; then `read.len()` bytes are
    /// read on all lines. Returns the number of bytes read.
    fn spi_multi_read_write(
        &mut self,
        read: &mut [u8],
        write: &[u8],
        single_write: usize,
        multi_write: usize,
    ) -> FtResult<usize>;

    /// Enter I2C master mode at `kbps`
    fn i2c_master_init(&mut self, kbps: u32) -> FtResult<()>;

    /// Read with implicit start/stop framing
    fn i2c_read(&mut self, slave: u16, buf: &mut [u8]) -> FtResult<usize>;

    /// Write with implicit start/stop framing
    fn i2c_write(&mut self, slave: u16, data: &[u8]) -> FtResult<usize>;

    /// Read with explicit framing flags
    fn i2c_read_ex(&mut self, slave: u16, flags: u8, buf: &mut [u8]) -> FtResult<usize>;

    /// Write with explicit framing flags
    fn i2c_write_ex(&mut self, slave: u16, flags: u8, data: &[u8]) -> FtResult<usize>;

    /// Read the controller status register
    fn i2c_status(&mut self) -> FtResult<I2cControllerStatus>;

    /// Reset the I2C master
    fn i2c_reset(&mut self) -> FtResult<()>;

    /// Recover a stuck bus
    fn i2c_reset_bus(&mut self) -> FtResult<()>;
}

/// Enumeration entry for one attachable adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub index: usize,
    pub description: String,
    pub serial: String,
    pub location: u32,
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (serial {}, location 0x{:X})",
            self.index, self.description, self.serial, self.location
        )
    }
}

/// Source of adapters for a backend
pub trait AdapterProvider {
    /// Adapters currently available
    fn adapters(&self) -> Vec<AdapterInfo>;

    /// Open the adapter at `index` in the list returned by [`adapters`](Self::adapters)
    fn open(&mut self, index: usize) -> FtResult<BoxedTransport>;
}
