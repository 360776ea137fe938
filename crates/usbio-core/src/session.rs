//! Transaction executor
//!
//! A [`Session`] owns the state shared by every command: the active clock
//! configuration, the transmit/receive buffers and the attached transport.
//! Each method runs one logical command to completion: validate, stage,
//! invoke exactly one primitive, classify the result and check the byte
//! count. Nothing is retried.

use core::fmt;

use crate::buffer::{BufferError, TransferBuffers, TRANSFER_BUFFER_SIZE};
use crate::clock::{self, ClockConfig};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::request::{
    ClockPhase, ClockPolarity, Continuation, DriveStrength, I2cCondition, SpiLines,
    TransactionRequest,
};
use crate::status::{FtStatus, StatusCode};
use crate::transport::{BridgeTransport, ChipVersion, FtResult, I2cControllerStatus};

/// Chip-select mask used when entering SPI master mode (SS0 only)
pub const DEFAULT_CS_MASK: u8 = 0x1;

/// Chip-select index cleared by `spi_reset_transaction`
pub const RESET_TRANSACTION_INDEX: u8 = 0;

/// Highest 7-bit I2C slave address
pub const MAX_I2C_ADDRESS: u16 = 0x7F;

/// State shared by all commands against one bridge
pub struct Session<T: ?Sized + BridgeTransport = dyn BridgeTransport + Send> {
    clock: ClockConfig,
    buffers: TransferBuffers,
    transport: Option<Box<T>>,
}

impl<T: ?Sized + BridgeTransport> Session<T> {
    /// Create a session with the default clock and no adapter
    pub fn new() -> Self {
        Self::with_clock(ClockConfig::default())
    }

    pub fn with_clock(clock: ClockConfig) -> Self {
        Self {
            clock,
            buffers: TransferBuffers::new(),
            transport: None,
        }
    }

    /// Attach an opened adapter, returning the one it replaces
    pub fn attach(&mut self, transport: Box<T>) -> Option<Box<T>> {
        self.transport.replace(transport)
    }

    /// Detach the adapter; clock and buffers are kept
    pub fn detach(&mut self) -> Option<Box<T>> {
        self.transport.take()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_deref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_deref_mut()
    }

    /// Active clock configuration
    pub fn clock(&self) -> &ClockConfig {
        &self.clock
    }

    pub fn buffers(&self) -> &TransferBuffers {
        &self.buffers
    }

    /// Quantize `khz` and make it the active clock for the next `spi_init`
    pub fn set_frequency(&mut self, khz: u64) -> ClockConfig {
        let config = clock::resolve(khz);
        log::info!(
            "target frequency {:.3}kHz, rounded to {:.3}kHz",
            config.requested_khz(),
            config.achieved_khz()
        );
        log::debug!("system clock {}, divisor {}", config.sys_clock, config.divisor);
        self.clock = config;
        config
    }

    fn run<R>(&mut self, op: Operation, f: impl FnOnce(&mut T) -> FtResult<R>) -> Result<R> {
        let dev = device(&mut self.transport, op)?;
        let result = f(dev).map_err(|raw| Error::hardware(op, raw));
        log::debug!("{}: {}", op, if result.is_ok() { "ok" } else { "failed" });
        result
    }

    // Adapter

    /// Read chip and library versions
    pub fn chip_version(&mut self) -> Result<ChipVersion> {
        let version = self.run(Operation::GetVersion, |dev| dev.version())?;
        log::info!("{}", version);
        Ok(version)
    }

    pub fn chip_reset(&mut self) -> Result<()> {
        self.run(Operation::ChipReset, |dev| dev.chip_reset())
    }

    /// Release the chip's mode configuration
    ///
    /// A failure reported by the device is logged and otherwise ignored.
    pub fn uninitialize(&mut self) -> Result<()> {
        match self.run(Operation::Uninitialize, |dev| dev.uninitialize()) {
            Err(Error::Hardware { raw, outcome, .. }) => {
                log::warn!("uninitialize failed: {} [{}]", outcome, raw);
                Ok(())
            }
            other => other,
        }
    }

    // SPI configuration

    /// Program the active clock and enter SPI master mode
    pub fn spi_init(&mut self, lines: SpiLines, cpol: ClockPolarity, cpha: ClockPhase) -> Result<()> {
        let clock = self.clock;
        log::debug!(
            "spi_init: {} lines, cpol {:?}, cpha {:?}, {} {}",
            lines.count(),
            cpol,
            cpha,
            clock.sys_clock,
            clock.divisor
        );
        self.run(Operation::SetClock, |dev| dev.set_clock(clock.sys_clock))?;
        self.run(Operation::SpiMasterInit, |dev| {
            dev.spi_master_init(lines, clock.divisor, cpol, cpha, DEFAULT_CS_MASK)
        })
    }

    pub fn spi_set_lines(&mut self, lines: SpiLines) -> Result<()> {
        self.run(Operation::SpiMasterSetLines, |dev| dev.spi_set_lines(lines))
    }

    pub fn spi_set_mode(&mut self, cpol: ClockPolarity, cpha: ClockPhase) -> Result<()> {
        self.run(Operation::SpiMasterSetMode, |dev| dev.spi_set_mode(cpol, cpha))
    }

    pub fn spi_reset(&mut self) -> Result<()> {
        self.run(Operation::SpiReset, |dev| dev.spi_reset())
    }

    pub fn spi_reset_transaction(&mut self) -> Result<()> {
        self.run(Operation::SpiResetTransaction, |dev| {
            dev.spi_reset_transaction(RESET_TRANSACTION_INDEX)
        })
    }

    /// Apply the same drive strength to clock, data and chip-select pins
    pub fn spi_set_drive_strength(&mut self, strength: DriveStrength) -> Result<()> {
        log::debug!("spi drive strength {} mA", strength.milliamps());
        self.run(Operation::SpiSetDrivingStrength, |dev| {
            dev.spi_set_drive_strength(strength, strength, strength)
        })
    }

    // SPI transfers

    /// Single-line write of the first `length` bytes of `data`
    pub fn spi_write(&mut self, data: &[u8], length: usize, continuation: Continuation) -> Result<()> {
        let op = Operation::SpiMasterSingleWrite;
        log::debug!("{}: {} bytes, {:?}", op, length, continuation);

        let staged = self
            .buffers
            .tx
            .stage_write(data, length)
            .map_err(|e| Error::buffer(op, e))?;
        log::trace!("{} tx {:02x?}", op, staged);

        let dev = device(&mut self.transport, op)?;
        let transferred = dev
            .spi_single_write(staged, continuation.is_end_transaction())
            .map_err(|raw| Error::hardware(op, raw))?;
        check_transferred(op, length, transferred)
    }

    /// Single-line read of `length` bytes
    pub fn spi_read(&mut self, length: usize, continuation: Continuation) -> Result<&[u8]> {
        let op = Operation::SpiMasterSingleRead;
        log::debug!("{}: {} bytes, {:?}", op, length, continuation);

        self.buffers
            .rx
            .prepare_read(length)
            .map_err(|e| Error::buffer(op, e))?;

        let dev = device(&mut self.transport, op)?;
        let window = self.buffers.rx.read_window(length);
        let transferred = dev
            .spi_single_read(window, continuation.is_end_transaction())
            .map_err(|raw| Error::hardware(op, raw))?;
        check_transferred(op, length, transferred)?;

        let payload = self.buffers.rx.staged();
        log::trace!("{} rx {:02x?}", op, payload);
        Ok(payload)
    }

    /// Full-duplex single-line transfer of `length` bytes
    pub fn spi_read_write(
        &mut self,
        data: &[u8],
        length: usize,
        continuation: Continuation,
    ) -> Result<&[u8]> {
        let op = Operation::SpiMasterSingleReadWrite;
        log::debug!("{}: {} bytes, {:?}", op, length, continuation);

        // Both checks run before either buffer is touched.
        let staged = self
            .buffers
            .tx
            .stage_write(data, length)
            .map_err(|e| Error::buffer(op, e))?;
        self.buffers
            .rx
            .prepare_read(length)
            .map_err(|e| Error::buffer(op, e))?;
        log::trace!("{} tx {:02x?}", op, staged);

        let dev = device(&mut self.transport, op)?;
        let window = self.buffers.rx.read_window(length);
        let transferred = dev
            .spi_single_read_write(window, staged, continuation.is_end_transaction())
            .map_err(|raw| Error::hardware(op, raw))?;
        check_transferred(op, length, transferred)?;

        let payload = self.buffers.rx.staged();
        log::trace!("{} rx {:02x?}", op, payload);
        Ok(payload)
    }

    /// Multi-line transfer
    ///
    /// Sends `single_write` bytes on one line and the next `multi_write`
    /// bytes on all lines, then reads `multi_read` bytes.
    pub fn spi_multi_read_write(
        &mut self,
        data: &[u8],
        single_write: usize,
        multi_write: usize,
        multi_read: usize,
    ) -> Result<&[u8]> {
        let op = Operation::SpiMasterMultiReadWrite;
        log::debug!(
            "{}: single {} multi write {} multi read {}",
            op,
            single_write,
            multi_write,
            multi_read
        );

        if multi_read > TRANSFER_BUFFER_SIZE {
            return Err(Error::buffer(
                op,
                BufferError::LengthExceedsCapacity {
                    requested: multi_read,
                    capacity: TRANSFER_BUFFER_SIZE,
                },
            ));
        }
        let staged = self
            .buffers
            .tx
            .stage_segments(data, single_write, multi_write)
            .map_err(|e| Error::buffer(op, e))?;
        self.buffers
            .rx
            .prepare_read(multi_read)
            .map_err(|e| Error::buffer(op, e))?;
        log::trace!("{} tx {:02x?}", op, staged);

        let dev = device(&mut self.transport, op)?;
        let window = self.buffers.rx.read_window(multi_read);
        let transferred = dev
            .spi_multi_read_write(window, staged, single_write, multi_write)
            .map_err(|raw| Error::hardware(op, raw))?;
        check_transferred(op, multi_read, transferred)?;

        let payload = self.buffers.rx.staged();
        log::trace!("{} rx {:02x?}", op, payload);
        Ok(payload)
    }

    // I2C

    /// Enter I2C master mode at `kbps`
    pub fn i2c_init(&mut self, kbps: u32) -> Result<()> {
        log::debug!("i2c_init: {} kbps", kbps);
        self.run(Operation::I2cMasterInit, |dev| dev.i2c_master_init(kbps))
    }

    pub fn i2c_status(&mut self) -> Result<I2cControllerStatus> {
        let status = self.run(Operation::I2cMasterGetStatus, |dev| dev.i2c_status())?;
        log::debug!("i2c controller status {:?}", status);
        Ok(status)
    }

    pub fn i2c_reset(&mut self) -> Result<()> {
        self.run(Operation::I2cMasterReset, |dev| dev.i2c_reset())
    }

    pub fn i2c_reset_bus(&mut self) -> Result<()> {
        self.run(Operation::I2cMasterResetBus, |dev| dev.i2c_reset_bus())
    }

    pub fn i2c_read(&mut self, slave: u16, length: usize) -> Result<&[u8]> {
        self.i2c_read_framed(Operation::I2cMasterRead, slave, length, None)
    }

    pub fn i2c_write(&mut self, slave: u16, data: &[u8], length: usize) -> Result<()> {
        self.i2c_write_framed(Operation::I2cMasterWrite, slave, data, length, None)
    }

    /// Read with explicit start/stop framing
    pub fn i2c_read_ex(&mut self, slave: u16, length: usize, condition: I2cCondition) -> Result<&[u8]> {
        self.i2c_read_framed(Operation::I2cMasterReadEx, slave, length, Some(condition))
    }

    /// Write with explicit start/stop framing
    pub fn i2c_write_ex(
        &mut self,
        slave: u16,
        data: &[u8],
        length: usize,
        condition: I2cCondition,
    ) -> Result<()> {
        self.i2c_write_framed(Operation::I2cMasterWriteEx, slave, data, length, Some(condition))
    }

    fn i2c_read_framed(
        &mut self,
        op: Operation,
        slave: u16,
        length: usize,
        condition: Option<I2cCondition>,
    ) -> Result<&[u8]> {
        log::debug!("{}: slave 0x{:02X}, {} bytes, {:?}", op, slave, length, condition);
        check_slave(op, slave)?;
        self.buffers
            .rx
            .prepare_read(length)
            .map_err(|e| Error::buffer(op, e))?;

        let dev = device(&mut self.transport, op)?;
        let window = self.buffers.rx.read_window(length);
        let result = match condition {
            Some(condition) => dev.i2c_read_ex(slave, condition.bits(), window),
            None => dev.i2c_read(slave, window),
        };
        let transferred = result.map_err(|raw| Error::hardware(op, raw))?;
        check_transferred(op, length, transferred)?;

        let payload = self.buffers.rx.staged();
        log::trace!("{} rx {:02x?}", op, payload);
        Ok(payload)
    }

    fn i2c_write_framed(
        &mut self,
        op: Operation,
        slave: u16,
        data: &[u8],
        length: usize,
        condition: Option<I2cCondition>,
    ) -> Result<()> {
        log::debug!("{}: slave 0x{:02X}, {} bytes, {:?}", op, slave, length, condition);
        check_slave(op, slave)?;
        let staged = self
            .buffers
            .tx
            .stage_write(data, length)
            .map_err(|e| Error::buffer(op, e))?;
        log::trace!("{} tx {:02x?}", op, staged);

        let dev = device(&mut self.transport, op)?;
        let result = match condition {
            Some(condition) => dev.i2c_write_ex(slave, condition.bits(), staged),
            None => dev.i2c_write(slave, staged),
        };
        let transferred = result.map_err(|raw| Error::hardware(op, raw))?;
        check_transferred(op, length, transferred)
    }

    /// Run one transaction request
    ///
    /// Returns the payload for read-bearing requests and `None` for writes.
    pub fn execute(&mut self, request: &TransactionRequest<'_>) -> Result<Option<Vec<u8>>> {
        let payload = match *request {
            TransactionRequest::SpiSingleWrite {
                data,
                length,
                continuation,
            } => {
                self.spi_write(data, length, continuation)?;
                None
            }
            TransactionRequest::SpiSingleRead {
                length,
                continuation,
            } => Some(self.spi_read(length, continuation)?.to_vec()),
            TransactionRequest::SpiSingleReadWrite {
                data,
                length,
                continuation,
            } => Some(self.spi_read_write(data, length, continuation)?.to_vec()),
            TransactionRequest::SpiMultiReadWrite {
                data,
                single_write,
                multi_write,
                multi_read,
            } => Some(
                self.spi_multi_read_write(data, single_write, multi_write, multi_read)?
                    .to_vec(),
            ),
            TransactionRequest::I2cRead { slave, length } => {
                Some(self.i2c_read(slave, length)?.to_vec())
            }
            TransactionRequest::I2cWrite {
                slave,
                data,
                length,
            } => {
                self.i2c_write(slave, data, length)?;
                None
            }
            TransactionRequest::I2cReadExtended {
                slave,
                length,
                condition,
            } => Some(self.i2c_read_ex(slave, length, condition)?.to_vec()),
            TransactionRequest::I2cWriteExtended {
                slave,
                data,
                length,
                condition,
            } => {
                self.i2c_write_ex(slave, data, length, condition)?;
                None
            }
        };
        Ok(payload)
    }
}

impl<T: ?Sized + BridgeTransport> Default for Session<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + BridgeTransport> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("clock", &self.clock)
            .field("buffers", &self.buffers)
            .field("open", &self.is_open())
            .finish()
    }
}

fn device<T: ?Sized + BridgeTransport>(
    transport: &mut Option<Box<T>>,
    op: Operation,
) -> Result<&mut T> {
    transport
        .as_deref_mut()
        .ok_or_else(|| Error::hardware(op, FtStatus::from(StatusCode::DeviceNotOpened)))
}

fn check_transferred(op: Operation, requested: usize, transferred: usize) -> Result<()> {
    if transferred != requested {
        log::debug!("{}: transferred {} of {} bytes", op, transferred, requested);
        return Err(Error::ShortTransfer {
            op,
            requested,
            transferred,
        });
    }
    Ok(())
}

fn check_slave(op: Operation, slave: u16) -> Result<()> {
    if slave > MAX_I2C_ADDRESS {
        return Err(Error::invalid(
            op,
            format!("slave address 0x{:X} is not a 7-bit address", slave),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockDivisor, SystemClock};
    use crate::status::OutcomeStatus;

    /// Records calls and answers every transfer in full
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_with: Option<FtStatus>,
        short_by: usize,
    }

    impl Recorder {
        fn answer(&mut self, call: String, len: usize) -> FtResult<usize> {
            self.calls.push(call);
            match self.fail_with {
                Some(raw) => Err(raw),
                None => Ok(len.saturating_sub(self.short_by)),
            }
        }

        fn unit(&mut self, call: String) -> FtResult<()> {
            self.answer(call, 0).map(|_| ())
        }
    }

    impl BridgeTransport for Recorder {
        fn uninitialize(&mut self) -> FtResult<()> {
            self.unit("uninitialize".into())
        }
        fn version(&mut self) -> FtResult<ChipVersion> {
            self.unit("version".into())?;
            Ok(ChipVersion { chip: 1, dll: 2 })
        }
        fn chip_reset(&mut self) -> FtResult<()> {
            self.unit("chip_reset".into())
        }
        fn set_clock(&mut self, clock: SystemClock) -> FtResult<()> {
            self.unit(format!("set_clock {}", clock.index()))
        }
        fn spi_master_init(
            &mut self,
            lines: SpiLines,
            divisor: ClockDivisor,
            cpol: ClockPolarity,
            cpha: ClockPhase,
            cs_mask: u8,
        ) -> FtResult<()> {
            self.unit(format!(
                "spi_master_init {} {} {} {} {}",
                lines.count(),
                divisor.value(),
                cpol as u8,
                cpha as u8,
                cs_mask
            ))
        }
        fn spi_set_lines(&mut self, lines: SpiLines) -> FtResult<()> {
            self.unit(format!("spi_set_lines {}", lines.count()))
        }
        fn spi_set_mode(&mut self, cpol: ClockPolarity, cpha: ClockPhase) -> FtResult<()> {
            self.unit(format!("spi_set_mode {} {}", cpol as u8, cpha as u8))
        }
        fn spi_reset_transaction(&mut self, index: u8) -> FtResult<()> {
            self.unit(format!("spi_reset_transaction {}", index))
        }
        fn spi_reset(&mut self) -> FtResult<()> {
            self.unit("spi_reset".into())
        }
        fn spi_set_drive_strength(
            &mut self,
            clk: DriveStrength,
            io: DriveStrength,
            cs: DriveStrength,
        ) -> FtResult<()> {
            self.unit(format!("drive {} {} {}", clk as u8, io as u8, cs as u8))
        }
        fn spi_single_write(&mut self, data: &[u8], end: bool) -> FtResult<usize> {
            self.answer(format!("spi_write {:02x?} {}", data, end), data.len())
        }
        fn spi_single_read(&mut self, buf: &mut [u8], end: bool) -> FtResult<usize> {
            buf.fill(0x5A);
            self.answer(format!("spi_read {} {}", buf.len(), end), buf.len())
        }
        fn spi_single_read_write(&mut self, read: &mut [u8], write: &[u8], end: bool) -> FtResult<usize> {
            read.copy_from_slice(write);
            self.answer(format!("spi_read_write {} {}", write.len(), end), read.len())
        }
        fn spi_multi_read_write(
            &mut self,
            read: &mut [u8],
            write: &[u8],
            single: usize,
            multi: usize,
        ) -> FtResult<usize> {
            self.answer(
                format!("spi_multi {:02x?} {} {} {}", write, single, multi, read.len()),
                read.len(),
            )
        }
        fn i2c_master_init(&mut self, kbps: u32) -> FtResult<()> {
            self.unit(format!("i2c_init {}", kbps))
        }
        fn i2c_read(&mut self, slave: u16, buf: &mut [u8]) -> FtResult<usize> {
            self.answer(format!("i2c_read {:#x} {}", slave, buf.len()), buf.len())
        }
        fn i2c_write(&mut self, slave: u16, data: &[u8]) -> FtResult<usize> {
            self.answer(format!("i2c_write {:#x} {}", slave, data.len()), data.len())
        }
        fn i2c_read_ex(&mut self, slave: u16, flags: u8, buf: &mut [u8]) -> FtResult<usize> {
            self.answer(format!("i2c_read_ex {:#x} {:#x} {}", slave, flags, buf.len()), buf.len())
        }
        fn i2c_write_ex(&mut self, slave: u16, flags: u8, data: &[u8]) -> FtResult<usize> {
            self.answer(format!("i2c_write_ex {:#x} {:#x} {}", slave, flags, data.len()), data.len())
        }
        fn i2c_status(&mut self) -> FtResult<I2cControllerStatus> {
            self.unit("i2c_status".into())?;
            Ok(I2cControllerStatus::IDLE)
        }
        fn i2c_reset(&mut self) -> FtResult<()> {
            self.unit("i2c_reset".into())
        }
        fn i2c_reset_bus(&mut self) -> FtResult<()> {
            self.unit("i2c_reset_bus".into())
        }
    }

    fn open_session() -> Session<Recorder> {
        let mut session = Session::new();
        session.attach(Box::new(Recorder::default()));
        session
    }

    fn calls(session: &Session<Recorder>) -> &[String] {
        &session.transport().unwrap().calls
    }

    #[test]
    fn test_spi_init_uses_active_clock() {
        let mut session = open_session();
        session.set_frequency(100);
        session
            .spi_init(SpiLines::Single, ClockPolarity::IdleLow, ClockPhase::Leading)
            .unwrap();
        assert_eq!(calls(&session), &["set_clock 2", "spi_master_init 1 9 0 0 1"]);
    }

    #[test]
    fn test_write_ends_transaction_by_default() {
        let mut session = open_session();
        session
            .spi_write(&[0xDE, 0xAD, 0xBE, 0xEF], 4, Continuation::End)
            .unwrap();
        session.spi_write(&[1, 2], 1, Continuation::Keep).unwrap();
        assert_eq!(
            calls(&session),
            &["spi_write [de, ad, be, ef] true", "spi_write [01] false"]
        );
    }

    #[test]
    fn test_validation_happens_before_hardware() {
        let mut session = open_session();
        let err = session.spi_write(&[1, 2, 3], 4, Continuation::End).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);

        let err = session.spi_read(TRANSFER_BUFFER_SIZE + 1, Continuation::End).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);

        let err = session.i2c_read(0x80, 1).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);

        assert!(calls(&session).is_empty());
    }

    #[test]
    fn test_multi_read_write_rejects_before_mutation() {
        let mut session = open_session();
        session.spi_write(&[7; 4], 4, Continuation::End).unwrap();

        let err = session
            .spi_multi_read_write(&[1, 2, 3, 4, 5], 2, 3, TRANSFER_BUFFER_SIZE + 1)
            .unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);
        assert_eq!(session.buffers().tx.staged(), &[7; 4]);
    }

    #[test]
    fn test_read_write_returns_echo() {
        let mut session = open_session();
        let echoed = session
            .spi_read_write(&[0x9F, 0, 0], 3, Continuation::End)
            .unwrap()
            .to_vec();
        assert_eq!(echoed, vec![0x9F, 0, 0]);
    }

    #[test]
    fn test_short_transfer_is_an_error() {
        let mut session = open_session();
        session.transport_mut().unwrap().short_by = 1;
        let err = session.spi_read(4, Continuation::End).unwrap_err();
        assert_eq!(
            err,
            Error::ShortTransfer {
                op: Operation::SpiMasterSingleRead,
                requested: 4,
                transferred: 3
            }
        );
    }

    #[test]
    fn test_hardware_failure_is_classified() {
        let mut session = open_session();
        session.transport_mut().unwrap().fail_with = Some(FtStatus(17));
        let err = session.i2c_write(0x50, &[0], 1).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::NotI2cMode);
        assert_eq!(err.raw_status(), Some(FtStatus(17)));
    }

    #[test]
    fn test_no_adapter_reports_device_not_opened() {
        let mut session: Session<Recorder> = Session::new();
        let err = session.spi_reset().unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::DeviceNotOpened);
        assert_eq!(err.raw_status(), Some(FtStatus(3)));
    }

    #[test]
    fn test_uninitialize_failure_is_not_fatal() {
        let mut session = open_session();
        session.transport_mut().unwrap().fail_with = Some(FtStatus(4));
        assert!(session.uninitialize().is_ok());
    }

    #[test]
    fn test_drive_strength_applies_to_all_pins() {
        let mut session = open_session();
        session.spi_set_drive_strength(DriveStrength::Ma12).unwrap();
        assert_eq!(calls(&session), &["drive 2 2 2"]);
    }

    #[test]
    fn test_execute_extended_conditions() {
        let mut session = open_session();
        let payload = session
            .execute(&TransactionRequest::I2cReadExtended {
                slave: 0x50,
                length: 2,
                condition: I2cCondition::RepeatedStart,
            })
            .unwrap();
        assert_eq!(payload, Some(vec![0, 0]));

        let payload = session
            .execute(&TransactionRequest::I2cWriteExtended {
                slave: 0x50,
                data: &[0x10],
                length: 1,
                condition: I2cCondition::StartAndStop,
            })
            .unwrap();
        assert_eq!(payload, None);
        assert_eq!(
            calls(&session),
            &["i2c_read_ex 0x50 0x3 2", "i2c_write_ex 0x50 0x6 1"]
        );
    }

    #[test]
    fn test_clock_survives_detach() {
        let mut session = open_session();
        session.set_frequency(1_000);
        session.detach();
        assert_eq!(session.clock().achieved_hz, 937_500);
        assert!(!session.is_open());
    }
}
