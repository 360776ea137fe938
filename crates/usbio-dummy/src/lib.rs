//! usbio-dummy - Simulated FT4222H bridge
//!
//! This crate provides an in-memory bridge that behaves like an FT4222H
//! closely enough to exercise the command layer without hardware: it
//! tracks the SPI/I2C mode the chip is in, echoes SPI transfers in
//! loopback, serves I2C reads and writes from small EEPROM-like targets,
//! and can be told to fail or short the next call to any primitive.

use std::collections::{BTreeMap, HashMap, VecDeque};

use thiserror::Error;
use usbio_core::{
    AdapterInfo, AdapterProvider, BoxedTransport, BridgeTransport, ChipVersion, ClockDivisor,
    ClockPhase, ClockPolarity, DriveStrength, FtResult, FtStatus, I2cControllerStatus, Operation,
    SpiLines, StatusCode, SystemClock,
};

/// Largest single-line phase of a multi-line transfer
pub const MAX_MULTI_SINGLE_WRITE: usize = 15;

/// Longest multi-line write phase
pub const MAX_MULTI_WRITE: usize = 0xFFFF;

/// Accepted I2C master speeds in kbps
pub const I2C_KBPS_RANGE: core::ops::RangeInclusive<u32> = 60..=3400;

/// Configuration for the simulated bridge
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Number of adapters the provider enumerates
    pub adapters: usize,
    /// Echo SPI full-duplex writes back on MISO
    pub loopback: bool,
    /// Byte clocked in on MISO when nothing is queued
    pub miso_fill: u8,
    /// Addresses of simulated I2C EEPROM targets
    pub i2c_targets: Vec<u16>,
    /// Size of each I2C target in bytes
    pub target_size: usize,
    /// Chip version word
    pub chip_version: u32,
    /// Support library version word
    pub dll_version: u32,
    /// Whether the chip's mode allows I2C master
    pub i2c_capable: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            adapters: 1,
            loopback: true,
            miso_fill: 0xFF,
            i2c_targets: vec![0x50],
            target_size: 256,
            chip_version: 0x4222_0400, // FT4222H rev D
            dll_version: 0x0106_0004,
            i2c_capable: true,
        }
    }
}

/// Invalid dummy backend option
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid dummy option {key}={value}: expected {expected}")]
pub struct OptionError {
    pub key: String,
    pub value: String,
    pub expected: &'static str,
}

impl OptionError {
    fn new(key: &str, value: &str, expected: &'static str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}

/// Parse backend options for the dummy bridge
///
/// Supported options:
/// - `adapters=<n>`: number of enumerated adapters (default: 1)
/// - `i2c=<addr>[+<addr>...]`: simulated I2C target addresses (default: 0x50)
/// - `miso=<byte>`: SPI read fill byte (default: 0xff)
/// - `loopback=<bool>`: echo full-duplex writes (default: true)
///
/// # Example
///
/// ```ignore
/// let options = [("adapters", "2"), ("i2c", "0x50+0x51")];
/// let config = parse_options(&options)?;
/// ```
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig, OptionError> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "adapters" => {
                config.adapters = value
                    .parse()
                    .map_err(|_| OptionError::new(key, value, "an adapter count"))?;
            }
            "i2c" => {
                config.i2c_targets = if value.is_empty() {
                    Vec::new()
                } else {
                    value
                        .split('+')
                        .map(|addr| match parse_number(addr) {
                            Some(addr) if addr <= 0x7F => Ok(addr as u16),
                            _ => Err(OptionError::new(key, value, "7-bit addresses joined by '+'")),
                        })
                        .collect::<Result<_, _>>()?
                };
            }
            "miso" => {
                config.miso_fill = parse_number(value)
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| OptionError::new(key, value, "a byte value"))?;
            }
            "loopback" => {
                config.loopback = match *value {
                    "1" | "true" | "yes" | "on" => true,
                    "0" | "false" | "no" | "off" => false,
                    _ => return Err(OptionError::new(key, value, "a boolean")),
                };
            }
            _ => {
                log::warn!("Unknown dummy option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

fn parse_number(s: &str) -> Option<u32> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Mode the simulated chip is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMode {
    /// Not initialized, or uninitialized / reset since
    Idle,
    /// SPI master with the given number of data lines
    Spi { lines: SpiLines },
    /// I2C master at the given speed
    I2c { kbps: u32 },
}

/// One primitive invocation seen by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Operation,
    /// Bytes the host sent
    pub write: Vec<u8>,
    /// Bytes the host asked for
    pub read_len: usize,
    /// `isEndTransaction` for SPI single transfers
    pub end_transaction: Option<bool>,
    /// Framing flags for extended I2C transfers
    pub flags: Option<u8>,
}

impl Call {
    fn new(op: Operation) -> Self {
        Self {
            op,
            write: Vec::new(),
            read_len: 0,
            end_transaction: None,
            flags: None,
        }
    }

    fn write(mut self, data: &[u8]) -> Self {
        self.write = data.to_vec();
        self
    }

    fn read(mut self, len: usize) -> Self {
        self.read_len = len;
        self
    }

    fn end(mut self, end_transaction: bool) -> Self {
        self.end_transaction = Some(end_transaction);
        self
    }

    fn flags(mut self, flags: u8) -> Self {
        self.flags = Some(flags);
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Status(FtStatus),
    Short(usize),
}

/// Simulated I2C EEPROM with an 8-bit address pointer
#[derive(Debug, Clone)]
struct Target {
    memory: Vec<u8>,
    pointer: usize,
}

impl Target {
    fn new(size: usize) -> Self {
        Self {
            memory: vec![0xFF; size.max(1)],
            pointer: 0,
        }
    }

    fn write(&mut self, data: &[u8]) {
        let Some((&addr, payload)) = data.split_first() else {
            return;
        };
        self.pointer = addr as usize % self.memory.len();
        for &byte in payload {
            self.memory[self.pointer] = byte;
            self.pointer = (self.pointer + 1) % self.memory.len();
        }
    }

    fn read(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.memory[self.pointer];
            self.pointer = (self.pointer + 1) % self.memory.len();
        }
    }
}

/// Simulated FT4222H bridge
pub struct DummyBridge {
    config: DummyConfig,
    mode: BridgeMode,
    clock: Option<SystemClock>,
    divisor: Option<ClockDivisor>,
    spi_mode: (ClockPolarity, ClockPhase),
    drive: Option<DriveStrength>,
    targets: BTreeMap<u16, Target>,
    miso: VecDeque<u8>,
    i2c_status: I2cControllerStatus,
    faults: HashMap<Operation, Fault>,
    calls: Vec<Call>,
}

impl DummyBridge {
    /// Create a new bridge with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let targets = config
            .i2c_targets
            .iter()
            .map(|&addr| (addr, Target::new(config.target_size)))
            .collect();
        Self {
            config,
            mode: BridgeMode::Idle,
            clock: None,
            divisor: None,
            spi_mode: (ClockPolarity::IdleLow, ClockPhase::Leading),
            drive: None,
            targets,
            miso: VecDeque::new(),
            i2c_status: I2cControllerStatus::IDLE,
            faults: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Create a new bridge with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    pub fn mode(&self) -> BridgeMode {
        self.mode
    }

    /// System clock and divisor last programmed
    pub fn clocking(&self) -> (Option<SystemClock>, Option<ClockDivisor>) {
        (self.clock, self.divisor)
    }

    pub fn spi_mode(&self) -> (ClockPolarity, ClockPhase) {
        self.spi_mode
    }

    pub fn drive_strength(&self) -> Option<DriveStrength> {
        self.drive
    }

    /// Every primitive invocation so far, oldest first
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Queue bytes to be clocked in on MISO by later reads
    pub fn queue_miso(&mut self, bytes: &[u8]) {
        self.miso.extend(bytes);
    }

    /// Make the next call to `op` fail with `status`
    pub fn fail_next(&mut self, op: Operation, status: impl Into<FtStatus>) {
        self.faults.insert(op, Fault::Status(status.into()));
    }

    /// Make the next call to `op` report at most `transferred` bytes
    pub fn short_next(&mut self, op: Operation, transferred: usize) {
        self.faults.insert(op, Fault::Short(transferred));
    }

    /// Contents of a simulated I2C target
    pub fn target_memory(&self, addr: u16) -> Option<&[u8]> {
        self.targets.get(&addr).map(|t| t.memory.as_slice())
    }

    /// Record the call and apply any pending fault
    ///
    /// Returns the transfer cap of a pending short fault.
    fn enter(&mut self, call: Call) -> FtResult<Option<usize>> {
        let op = call.op;
        log::trace!("dummy: {:?}", call);
        self.calls.push(call);
        match self.faults.remove(&op) {
            Some(Fault::Status(status)) => Err(status),
            Some(Fault::Short(n)) => Ok(Some(n)),
            None => Ok(None),
        }
    }

    fn require_spi(&self) -> FtResult<SpiLines> {
        match self.mode {
            BridgeMode::Spi { lines } => Ok(lines),
            _ => Err(StatusCode::IsNotSpiMode.into()),
        }
    }

    fn require_spi_single(&self) -> FtResult<()> {
        match self.require_spi()? {
            SpiLines::Single => Ok(()),
            _ => Err(StatusCode::IsNotSpiSingleMode.into()),
        }
    }

    fn require_i2c(&self) -> FtResult<()> {
        match self.mode {
            BridgeMode::I2c { .. } => Ok(()),
            _ => Err(StatusCode::IsNotI2cMode.into()),
        }
    }

    fn require_slave(slave: u16) -> FtResult<()> {
        if slave > 0x7F {
            return Err(StatusCode::WrongI2cAddr.into());
        }
        Ok(())
    }

    fn fill_miso(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.miso.pop_front().unwrap_or(self.config.miso_fill);
        }
    }

    fn target_read(&mut self, slave: u16, buf: &mut [u8], cap: Option<usize>) -> usize {
        match self.targets.get_mut(&slave) {
            Some(target) => {
                let n = capped(cap, buf.len());
                target.read(&mut buf[..n]);
                self.i2c_status = I2cControllerStatus::IDLE;
                n
            }
            None => {
                self.i2c_status = I2cControllerStatus::IDLE
                    | I2cControllerStatus::ERROR
                    | I2cControllerStatus::ADDRESS_NACK;
                0
            }
        }
    }

    fn target_write(&mut self, slave: u16, data: &[u8], cap: Option<usize>) -> usize {
        match self.targets.get_mut(&slave) {
            Some(target) => {
                let n = capped(cap, data.len());
                target.write(&data[..n]);
                self.i2c_status = I2cControllerStatus::IDLE;
                n
            }
            None => {
                self.i2c_status = I2cControllerStatus::IDLE
                    | I2cControllerStatus::ERROR
                    | I2cControllerStatus::ADDRESS_NACK;
                0
            }
        }
    }
}

fn capped(cap: Option<usize>, len: usize) -> usize {
    cap.map_or(len, |cap| cap.min(len))
}

impl BridgeTransport for DummyBridge {
    fn uninitialize(&mut self) -> FtResult<()> {
        self.enter(Call::new(Operation::Uninitialize))?;
        self.mode = BridgeMode::Idle;
        Ok(())
    }

    fn version(&mut self) -> FtResult<ChipVersion> {
        self.enter(Call::new(Operation::GetVersion))?;
        Ok(ChipVersion {
            chip: self.config.chip_version,
            dll: self.config.dll_version,
        })
    }

    fn chip_reset(&mut self) -> FtResult<()> {
        self.enter(Call::new(Operation::ChipReset))?;
        self.mode = BridgeMode::Idle;
        self.clock = None;
        self.divisor = None;
        self.miso.clear();
        Ok(())
    }

    fn set_clock(&mut self, clock: SystemClock) -> FtResult<()> {
        self.enter(Call::new(Operation::SetClock))?;
        self.clock = Some(clock);
        Ok(())
    }

    fn spi_master_init(
        &mut self,
        lines: SpiLines,
        divisor: ClockDivisor,
        cpol: ClockPolarity,
        cpha: ClockPhase,
        cs_mask: u8,
    ) -> FtResult<()> {
        self.enter(Call::new(Operation::SpiMasterInit))?;
        if cs_mask == 0 || cs_mask > 0x0F {
            return Err(StatusCode::InvalidParameter.into());
        }
        self.mode = BridgeMode::Spi { lines };
        self.divisor = Some(divisor);
        self.spi_mode = (cpol, cpha);
        log::debug!(
            "dummy: SPI master, {} lines, {} {}",
            lines.count(),
            self.clock.unwrap_or(SystemClock::Clock60MHz),
            divisor
        );
        Ok(())
    }

    fn spi_set_lines(&mut self, lines: SpiLines) -> FtResult<()> {
        self.enter(Call::new(Operation::SpiMasterSetLines))?;
        self.require_spi()?;
        self.mode = BridgeMode::Spi { lines };
        Ok(())
    }

    fn spi_set_mode(&mut self, cpol: ClockPolarity, cpha: ClockPhase) -> FtResult<()> {
        self.enter(Call::new(Operation::SpiMasterSetMode))?;
        self.require_spi()?;
        self.spi_mode = (cpol, cpha);
        Ok(())
    }

    fn spi_reset_transaction(&mut self, index: u8) -> FtResult<()> {
        self.enter(Call::new(Operation::SpiResetTransaction))?;
        self.require_spi()?;
        if index > 3 {
            return Err(StatusCode::InvalidParameter.into());
        }
        Ok(())
    }

    fn spi_reset(&mut self) -> FtResult<()> {
        self.enter(Call::new(Operation::SpiReset))?;
        self.require_spi()?;
        self.miso.clear();
        Ok(())
    }

    fn spi_set_drive_strength(
        &mut self,
        clk: DriveStrength,
        io: DriveStrength,
        cs: DriveStrength,
    ) -> FtResult<()> {
        self.enter(Call::new(Operation::SpiSetDrivingStrength))?;
        if clk != io || io != cs {
            log::debug!("dummy: mixed drive strengths, keeping clock pin value");
        }
        self.drive = Some(clk);
        Ok(())
    }

    fn spi_single_write(&mut self, data: &[u8], end_transaction: bool) -> FtResult<usize> {
        let cap = self.enter(
            Call::new(Operation::SpiMasterSingleWrite)
                .write(data)
                .end(end_transaction),
        )?;
        self.require_spi_single()?;
        Ok(capped(cap, data.len()))
    }

    fn spi_single_read(&mut self, buf: &mut [u8], end_transaction: bool) -> FtResult<usize> {
        let cap = self.enter(
            Call::new(Operation::SpiMasterSingleRead)
                .read(buf.len())
                .end(end_transaction),
        )?;
        self.require_spi_single()?;
        let n = capped(cap, buf.len());
        self.fill_miso(&mut buf[..n]);
        Ok(n)
    }

    fn spi_single_read_write(
        &mut self,
        read: &mut [u8],
        write: &[u8],
        end_transaction: bool,
    ) -> FtResult<usize> {
        let cap = self.enter(
            Call::new(Operation::SpiMasterSingleReadWrite)
                .write(write)
                .read(read.len())
                .end(end_transaction),
        )?;
        self.require_spi_single()?;
        if read.len() != write.len() {
            return Err(StatusCode::InvalidParameter.into());
        }
        let n = capped(cap, read.len());
        if self.config.loopback {
            read[..n].copy_from_slice(&write[..n]);
        } else {
            self.fill_miso(&mut read[..n]);
        }
        Ok(n)
    }

    fn spi_multi_read_write(
        &mut self,
        read: &mut [u8],
        write: &[u8],
        single_write: usize,
        multi_write: usize,
    ) -> FtResult<usize> {
        let cap = self.enter(
            Call::new(Operation::SpiMasterMultiReadWrite)
                .write(write)
                .read(read.len()),
        )?;
        let lines = self.require_spi()?;
        if lines == SpiLines::Single {
            return Err(StatusCode::IsNotSpiMultiMode.into());
        }
        if single_write > MAX_MULTI_SINGLE_WRITE
            || multi_write > MAX_MULTI_WRITE
            || single_write + multi_write != write.len()
        {
            return Err(StatusCode::InvalidParameter.into());
        }
        let n = capped(cap, read.len());
        self.fill_miso(&mut read[..n]);
        Ok(n)
    }

    fn i2c_master_init(&mut self, kbps: u32) -> FtResult<()> {
        self.enter(Call::new(Operation::I2cMasterInit))?;
        if !self.config.i2c_capable {
            return Err(StatusCode::I2cNotSupportedInThisMode.into());
        }
        if !I2C_KBPS_RANGE.contains(&kbps) {
            return Err(StatusCode::InvalidParameter.into());
        }
        self.mode = BridgeMode::I2c { kbps };
        self.i2c_status = I2cControllerStatus::IDLE;
        Ok(())
    }

    fn i2c_read(&mut self, slave: u16, buf: &mut [u8]) -> FtResult<usize> {
        let cap = self.enter(Call::new(Operation::I2cMasterRead).read(buf.len()))?;
        self.require_i2c()?;
        Self::require_slave(slave)?;
        Ok(self.target_read(slave, buf, cap))
    }

    fn i2c_write(&mut self, slave: u16, data: &[u8]) -> FtResult<usize> {
        let cap = self.enter(Call::new(Operation::I2cMasterWrite).write(data))?;
        self.require_i2c()?;
        Self::require_slave(slave)?;
        Ok(self.target_write(slave, data, cap))
    }

    fn i2c_read_ex(&mut self, slave: u16, flags: u8, buf: &mut [u8]) -> FtResult<usize> {
        let cap = self.enter(
            Call::new(Operation::I2cMasterReadEx)
                .read(buf.len())
                .flags(flags),
        )?;
        self.require_i2c()?;
        Self::require_slave(slave)?;
        Ok(self.target_read(slave, buf, cap))
    }

    fn i2c_write_ex(&mut self, slave: u16, flags: u8, data: &[u8]) -> FtResult<usize> {
        let cap = self.enter(
            Call::new(Operation::I2cMasterWriteEx)
                .write(data)
                .flags(flags),
        )?;
        self.require_i2c()?;
        Self::require_slave(slave)?;
        Ok(self.target_write(slave, data, cap))
    }

    fn i2c_status(&mut self) -> FtResult<I2cControllerStatus> {
        self.enter(Call::new(Operation::I2cMasterGetStatus))?;
        self.require_i2c()?;
        Ok(self.i2c_status)
    }

    fn i2c_reset(&mut self) -> FtResult<()> {
        self.enter(Call::new(Operation::I2cMasterReset))?;
        self.require_i2c()?;
        self.i2c_status = I2cControllerStatus::IDLE;
        Ok(())
    }

    fn i2c_reset_bus(&mut self) -> FtResult<()> {
        self.enter(Call::new(Operation::I2cMasterResetBus))?;
        self.require_i2c()?;
        self.i2c_status = I2cControllerStatus::IDLE;
        Ok(())
    }
}

/// Adapter provider backed by simulated bridges
#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    config: DummyConfig,
}

impl DummyProvider {
    pub fn new(config: DummyConfig) -> Self {
        Self { config }
    }
}

impl AdapterProvider for DummyProvider {
    fn adapters(&self) -> Vec<AdapterInfo> {
        (0..self.config.adapters)
            .map(|index| AdapterInfo {
                index,
                description: "FT4222 A (simulated)".to_string(),
                serial: format!("DUMMY{:04}", index),
                location: 0x1000 + index as u32,
            })
            .collect()
    }

    fn open(&mut self, index: usize) -> FtResult<BoxedTransport> {
        if index >= self.config.adapters {
            return Err(StatusCode::DeviceNotFound.into());
        }
        log::debug!("dummy: opening simulated adapter {}", index);
        Ok(Box::new(DummyBridge::new(self.config.clone())))
    }
}
