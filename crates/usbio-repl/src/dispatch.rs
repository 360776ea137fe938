//! Command table and argument validation
//!
//! The dispatcher is independent of the script engine: commands arrive as
//! a name plus a list of [`Arg`] values and leave as a [`Reply`]. Arity and
//! argument types are checked here, before the session sees the request.

use thiserror::Error;
use usbio_core::status::classify_failure;
use usbio_core::{
    AdapterProvider, ClockPhase, ClockPolarity, Continuation, DriveStrength, FtStatus,
    I2cCondition, Operation, OutcomeStatus, Session, SpiLines, StatusCode,
};

/// Token that keeps chip-select asserted after an SPI single transfer
pub const CS_KEEP: &str = "cs_keep";

/// One script-level argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Bool(bool),
    /// A string or symbol
    Text(String),
    List(Vec<Arg>),
    /// Anything else, kept as its printed form for diagnostics
    Other(String),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Int(_) => "an integer",
            Arg::Bool(_) => "a boolean",
            Arg::Text(_) => "a string",
            Arg::List(_) => "a list",
            Arg::Other(_) => "an unsupported value",
        }
    }
}

/// Script-visible result of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Unit,
    Int(i64),
    Bytes(Vec<u8>),
    Ints(Vec<i64>),
}

/// Why a command was rejected or failed
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid command name \"{0}\"")]
    UnknownCommand(String),

    #[error("wrong # args: should be \"{usage}\"")]
    Usage { usage: String },

    #[error("{command}: <{name}> {reason}")]
    Argument {
        command: &'static str,
        name: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Command(#[from] usbio_core::Error),

    #[error("no adapter detected")]
    NoAdapters,

    #[error("adapter number {index} is beyond available range 0..{available}, use adapter_list to show available adapters")]
    AdapterIndex { index: i64, available: usize },

    #[error("opening adapter {index} failed: {outcome} [{raw}]")]
    OpenFailed {
        index: usize,
        raw: FtStatus,
        outcome: OutcomeStatus,
    },
}

impl DispatchError {
    /// Classified outcome of the failure
    pub fn outcome(&self) -> OutcomeStatus {
        match self {
            DispatchError::UnknownCommand(_)
            | DispatchError::Usage { .. }
            | DispatchError::Argument { .. }
            | DispatchError::AdapterIndex { .. } => OutcomeStatus::InvalidParameter,
            DispatchError::Command(err) => err.outcome(),
            DispatchError::NoAdapters => OutcomeStatus::UnknownHardwareError,
            DispatchError::OpenFailed { outcome, .. } => *outcome,
        }
    }
}

type Handler = fn(&mut Dispatcher, &Args<'_>) -> Result<Reply, DispatchError>;

/// Entry of the command table
pub struct CommandSpec {
    pub name: &'static str,
    /// Parameter synopsis, optional ones in `?...?`
    pub params: &'static str,
    pub summary: &'static str,
    min_args: usize,
    max_args: usize,
    handler: Handler,
}

impl CommandSpec {
    pub fn usage(&self) -> String {
        if self.params.is_empty() {
            self.name.to_string()
        } else {
            format!("{} {}", self.name, self.params)
        }
    }
}

macro_rules! command {
    ($name:literal, $params:literal, $summary:literal, $min:literal..=$max:literal, $handler:ident) => {
        CommandSpec {
            name: $name,
            params: $params,
            summary: $summary,
            min_args: $min,
            max_args: $max,
            handler: $handler,
        }
    };
}

/// Every command exposed to scripts
pub static COMMANDS: &[CommandSpec] = &[
    command!("adapter_list", "", "List the adapters the backend offers", 0..=0, adapter_list),
    command!("adapter_open", "<index>", "Open an adapter from the list", 1..=1, adapter_open),
    command!("adapter_close", "", "Close the open adapter", 0..=0, adapter_close),
    command!("adapter_uninitialize", "", "Release the chip's mode configuration", 0..=0, adapter_uninitialize),
    command!("adapter_get_version", "", "Return (chip-version library-version)", 0..=0, adapter_get_version),
    command!("adapter_chip_reset", "", "Reset the bridge chip", 0..=0, adapter_chip_reset),
    command!("set_frequency", "<kHz>", "Select the SPI clock used by the next spi_init", 1..=1, set_frequency),
    command!("spi_init", "<lines> <cpol> <cpha>", "Enter SPI master mode with the selected clock", 3..=3, spi_init),
    command!("spi_set_lines", "<lines>", "Change the number of SPI data lines (1/2/4)", 1..=1, spi_set_lines),
    command!("spi_set_mode", "<cpol> <cpha>", "Change SPI clock polarity and phase", 2..=2, spi_set_mode),
    command!("spi_reset_transaction", "", "Abort the transaction on chip-select 0", 0..=0, spi_reset_transaction),
    command!("spi_reset", "", "Reset the SPI master", 0..=0, spi_reset),
    command!("spi_set_drive_strength", "<0~3>", "Set pin drive to 4/8/12/16 mA", 1..=1, spi_set_drive_strength),
    command!("spi_write", "<bytes> <length> ?cs_keep?", "Single-line write", 2..=3, spi_write),
    command!("spi_read", "<length> ?cs_keep?", "Single-line read, returns bytes", 1..=2, spi_read),
    command!("spi_read_write", "<bytes> <length> ?cs_keep?", "Full-duplex transfer, returns bytes", 2..=3, spi_read_write),
    command!("spi_multi_read_write", "<bytes> <single_write> <multi_write> <multi_read>", "Multi-line transfer, returns bytes", 4..=4, spi_multi_read_write),
    command!("i2c_init", "<kbps>", "Enter I2C master mode", 1..=1, i2c_init),
    command!("i2c_read", "<slave> <length>", "I2C read, returns bytes", 2..=2, i2c_read),
    command!("i2c_write", "<slave> <bytes> <length>", "I2C write", 3..=3, i2c_write),
    command!("i2c_read_ex", "<slave> <length> <condition>", "I2C read with explicit framing, returns bytes", 3..=3, i2c_read_ex),
    command!("i2c_write_ex", "<slave> <bytes> <length> <condition>", "I2C write with explicit framing", 4..=4, i2c_write_ex),
    command!("i2c_get_status", "", "Return the I2C controller status byte", 0..=0, i2c_get_status),
    command!("i2c_reset", "", "Reset the I2C master", 0..=0, i2c_reset),
    command!("i2c_reset_bus", "", "Recover a stuck I2C bus", 0..=0, i2c_reset_bus),
];

/// Look up a command by name
pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// Owns the session and the adapter source for one script run
pub struct Dispatcher {
    session: Session,
    provider: Box<dyn AdapterProvider + Send>,
}

impl Dispatcher {
    pub fn new(provider: Box<dyn AdapterProvider + Send>) -> Self {
        Self::with_session(provider, Session::new())
    }

    pub fn with_session(provider: Box<dyn AdapterProvider + Send>, session: Session) -> Self {
        Self { session, provider }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Open adapter `index` and attach it to the session
    pub fn open_adapter(&mut self, index: i64) -> Result<(), DispatchError> {
        let adapters = self.provider.adapters();
        if adapters.is_empty() {
            return Err(DispatchError::NoAdapters);
        }
        let info = usize::try_from(index)
            .ok()
            .and_then(|i| adapters.get(i))
            .ok_or(DispatchError::AdapterIndex {
                index,
                available: adapters.len(),
            })?;

        let transport = self
            .provider
            .open(info.index)
            .map_err(|raw| DispatchError::OpenFailed {
                index: info.index,
                raw,
                outcome: classify_failure(raw, Operation::Open),
            })?;
        if self.session.attach(transport).is_some() {
            log::info!("closed previously open adapter");
        }
        log::info!("opened adapter {}", info);
        Ok(())
    }

    /// Run one command
    pub fn dispatch(&mut self, name: &str, args: &[Arg]) -> Result<Reply, DispatchError> {
        let spec = find_command(name).ok_or_else(|| DispatchError::UnknownCommand(name.to_string()))?;
        if args.len() < spec.min_args || args.len() > spec.max_args {
            return Err(DispatchError::Usage {
                usage: spec.usage(),
            });
        }
        log::debug!("{} {:?}", spec.name, args);
        let reply = (spec.handler)(self, &Args {
            command: spec.name,
            args,
        })?;
        log::debug!("{}, done", spec.name);
        Ok(reply)
    }
}

/// Positional arguments of one command, with typed accessors
struct Args<'a> {
    command: &'static str,
    args: &'a [Arg],
}

impl Args<'_> {
    fn invalid(&self, name: &'static str, reason: impl Into<String>) -> DispatchError {
        DispatchError::Argument {
            command: self.command,
            name,
            reason: reason.into(),
        }
    }

    fn int(&self, index: usize, name: &'static str) -> Result<i64, DispatchError> {
        match self.args.get(index) {
            Some(Arg::Int(value)) => Ok(*value),
            Some(other) => Err(self.invalid(name, format!("should be an integer, got {}", other.kind()))),
            None => Err(self.invalid(name, "is missing")),
        }
    }

    fn unsigned(&self, index: usize, name: &'static str) -> Result<u64, DispatchError> {
        let value = self.int(index, name)?;
        u64::try_from(value).map_err(|_| self.invalid(name, format!("should not be negative, got {}", value)))
    }

    fn length(&self, index: usize, name: &'static str) -> Result<usize, DispatchError> {
        let value = self.unsigned(index, name)?;
        usize::try_from(value).map_err(|_| self.invalid(name, format!("{} is too large", value)))
    }

    fn bit(&self, index: usize, name: &'static str) -> Result<i64, DispatchError> {
        match self.int(index, name)? {
            bit @ (0 | 1) => Ok(bit),
            other => Err(self.invalid(name, format!("should be 0/1, got {}", other))),
        }
    }

    fn lines(&self, index: usize) -> Result<SpiLines, DispatchError> {
        let count = self.int(index, "lines")?;
        SpiLines::from_count(count).ok_or_else(|| self.invalid("lines", format!("should be 1/2/4, got {}", count)))
    }

    fn cpol(&self, index: usize) -> Result<ClockPolarity, DispatchError> {
        let bit = self.bit(index, "cpol")?;
        ClockPolarity::from_bit(bit).ok_or_else(|| self.invalid("cpol", "should be 0/1"))
    }

    fn cpha(&self, index: usize) -> Result<ClockPhase, DispatchError> {
        let bit = self.bit(index, "cpha")?;
        ClockPhase::from_bit(bit).ok_or_else(|| self.invalid("cpha", "should be 0/1"))
    }

    fn slave(&self, index: usize) -> Result<u16, DispatchError> {
        let value = self.int(index, "slave")?;
        u16::try_from(value).map_err(|_| self.invalid("slave", format!("0x{:X} is not an I2C address", value)))
    }

    /// Bytes from a list of integers or from a string's raw bytes
    fn bytes(&self, index: usize, name: &'static str) -> Result<Vec<u8>, DispatchError> {
        match self.args.get(index) {
            Some(Arg::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Arg::Int(value) => u8::try_from(*value)
                        .map_err(|_| self.invalid(name, format!("element {} ({}) is not a byte", i, value))),
                    other => Err(self.invalid(name, format!("element {} is {}, not a byte", i, other.kind()))),
                })
                .collect(),
            Some(Arg::Text(text)) => Ok(text.as_bytes().to_vec()),
            Some(other) => Err(self.invalid(name, format!("should be a byte list, got {}", other.kind()))),
            None => Err(self.invalid(name, "is missing")),
        }
    }

    /// Optional chip-select continuation token
    ///
    /// Anything other than `cs_keep` or `#t` ends the transaction.
    fn continuation(&self, index: usize) -> Continuation {
        match self.args.get(index) {
            None | Some(Arg::Bool(false)) => Continuation::End,
            Some(Arg::Bool(true)) => Continuation::Keep,
            Some(Arg::Text(token)) if token == CS_KEEP => Continuation::Keep,
            Some(other) => {
                log::warn!("{}: ignoring unrecognized continuation token {:?}", self.command, other);
                Continuation::End
            }
        }
    }

    fn condition(&self, index: usize) -> Result<I2cCondition, DispatchError> {
        match self.args.get(index) {
            Some(Arg::Text(token)) => I2cCondition::parse(token).ok_or_else(|| {
                self.invalid(
                    "condition",
                    format!("should be START/REPEATED_START/STOP/START_AND_STOP, got \"{}\"", token),
                )
            }),
            Some(other) => Err(self.invalid("condition", format!("should be a condition token, got {}", other.kind()))),
            None => Err(self.invalid("condition", "is missing")),
        }
    }
}

// Adapter commands

fn adapter_list(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    let adapters = d.provider.adapters();
    if adapters.is_empty() {
        return Err(DispatchError::NoAdapters);
    }
    for adapter in &adapters {
        println!("{}", adapter);
    }
    Ok(Reply::Unit)
}

fn adapter_open(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let index = args.int(0, "adapter_index")?;
    d.open_adapter(index)?;
    Ok(Reply::Unit)
}

fn adapter_close(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    match d.session.detach() {
        Some(_) => {
            log::info!("adapter closed");
            Ok(Reply::Unit)
        }
        None => Err(usbio_core::Error::hardware(Operation::Close, StatusCode::DeviceNotOpened.into()).into()),
    }
}

fn adapter_uninitialize(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    d.session.uninitialize()?;
    Ok(Reply::Unit)
}

fn adapter_get_version(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    let version = d.session.chip_version()?;
    Ok(Reply::Ints(vec![version.chip as i64, version.dll as i64]))
}

fn adapter_chip_reset(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    d.session.chip_reset()?;
    Ok(Reply::Unit)
}

// SPI commands

fn set_frequency(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let khz = args.unsigned(0, "kHz")?;
    d.session.set_frequency(khz);
    Ok(Reply::Unit)
}

fn spi_init(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let lines = args.lines(0)?;
    let cpol = args.cpol(1)?;
    let cpha = args.cpha(2)?;
    d.session.spi_init(lines, cpol, cpha)?;
    Ok(Reply::Unit)
}

fn spi_set_lines(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let lines = args.lines(0)?;
    d.session.spi_set_lines(lines)?;
    Ok(Reply::Unit)
}

fn spi_set_mode(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let cpol = args.cpol(0)?;
    let cpha = args.cpha(1)?;
    d.session.spi_set_mode(cpol, cpha)?;
    Ok(Reply::Unit)
}

fn spi_reset_transaction(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    d.session.spi_reset_transaction()?;
    Ok(Reply::Unit)
}

fn spi_reset(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    d.session.spi_reset()?;
    Ok(Reply::Unit)
}

fn spi_set_drive_strength(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let level = args.int(0, "drive_strength")?;
    let strength = DriveStrength::from_level(level)
        .ok_or_else(|| args.invalid("drive_strength", format!("should be 0~3, got {}", level)))?;
    d.session.spi_set_drive_strength(strength)?;
    Ok(Reply::Unit)
}

fn spi_write(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let data = args.bytes(0, "bytes")?;
    let length = args.length(1, "length")?;
    let keep = args.continuation(2);
    d.session.spi_write(&data, length, keep)?;
    Ok(Reply::Unit)
}

fn spi_read(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let length = args.length(0, "length")?;
    let keep = args.continuation(1);
    let data = d.session.spi_read(length, keep)?;
    Ok(Reply::Bytes(data.to_vec()))
}

fn spi_read_write(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let data = args.bytes(0, "bytes")?;
    let length = args.length(1, "length")?;
    let keep = args.continuation(2);
    let read = d.session.spi_read_write(&data, length, keep)?;
    Ok(Reply::Bytes(read.to_vec()))
}

fn spi_multi_read_write(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let data = args.bytes(0, "bytes")?;
    let single_write = args.length(1, "single_write")?;
    let multi_write = args.length(2, "multi_write")?;
    let multi_read = args.length(3, "multi_read")?;
    let read = d
        .session
        .spi_multi_read_write(&data, single_write, multi_write, multi_read)?;
    Ok(Reply::Bytes(read.to_vec()))
}

// I2C commands

fn i2c_init(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let kbps = args.unsigned(0, "kbps")?;
    let kbps = u32::try_from(kbps).map_err(|_| args.invalid("kbps", format!("{} is too large", kbps)))?;
    d.session.i2c_init(kbps)?;
    Ok(Reply::Unit)
}

fn i2c_read(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let slave = args.slave(0)?;
    let length = args.length(1, "length")?;
    let data = d.session.i2c_read(slave, length)?;
    Ok(Reply::Bytes(data.to_vec()))
}

fn i2c_write(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let slave = args.slave(0)?;
    let data = args.bytes(1, "bytes")?;
    let length = args.length(2, "length")?;
    d.session.i2c_write(slave, &data, length)?;
    Ok(Reply::Unit)
}

fn i2c_read_ex(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let slave = args.slave(0)?;
    let length = args.length(1, "length")?;
    let condition = args.condition(2)?;
    let data = d.session.i2c_read_ex(slave, length, condition)?;
    Ok(Reply::Bytes(data.to_vec()))
}

fn i2c_write_ex(d: &mut Dispatcher, args: &Args<'_>) -> Result<Reply, DispatchError> {
    let slave = args.slave(0)?;
    let data = args.bytes(1, "bytes")?;
    let length = args.length(2, "length")?;
    let condition = args.condition(3)?;
    d.session.i2c_write_ex(slave, &data, length, condition)?;
    Ok(Reply::Unit)
}

fn i2c_get_status(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    let status = d.session.i2c_status()?;
    Ok(Reply::Int(status.bits() as i64))
}

fn i2c_reset(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    d.session.i2c_reset()?;
    Ok(Reply::Unit)
}

fn i2c_reset_bus(d: &mut Dispatcher, _args: &Args<'_>) -> Result<Reply, DispatchError> {
    d.session.i2c_reset_bus()?;
    Ok(Reply::Unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use usbio_dummy::{DummyConfig, DummyProvider};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Box::new(DummyProvider::default()))
    }

    fn opened() -> Dispatcher {
        let mut d = dispatcher();
        d.dispatch("adapter_open", &[Arg::Int(0)]).unwrap();
        d
    }

    fn bytes(values: &[u8]) -> Arg {
        Arg::List(values.iter().map(|&b| Arg::Int(b as i64)).collect())
    }

    fn text(s: &str) -> Arg {
        Arg::Text(s.to_string())
    }

    #[test]
    fn test_command_names_are_unique() {
        for (i, spec) in COMMANDS.iter().enumerate() {
            assert!(
                COMMANDS[i + 1..].iter().all(|other| other.name != spec.name),
                "duplicate {}",
                spec.name
            );
            assert!(spec.min_args <= spec.max_args);
        }
    }

    #[test]
    fn test_unknown_command() {
        let err = dispatcher().dispatch("spi_frobnicate", &[]).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand(_)));
    }

    #[test]
    fn test_arity_is_checked() {
        let mut d = opened();
        let err = d.dispatch("spi_init", &[Arg::Int(1), Arg::Int(0)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "wrong # args: should be \"spi_init <lines> <cpol> <cpha>\""
        );
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);

        let err = d
            .dispatch("spi_read", &[Arg::Int(1), text(CS_KEEP), Arg::Int(0)])
            .unwrap_err();
        assert!(matches!(err, DispatchError::Usage { .. }));
    }

    #[test]
    fn test_argument_types_are_checked() {
        let mut d = opened();
        let err = d.dispatch("spi_init", &[Arg::Int(3), Arg::Int(0), Arg::Int(0)]).unwrap_err();
        assert_eq!(err.to_string(), "spi_init: <lines> should be 1/2/4, got 3");

        let err = d.dispatch("set_frequency", &[text("fast")]).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);

        let err = d.dispatch("set_frequency", &[Arg::Int(-1)]).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);

        let err = d
            .dispatch("spi_write", &[Arg::List(vec![Arg::Int(256)]), Arg::Int(1)])
            .unwrap_err();
        assert!(matches!(err, DispatchError::Argument { name: "bytes", .. }));
    }

    #[test]
    fn test_set_frequency_updates_session_clock() {
        let mut d = dispatcher();
        assert_eq!(d.dispatch("set_frequency", &[Arg::Int(100)]).unwrap(), Reply::Unit);
        assert_eq!(d.session().clock().achieved_hz, 93_750);
    }

    #[test]
    fn test_commands_without_adapter() {
        let mut d = dispatcher();
        let err = d.dispatch("spi_reset", &[]).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::DeviceNotOpened);
        let err = d.dispatch("adapter_close", &[]).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::DeviceNotOpened);
    }

    #[test]
    fn test_adapter_index_is_validated() {
        let mut d = dispatcher();
        let err = d.dispatch("adapter_open", &[Arg::Int(5)]).unwrap_err();
        assert!(matches!(err, DispatchError::AdapterIndex { index: 5, available: 1 }));
        let err = d.dispatch("adapter_open", &[Arg::Int(-1)]).unwrap_err();
        assert!(matches!(err, DispatchError::AdapterIndex { .. }));

        let mut empty = Dispatcher::new(Box::new(DummyProvider::new(DummyConfig {
            adapters: 0,
            ..DummyConfig::default()
        })));
        assert!(matches!(empty.dispatch("adapter_list", &[]).unwrap_err(), DispatchError::NoAdapters));
    }

    #[test]
    fn test_spi_session() {
        let mut d = opened();
        d.dispatch("spi_init", &[Arg::Int(1), Arg::Int(0), Arg::Int(0)]).unwrap();
        let reply = d
            .dispatch("spi_write", &[bytes(&[0xDE, 0xAD, 0xBE, 0xEF]), Arg::Int(4)])
            .unwrap();
        assert_eq!(reply, Reply::Unit);

        let reply = d
            .dispatch("spi_read_write", &[bytes(&[1, 2, 3]), Arg::Int(3), text(CS_KEEP)])
            .unwrap();
        assert_eq!(reply, Reply::Bytes(vec![1, 2, 3]));

        let reply = d.dispatch("spi_read_write", &[text("AB"), Arg::Int(2), Arg::Bool(true)]).unwrap();
        assert_eq!(reply, Reply::Bytes(b"AB".to_vec()));

        let reply = d.dispatch("spi_read", &[Arg::Int(2), text("whatever")]).unwrap();
        assert_eq!(reply, Reply::Bytes(vec![0xFF, 0xFF]));
    }

    #[test]
    fn test_multi_read_write_length_checks() {
        let mut d = opened();
        d.dispatch("spi_init", &[Arg::Int(4), Arg::Int(0), Arg::Int(0)]).unwrap();
        let reply = d
            .dispatch(
                "spi_multi_read_write",
                &[bytes(&[0xEB, 0, 1, 2, 3]), Arg::Int(2), Arg::Int(3), Arg::Int(5)],
            )
            .unwrap();
        assert_eq!(reply, Reply::Bytes(vec![0xFF; 5]));

        let err = d
            .dispatch(
                "spi_multi_read_write",
                &[bytes(&[0xEB, 0, 1, 2]), Arg::Int(2), Arg::Int(3), Arg::Int(5)],
            )
            .unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);
    }

    #[test]
    fn test_i2c_session() {
        let mut d = opened();
        d.dispatch("i2c_init", &[Arg::Int(400)]).unwrap();
        d.dispatch("i2c_write", &[Arg::Int(0x50), bytes(&[0x00, 0x11, 0x22]), Arg::Int(3)])
            .unwrap();
        d.dispatch(
            "i2c_write_ex",
            &[Arg::Int(0x50), bytes(&[0x00]), Arg::Int(1), text("START")],
        )
        .unwrap();
        let reply = d
            .dispatch("i2c_read_ex", &[Arg::Int(0x50), Arg::Int(2), text("Repeated_START")])
            .unwrap();
        assert_eq!(reply, Reply::Bytes(vec![0x11, 0x22]));

        let reply = d.dispatch("i2c_get_status", &[]).unwrap();
        assert_eq!(reply, Reply::Int(0x20));
    }

    #[test]
    fn test_invalid_condition_rejected() {
        let mut d = opened();
        d.dispatch("i2c_init", &[Arg::Int(400)]).unwrap();
        let err = d
            .dispatch("i2c_read_ex", &[Arg::Int(0x50), Arg::Int(1), text("RESTART")])
            .unwrap_err();
        assert!(matches!(err, DispatchError::Argument { name: "condition", .. }));

        let err = d
            .dispatch("i2c_write_ex", &[Arg::Int(0x50), bytes(&[0]), Arg::Int(1), Arg::Int(2)])
            .unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::InvalidParameter);
    }

    #[test]
    fn test_wrong_mode_is_classified() {
        let mut d = opened();
        d.dispatch("i2c_init", &[Arg::Int(100)]).unwrap();
        let err = d.dispatch("spi_read", &[Arg::Int(1)]).unwrap_err();
        assert_eq!(err.outcome(), OutcomeStatus::NotSpiMode);
    }

    #[test]
    fn test_version_and_drive_strength() {
        let mut d = opened();
        let reply = d.dispatch("adapter_get_version", &[]).unwrap();
        assert_eq!(reply, Reply::Ints(vec![0x4222_0400, 0x0106_0004]));

        let err = d.dispatch("spi_set_drive_strength", &[Arg::Int(4)]).unwrap_err();
        assert_eq!(err.to_string(), "spi_set_drive_strength: <drive_strength> should be 0~3, got 4");
        d.dispatch("spi_set_drive_strength", &[Arg::Int(3)]).unwrap();
    }

    #[test]
    fn test_close_keeps_clock() {
        let mut d = opened();
        d.dispatch("set_frequency", &[Arg::Int(30_000)]).unwrap();
        d.dispatch("adapter_close", &[]).unwrap();
        assert!(!d.session().is_open());
        assert_eq!(d.session().clock().achieved_hz, 30_000_000);
    }
}
