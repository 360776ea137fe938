//! Vendor status codes and their classification
//!
//! Every bridge primitive reports a raw `u32` status from one of two vendor
//! ranges: the generic D2XX codes (0..=19) and the FT4222-specific codes
//! (1000..=1022). The classifier folds that open set into the closed
//! [`OutcomeStatus`] space callers act on.

use core::fmt;

use crate::operation::{Operation, Subsystem};

/// Raw vendor status as reported by a bridge primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FtStatus(pub u32);

impl FtStatus {
    /// `FT_OK`
    pub const OK: FtStatus = FtStatus(0);

    /// Look up the named code, if the value is one the vendor defines
    pub fn code(self) -> Option<StatusCode> {
        StatusCode::from_raw(self.0)
    }

    /// True for `FT_OK`
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl From<StatusCode> for FtStatus {
    fn from(code: StatusCode) -> Self {
        FtStatus(code as u32)
    }
}

impl fmt::Display for FtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{} ({})", code.name(), self.0),
            None => write!(f, "unknown status {}", self.0),
        }
    }
}

macro_rules! status_codes {
    ($($variant:ident = $value:literal => $name:literal,)*) => {
        /// Every status value the vendor library defines
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum StatusCode {
            $(
                #[doc = $name]
                $variant = $value,
            )*
        }

        impl StatusCode {
            /// Map a raw value onto a named code
            pub fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $($value => Some(StatusCode::$variant),)*
                    _ => None,
                }
            }

            /// Vendor symbol for this code
            pub fn name(self) -> &'static str {
                match self {
                    $(StatusCode::$variant => $name,)*
                }
            }
        }
    };
}

status_codes! {
    Ok = 0 => "FT_OK",
    InvalidHandle = 1 => "FT_INVALID_HANDLE",
    DeviceNotFound = 2 => "FT_DEVICE_NOT_FOUND",
    DeviceNotOpened = 3 => "FT_DEVICE_NOT_OPENED",
    IoError = 4 => "FT_IO_ERROR",
    InsufficientResources = 5 => "FT_INSUFFICIENT_RESOURCES",
    InvalidParameter = 6 => "FT_INVALID_PARAMETER",
    InvalidBaudRate = 7 => "FT_INVALID_BAUD_RATE",
    DeviceNotOpenedForErase = 8 => "FT_DEVICE_NOT_OPENED_FOR_ERASE",
    DeviceNotOpenedForWrite = 9 => "FT_DEVICE_NOT_OPENED_FOR_WRITE",
    FailedToWriteDevice = 10 => "FT_FAILED_TO_WRITE_DEVICE",
    EepromReadFailed = 11 => "FT_EEPROM_READ_FAILED",
    EepromWriteFailed = 12 => "FT_EEPROM_WRITE_FAILED",
    EepromEraseFailed = 13 => "FT_EEPROM_ERASE_FAILED",
    EepromNotPresent = 14 => "FT_EEPROM_NOT_PRESENT",
    EepromNotProgrammed = 15 => "FT_EEPROM_NOT_PROGRAMMED",
    InvalidArgs = 16 => "FT_INVALID_ARGS",
    NotSupported = 17 => "FT_NOT_SUPPORTED",
    OtherError = 18 => "FT_OTHER_ERROR",
    DeviceListNotReady = 19 => "FT_DEVICE_LIST_NOT_READY",
    DeviceNotSupported = 1000 => "FT4222_DEVICE_NOT_SUPPORTED",
    ClkNotSupported = 1001 => "FT4222_CLK_NOT_SUPPORTED",
    VendorCmdNotSupported = 1002 => "FT4222_VENDER_CMD_NOT_SUPPORTED",
    IsNotSpiMode = 1003 => "FT4222_IS_NOT_SPI_MODE",
    IsNotI2cMode = 1004 => "FT4222_IS_NOT_I2C_MODE",
    IsNotSpiSingleMode = 1005 => "FT4222_IS_NOT_SPI_SINGLE_MODE",
    IsNotSpiMultiMode = 1006 => "FT4222_IS_NOT_SPI_MULTI_MODE",
    WrongI2cAddr = 1007 => "FT4222_WRONG_I2C_ADDR",
    InvalidFunction = 1008 => "FT4222_INVAILD_FUNCTION",
    InvalidPointer = 1009 => "FT4222_INVALID_POINTER",
    ExceededMaxTransferSize = 1010 => "FT4222_EXCEEDED_MAX_TRANSFER_SIZE",
    FailedToReadDevice = 1011 => "FT4222_FAILED_TO_READ_DEVICE",
    I2cNotSupportedInThisMode = 1012 => "FT4222_I2C_NOT_SUPPORTED_IN_THIS_MODE",
    GpioNotSupportedInThisMode = 1013 => "FT4222_GPIO_NOT_SUPPORTED_IN_THIS_MODE",
    GpioExceededMaxPortNum = 1014 => "FT4222_GPIO_EXCEEDED_MAX_PORTNUM",
    GpioWriteNotSupported = 1015 => "FT4222_GPIO_WRITE_NOT_SUPPORTED",
    GpioPullupInvalidInInputMode = 1016 => "FT4222_GPIO_PULLUP_INVALID_IN_INPUTMODE",
    GpioPulldownInvalidInInputMode = 1017 => "FT4222_GPIO_PULLDOWN_INVALID_IN_INPUTMODE",
    GpioOpendrainInvalidInOutputMode = 1018 => "FT4222_GPIO_OPENDRAIN_INVALID_IN_OUTPUTMODE",
    InterruptNotSupported = 1019 => "FT4222_INTERRUPT_NOT_SUPPORTED",
    GpioInputNotSupported = 1020 => "FT4222_GPIO_INPUT_NOT_SUPPORTED",
    EventNotSupported = 1021 => "FT4222_EVENT_NOT_SUPPORTED",
    FunNotSupport = 1022 => "FT4222_FUN_NOT_SUPPORT",
}

/// Closed set of outcomes a transaction can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    /// Completed with the requested byte count
    Ok,
    /// No adapter is attached, or the adapter was closed
    DeviceNotOpened,
    /// Argument rejected, by validation or by the device
    InvalidParameter,
    /// The device rejected a buffer pointer
    InvalidPointer,
    /// SPI primitive issued while the bridge is not in SPI mode
    NotSpiMode,
    /// I2C primitive issued while the bridge is not in I2C mode
    NotI2cMode,
    /// Single-line SPI primitive issued in a multi-line mode
    NotSpiSingleMode,
    /// The attached chip does not support this operation
    DeviceNotSupported,
    /// I2C is unavailable in the chip's current configuration
    I2cModeNotSupported,
    /// The device reported a write failure
    FailedToWriteDevice,
    /// The device reported a read failure
    FailedToReadDevice,
    /// The primitive succeeded but moved fewer bytes than requested
    ShortTransfer,
    /// Any other status
    UnknownHardwareError,
}

impl OutcomeStatus {
    /// True only for [`OutcomeStatus::Ok`]
    pub fn is_ok(self) -> bool {
        self == OutcomeStatus::Ok
    }

    /// Stable diagnostic name
    pub fn name(self) -> &'static str {
        match self {
            OutcomeStatus::Ok => "ok",
            OutcomeStatus::DeviceNotOpened => "device not opened",
            OutcomeStatus::InvalidParameter => "invalid parameter",
            OutcomeStatus::InvalidPointer => "invalid pointer",
            OutcomeStatus::NotSpiMode => "not in SPI mode",
            OutcomeStatus::NotI2cMode => "not in I2C mode",
            OutcomeStatus::NotSpiSingleMode => "not in SPI single mode",
            OutcomeStatus::DeviceNotSupported => "device not supported",
            OutcomeStatus::I2cModeNotSupported => "I2C not supported in this mode",
            OutcomeStatus::FailedToWriteDevice => "failed to write device",
            OutcomeStatus::FailedToReadDevice => "failed to read device",
            OutcomeStatus::ShortTransfer => "short transfer",
            OutcomeStatus::UnknownHardwareError => "unknown hardware error",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a raw status in the context of the operation that produced it
pub fn classify(raw: FtStatus, op: Operation) -> OutcomeStatus {
    let Some(code) = raw.code() else {
        return OutcomeStatus::UnknownHardwareError;
    };
    let subsystem = op.subsystem();

    match code {
        StatusCode::Ok => OutcomeStatus::Ok,
        StatusCode::DeviceNotOpened => OutcomeStatus::DeviceNotOpened,
        StatusCode::InvalidParameter => OutcomeStatus::InvalidParameter,
        StatusCode::InvalidPointer => OutcomeStatus::InvalidPointer,
        StatusCode::IsNotSpiMode => OutcomeStatus::NotSpiMode,
        StatusCode::IsNotI2cMode => OutcomeStatus::NotI2cMode,
        StatusCode::IsNotSpiSingleMode => OutcomeStatus::NotSpiSingleMode,
        StatusCode::DeviceNotSupported => OutcomeStatus::DeviceNotSupported,
        StatusCode::I2cNotSupportedInThisMode => OutcomeStatus::I2cModeNotSupported,
        StatusCode::FailedToWriteDevice => OutcomeStatus::FailedToWriteDevice,
        StatusCode::FailedToReadDevice => OutcomeStatus::FailedToReadDevice,

        StatusCode::NotSupported | StatusCode::FunNotSupport => match subsystem {
            Subsystem::Spi => OutcomeStatus::NotSpiMode,
            Subsystem::I2c => OutcomeStatus::NotI2cMode,
            Subsystem::Adapter => OutcomeStatus::DeviceNotSupported,
        },
        StatusCode::IsNotSpiMultiMode => match subsystem {
            Subsystem::Spi => OutcomeStatus::NotSpiMode,
            Subsystem::I2c | Subsystem::Adapter => OutcomeStatus::UnknownHardwareError,
        },

        // FT_IO_ERROR stays opaque: it is not a directional failure.
        StatusCode::InvalidHandle
        | StatusCode::DeviceNotFound
        | StatusCode::IoError
        | StatusCode::InsufficientResources
        | StatusCode::InvalidBaudRate
        | StatusCode::DeviceNotOpenedForErase
        | StatusCode::DeviceNotOpenedForWrite
        | StatusCode::EepromReadFailed
        | StatusCode::EepromWriteFailed
        | StatusCode::EepromEraseFailed
        | StatusCode::EepromNotPresent
        | StatusCode::EepromNotProgrammed
        | StatusCode::InvalidArgs
        | StatusCode::OtherError
        | StatusCode::DeviceListNotReady
        | StatusCode::ClkNotSupported
        | StatusCode::VendorCmdNotSupported
        | StatusCode::WrongI2cAddr
        | StatusCode::InvalidFunction
        | StatusCode::ExceededMaxTransferSize
        | StatusCode::GpioNotSupportedInThisMode
        | StatusCode::GpioExceededMaxPortNum
        | StatusCode::GpioWriteNotSupported
        | StatusCode::GpioPullupInvalidInInputMode
        | StatusCode::GpioPulldownInvalidInInputMode
        | StatusCode::GpioOpendrainInvalidInOutputMode
        | StatusCode::InterruptNotSupported
        | StatusCode::GpioInputNotSupported
        | StatusCode::EventNotSupported => OutcomeStatus::UnknownHardwareError,
    }
}

/// Classify a status that arrived through a primitive's error channel
///
/// Same as [`classify`], except that a stray `FT_OK` is not allowed to pass
/// as success.
pub fn classify_failure(raw: FtStatus, op: Operation) -> OutcomeStatus {
    match classify(raw, op) {
        OutcomeStatus::Ok => OutcomeStatus::UnknownHardwareError,
        outcome => outcome,
    }
}
