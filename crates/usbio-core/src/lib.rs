//! usbio-core - Transaction command layer for FT4222H-class bridges
//!
//! This crate holds everything between a script command and the vendor
//! primitives of a USB SPI/I2C master bridge:
//!
//! - [`clock`]: quantize a requested bus frequency to a system clock and divisor
//! - [`buffer`]: fixed-capacity transmit/receive buffers
//! - [`status`]: the vendor status codes and their classification into [`OutcomeStatus`]
//! - [`session`]: the executor that runs one transaction against an attached transport
//!
//! The bridge itself is abstracted by [`BridgeTransport`]; adapters are
//! obtained from an [`AdapterProvider`].

pub mod buffer;
pub mod clock;
pub mod error;
pub mod operation;
pub mod request;
pub mod session;
pub mod status;
pub mod transport;

pub use buffer::{BufferError, TransferBuffer, TransferBuffers, TRANSFER_BUFFER_SIZE};
pub use clock::{ClockConfig, ClockDivisor, SystemClock, DEFAULT_FREQUENCY_KHZ};
pub use error::{Error, Result};
pub use operation::{Operation, Subsystem};
pub use request::{
    ClockPhase, ClockPolarity, Continuation, DriveStrength, I2cCondition, SpiLines,
    TransactionRequest,
};
pub use session::Session;
pub use status::{classify, FtStatus, OutcomeStatus, StatusCode};
pub use transport::{
    AdapterInfo, AdapterProvider, BoxedTransport, BridgeTransport, ChipVersion, FtResult,
    I2cControllerStatus,
};
