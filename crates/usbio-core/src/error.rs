//! Error types for usbio-core

use thiserror::Error;

use crate::buffer::BufferError;
use crate::operation::Operation;
use crate::status::{classify_failure, FtStatus, OutcomeStatus};

/// Result type for command layer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a command did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Rejected before any hardware access
    #[error("{op}: invalid parameter: {reason}")]
    InvalidArgument { op: Operation, reason: String },

    /// The primitive returned a failure status
    #[error("{op}: {outcome} [{raw}]")]
    Hardware {
        op: Operation,
        raw: FtStatus,
        outcome: OutcomeStatus,
    },

    /// The primitive reported success but moved the wrong number of bytes
    #[error("{op}: short transfer: {transferred} of {requested} bytes")]
    ShortTransfer {
        op: Operation,
        requested: usize,
        transferred: usize,
    },
}

impl Error {
    pub fn invalid(op: Operation, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            op,
            reason: reason.into(),
        }
    }

    /// Build a hardware error from a status returned on the failure path
    pub fn hardware(op: Operation, raw: FtStatus) -> Self {
        Error::Hardware {
            op,
            raw,
            outcome: classify_failure(raw, op),
        }
    }

    pub fn buffer(op: Operation, err: BufferError) -> Self {
        Error::invalid(op, err.to_string())
    }

    /// The primitive that failed
    pub fn operation(&self) -> Operation {
        match self {
            Error::InvalidArgument { op, .. }
            | Error::Hardware { op, .. }
            | Error::ShortTransfer { op, .. } => *op,
        }
    }

    /// Classified outcome; never [`OutcomeStatus::Ok`]
    pub fn outcome(&self) -> OutcomeStatus {
        match self {
            Error::InvalidArgument { .. } => OutcomeStatus::InvalidParameter,
            Error::Hardware { outcome, .. } => *outcome,
            Error::ShortTransfer { .. } => OutcomeStatus::ShortTransfer,
        }
    }

    /// Raw vendor status, for hardware failures
    pub fn raw_status(&self) -> Option<FtStatus> {
        match self {
            Error::Hardware { raw, .. } => Some(*raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::hardware(Operation::SpiMasterSingleWrite, FtStatus(1003));
        assert_eq!(
            err.to_string(),
            "spi_master_single_write: not in SPI mode [FT4222_IS_NOT_SPI_MODE (1003)]"
        );

        let err = Error::ShortTransfer {
            op: Operation::I2cMasterRead,
            requested: 4,
            transferred: 1,
        };
        assert_eq!(err.to_string(), "i2c_master_read: short transfer: 1 of 4 bytes");
    }

    #[test]
    fn test_outcomes() {
        assert_eq!(
            Error::invalid(Operation::I2cMasterReadEx, "bad condition").outcome(),
            OutcomeStatus::InvalidParameter
        );
        let err = Error::hardware(Operation::Open, FtStatus::OK);
        assert_eq!(err.outcome(), OutcomeStatus::UnknownHardwareError);
        assert_eq!(err.raw_status(), Some(FtStatus::OK));
    }
}
