//! Fixed-capacity transfer buffers
//!
//! Each session owns one transmit and one receive buffer. Staging always
//! validates first and only then touches the buffer, so a rejected request
//! leaves the previous contents in place.

use thiserror::Error;

/// Capacity of each transfer buffer in bytes
pub const TRANSFER_BUFFER_SIZE: usize = 8192;

/// Why a staging request was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Requested length does not fit in the buffer
    #[error("length {requested} exceeds buffer capacity {capacity}")]
    LengthExceedsCapacity { requested: usize, capacity: usize },
    /// Caller supplied fewer bytes than the requested length
    #[error("length {requested} exceeds the {available} bytes supplied")]
    SourceTooShort { requested: usize, available: usize },
}

/// One zero-initialised byte buffer of [`TRANSFER_BUFFER_SIZE`] bytes
pub struct TransferBuffer {
    data: Box<[u8; TRANSFER_BUFFER_SIZE]>,
    used: usize,
}

impl TransferBuffer {
    /// Create an empty, zero-filled buffer
    pub fn new() -> Self {
        Self {
            data: Box::new([0; TRANSFER_BUFFER_SIZE]),
            used: 0,
        }
    }

    /// Total capacity in bytes
    pub const fn capacity(&self) -> usize {
        TRANSFER_BUFFER_SIZE
    }

    /// Bytes staged or filled by the current transaction
    pub fn used_len(&self) -> usize {
        self.used
    }

    /// Zero-fill the whole buffer and forget the staged length
    pub fn reset(&mut self) {
        self.data.fill(0);
        self.used = 0;
    }

    /// Stage the first `length` bytes of `src` at offset 0
    pub fn stage_write(&mut self, src: &[u8], length: usize) -> Result<&[u8], BufferError> {
        check_length(length, src.len())?;
        self.reset();
        self.data[..length].copy_from_slice(&src[..length]);
        self.used = length;
        Ok(self.staged())
    }

    /// Stage two segments of `src` back to back
    ///
    /// The first `first` bytes form the single-line phase and the following
    /// `second` bytes the multi-line phase; both come from `src` in order.
    pub fn stage_segments(
        &mut self,
        src: &[u8],
        first: usize,
        second: usize,
    ) -> Result<&[u8], BufferError> {
        // A sum that overflows usize is certainly beyond capacity.
        let total = first.checked_add(second).unwrap_or(usize::MAX);
        self.stage_write(src, total)
    }

    /// Zero-fill and reserve `length` bytes for an incoming read
    pub fn prepare_read(&mut self, length: usize) -> Result<(), BufferError> {
        if length > TRANSFER_BUFFER_SIZE {
            return Err(BufferError::LengthExceedsCapacity {
                requested: length,
                capacity: TRANSFER_BUFFER_SIZE,
            });
        }
        self.reset();
        self.used = length;
        Ok(())
    }

    /// The staged prefix
    pub fn staged(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// Mutable view of the reserved read window
    pub fn read_window(&mut self, length: usize) -> &mut [u8] {
        let length = length.min(TRANSFER_BUFFER_SIZE);
        &mut self.data[..length]
    }

    /// Full-capacity view, for inspection
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..]
    }
}

impl Default for TransferBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for TransferBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransferBuffer")
            .field("used", &self.used)
            .field("capacity", &TRANSFER_BUFFER_SIZE)
            .finish()
    }
}

fn check_length(length: usize, available: usize) -> Result<(), BufferError> {
    if length > TRANSFER_BUFFER_SIZE {
        return Err(BufferError::LengthExceedsCapacity {
            requested: length,
            capacity: TRANSFER_BUFFER_SIZE,
        });
    }
    if length > available {
        return Err(BufferError::SourceTooShort {
            requested: length,
            available,
        });
    }
    Ok(())
}

/// The transmit/receive pair owned by a session
#[derive(Debug, Default)]
pub struct TransferBuffers {
    pub tx: TransferBuffer,
    pub rx: TransferBuffer,
}

impl TransferBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero both buffers
    pub fn reset(&mut self) {
        self.tx.reset();
        self.rx.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_write_zero_fills_tail() {
        let mut buf = TransferBuffer::new();
        buf.stage_write(&[0xAA; 100], 100).unwrap();
        buf.stage_write(&[1, 2, 3], 3).unwrap();

        assert_eq!(buf.staged(), &[1, 2, 3]);
        assert!(buf.as_bytes()[3..].iter().all(|&b| b == 0));
        assert_eq!(buf.used_len(), 3);
    }

    #[test]
    fn test_stage_write_uses_prefix_of_source() {
        let mut buf = TransferBuffer::new();
        let staged = buf.stage_write(&[9, 8, 7, 6], 2).unwrap();
        assert_eq!(staged, &[9, 8]);
    }

    #[test]
    fn test_rejection_leaves_buffer_untouched() {
        let mut buf = TransferBuffer::new();
        buf.stage_write(&[0x55; 16], 16).unwrap();

        let err = buf.stage_write(&[1, 2], 3).unwrap_err();
        assert_eq!(
            err,
            BufferError::SourceTooShort {
                requested: 3,
                available: 2
            }
        );
        let big = vec![0u8; TRANSFER_BUFFER_SIZE + 1];
        let err = buf.stage_write(&big, big.len()).unwrap_err();
        assert!(matches!(err, BufferError::LengthExceedsCapacity { .. }));

        assert_eq!(buf.staged(), &[0x55; 16]);
    }

    #[test]
    fn test_full_capacity_is_accepted() {
        let mut buf = TransferBuffer::new();
        let src = vec![0xFF; TRANSFER_BUFFER_SIZE];
        assert_eq!(buf.stage_write(&src, TRANSFER_BUFFER_SIZE).unwrap().len(), TRANSFER_BUFFER_SIZE);
    }

    #[test]
    fn test_segments_are_contiguous() {
        let mut buf = TransferBuffer::new();
        let staged = buf.stage_segments(&[1, 2, 3, 4, 5, 6], 2, 3).unwrap();
        assert_eq!(staged, &[1, 2, 3, 4, 5]);

        assert!(buf.stage_segments(&[1, 2, 3, 4], 2, 3).is_err());
        assert!(buf.stage_segments(&[], usize::MAX, 1).is_err());
        assert!(buf
            .stage_segments(&vec![0; 9000], TRANSFER_BUFFER_SIZE, 1)
            .is_err());
    }

    #[test]
    fn test_prepare_read() {
        let mut buf = TransferBuffer::new();
        buf.stage_write(&[0xEE; 32], 32).unwrap();
        buf.prepare_read(8).unwrap();
        assert_eq!(buf.used_len(), 8);
        assert!(buf.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(buf.read_window(8).len(), 8);

        assert!(buf.prepare_read(TRANSFER_BUFFER_SIZE + 1).is_err());
        assert_eq!(buf.used_len(), 8);
    }
}
