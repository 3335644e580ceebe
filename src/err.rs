use thiserror::Error;

use std::io;

pub type Result<T> = std::result::Result<T, TranscodeError>;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Offset 0x{offset:06x}: An I/O error has occurred while reading input")]
    FailedToRead {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// `offset` is the output offset of the chunk that could not be written.
    #[error("Offset 0x{offset:06x}: An I/O error has occurred while writing output")]
    FailedToWrite {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error(
        "Buffer capacity of {capacity} bytes is out of range, expected {minimum} to {maximum} bytes"
    )]
    InvalidBufferCapacity {
        capacity: usize,
        minimum: usize,
        maximum: usize,
    },
}

impl TranscodeError {
    pub(crate) fn read(offset: u64, source: io::Error) -> Self {
        TranscodeError::FailedToRead { offset, source }
    }

    pub(crate) fn write(offset: u64, source: io::Error) -> Self {
        TranscodeError::FailedToWrite { offset, source }
    }

    /// The underlying I/O error, if this error was caused by one.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            TranscodeError::FailedToRead { source, .. }
            | TranscodeError::FailedToWrite { source, .. } => Some(source),
            TranscodeError::InvalidBufferCapacity { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offset() {
        let err = TranscodeError::read(0x1f, io::Error::other("boom"));
        assert_eq!(
            err.to_string(),
            "Offset 0x00001f: An I/O error has occurred while reading input"
        );
        assert!(err.io_error().is_some());
    }

    #[test]
    fn test_capacity_error_has_no_io_source() {
        let err = TranscodeError::InvalidBufferCapacity {
            capacity: 4,
            minimum: 16,
            maximum: 1024,
        };
        assert!(err.io_error().is_none());
        assert_eq!(
            err.to_string(),
            "Buffer capacity of 4 bytes is out of range, expected 16 to 1024 bytes"
        );
    }
}
