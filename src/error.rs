//! Error types for ring operations.

use std::io;

/// Result type alias for ring operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for ring operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The caller passed a zero-length buffer.
    ///
    /// This is a caller error and is never retried internally.
    #[error("buffer is empty")]
    BufferEmpty,

    /// No chunk is available to read in non-blocking mode.
    ///
    /// This is transient: retry later or treat as "nothing ready yet".
    /// Write never reports it, since writes allocate instead of failing.
    #[error("pool is empty")]
    PoolEmpty,
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::BufferEmpty => io::Error::new(io::ErrorKind::InvalidInput, e),
            Error::PoolEmpty => io::Error::new(io::ErrorKind::WouldBlock, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", Error::BufferEmpty), "buffer is empty");
        assert_eq!(format!("{}", Error::PoolEmpty), "pool is empty");
    }

    #[test]
    fn test_io_error_mapping() {
        let e: io::Error = Error::BufferEmpty.into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);

        let e: io::Error = Error::PoolEmpty.into();
        assert_eq!(e.kind(), io::ErrorKind::WouldBlock);
    }
}
