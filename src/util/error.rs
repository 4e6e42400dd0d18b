//! Error types for the DTS library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for shape and sequence file operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A read ran past the end of one of the data channels
    #[error("Unexpected end of data in {0}")]
    UnexpectedEndOfData(&'static str),

    /// Guard mismatch, bad tag byte or violated length invariant
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// Recognized but unimplemented mesh type or version combination
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Value does not fit the width of its target field
    #[error("Value {value} does not fit in a {bits}-bit field")]
    RangeError { value: i64, bits: u32 },

    /// Character has no representation in the legacy code page
    #[error("Character {0:?} cannot be encoded in Windows-1252")]
    EncodingError(char),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(std::io::Error),
}

impl Error {
    /// Create a corrupt data error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptData(msg.into())
    }

    /// Create an unsupported feature error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFeature(msg.into())
    }

    /// Create a range error for a value that overflowed a `bits`-wide field.
    pub fn range(value: impl Into<i64>, bits: u32) -> Self {
        Self::RangeError { value: value.into(), bits }
    }
}

// Short reads are a format condition, not an I/O failure.
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEndOfData("stream")
        } else {
            Self::Io(e)
        }
    }
}

/// Result type alias for DTS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Convert a collection length to the 32-bit count stored on disk.
pub fn len_i32(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::range(len as i64, 32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::corrupt("guard mismatch");
        assert!(e.to_string().contains("guard mismatch"));

        let e = Error::range(70000, 16);
        assert!(e.to_string().contains("70000"));
        assert!(e.to_string().contains("16"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));

        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        let err: Error = eof.into();
        assert!(matches!(err, Error::UnexpectedEndOfData(_)));
    }

    #[test]
    fn test_len_i32() {
        assert_eq!(len_i32(12).unwrap(), 12);
        assert!(matches!(len_i32(usize::MAX), Err(Error::RangeError { bits: 32, .. })));
    }
}
