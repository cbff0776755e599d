//! Error types for OxiFlate operations.
//!
//! The codec engines report two kinds of outcome. Conditions the caller can
//! recover from by calling again (`Ok`, `StreamEnd`, `NeedDict`, `BufError`)
//! are returned as a [`Status`]. Conditions that end the stream are returned
//! as an [`OxiflateError`]. Both expose the numeric zlib return code through
//! `code()` for interoperability reporting.

use std::io;
use thiserror::Error;

/// Non-fatal result of a single engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Progress was made; call again with more input or output space.
    Ok,
    /// The end of the stream was reached and all output has been produced.
    StreamEnd,
    /// A preset dictionary with the given Adler-32 id is required.
    NeedDict(u32),
    /// No progress was possible with the buffers supplied.
    BufError,
}

impl Status {
    /// The zlib return code for this status.
    pub fn code(&self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::StreamEnd => 1,
            Status::NeedDict(_) => 2,
            Status::BufError => -5,
        }
    }

    /// Returns true for [`Status::StreamEnd`].
    pub fn is_stream_end(&self) -> bool {
        matches!(self, Status::StreamEnd)
    }
}

/// The main error type for OxiFlate operations.
#[derive(Debug, Error)]
pub enum OxiflateError {
    /// Caller misuse: invalid parameters or a call in the wrong state.
    #[error("stream error: {message}")]
    Stream {
        /// Description of the misuse.
        message: &'static str,
    },

    /// Malformed compressed input.
    #[error("data error: {message}")]
    Data {
        /// zlib-style description of the corruption.
        message: &'static str,
    },

    /// An allocation failed.
    #[error("insufficient memory")]
    Mem,

    /// The output buffer was too small to hold the result.
    #[error("buffer error: output buffer too small")]
    Buf,

    /// I/O error from an underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for OxiFlate operations.
pub type Result<T> = std::result::Result<T, OxiflateError>;

impl OxiflateError {
    /// Create a stream (misuse) error.
    pub fn stream(message: &'static str) -> Self {
        Self::Stream { message }
    }

    /// Create a data (corruption) error.
    pub fn data(message: &'static str) -> Self {
        Self::Data { message }
    }

    /// Create a memory error.
    pub fn mem() -> Self {
        Self::Mem
    }

    /// Create a buffer error.
    pub fn buf() -> Self {
        Self::Buf
    }

    /// The zlib return code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::Stream { .. } => -2,
            Self::Data { .. } => -3,
            Self::Mem => -4,
            Self::Buf => -5,
            Self::Io(_) => -1,
        }
    }

    /// The static message carried by stream and data errors.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Stream { message } | Self::Data { message } => Some(message),
            _ => None,
        }
    }
}

impl From<OxiflateError> for io::Error {
    fn from(err: OxiflateError) -> Self {
        match err {
            OxiflateError::Io(e) => e,
            OxiflateError::Data { .. } => io::Error::new(io::ErrorKind::InvalidData, err),
            OxiflateError::Stream { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            OxiflateError::Mem => io::Error::new(io::ErrorKind::OutOfMemory, err),
            OxiflateError::Buf => io::Error::new(io::ErrorKind::WriteZero, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OxiflateError::data("invalid block type");
        assert_eq!(err.to_string(), "data error: invalid block type");

        let err = OxiflateError::stream("invalid level");
        assert!(err.to_string().contains("invalid level"));
        assert_eq!(err.message(), Some("invalid level"));
    }

    #[test]
    fn test_return_codes() {
        assert_eq!(Status::Ok.code(), 0);
        assert_eq!(Status::StreamEnd.code(), 1);
        assert_eq!(Status::NeedDict(7).code(), 2);
        assert_eq!(Status::BufError.code(), -5);
        assert_eq!(OxiflateError::stream("x").code(), -2);
        assert_eq!(OxiflateError::data("x").code(), -3);
        assert_eq!(OxiflateError::mem().code(), -4);
        assert_eq!(OxiflateError::buf().code(), -5);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OxiflateError = io_err.into();
        assert!(matches!(err, OxiflateError::Io(_)));

        let back: io::Error = OxiflateError::data("incorrect data check").into();
        assert_eq!(back.kind(), io::ErrorKind::InvalidData);
    }
}
