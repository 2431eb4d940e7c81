use thiserror::Error;

use crate::codec::CodecError;
use crate::traits::device_link::LinkError;

/// Errors that can terminate a capture session.
///
/// Every exit path of the session maps to exactly one of these kinds;
/// there is no automatic retry anywhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Invalid command-line input or an unusable configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The capture buffer could not be allocated.
    #[error("buffer allocation failed: {0}")]
    Allocation(String),

    /// Transport failure or unexpected firmware status from the device.
    #[error("device error: {0}")]
    Device(String),

    /// The device speaks a different tape protocol revision.
    #[error("tape firmware protocol mismatch: device reports {reported}, expected {expected}")]
    VersionMismatch { expected: i32, reported: i32 },

    /// The device filled the whole buffer; the tail may be truncated, so
    /// the capture must not be finalized.
    #[error("capture buffer full ({captured} of {capacity} bytes), use a larger buffer size")]
    BufferOverflow { captured: usize, capacity: usize },

    /// The session was cancelled from the interrupt handler.
    #[error("capture aborted by user")]
    UserAbort,

    /// File-system failure while writing the capture file.
    #[error("i/o error: {0}")]
    Io(String),

    /// The device reported an oscillator precision of 0 MHz, which would
    /// make every duration computation divide by zero.
    #[error("device reported an oscillator precision of 0 MHz")]
    InvalidPrecision,

    /// Malformed edge-delta stream.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io(err.to_string())
    }
}

impl From<LinkError> for CaptureError {
    fn from(err: LinkError) -> Self {
        CaptureError::Device(err.to_string())
    }
}
