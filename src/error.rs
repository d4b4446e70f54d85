//! Error types for the bench drivers.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Top-level error type for instrument communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("serial communication error")]
    Serial(I),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Preamble(#[from] PreambleError),
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("value outside the accepted range")]
    InvalidRange,
    #[error("transport closed before the response was complete")]
    UnexpectedEof,
    #[error("response does not match the request")]
    UnexpectedResponse,
    #[error("echo test returned {got}, expected {sent}")]
    EchoMismatch { sent: u16, got: u16 },
    #[error("could not interpret reply {0:?}")]
    BadReply(String),
}

/// Errors produced while decoding temperature controller frames.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// Any CRC verification failure. Fatal; retry policy belongs to the caller.
    #[error("response CRC does not match")]
    ChecksumMismatch,
    #[error("device reported: {0}")]
    Device(DeviceError),
    #[error("unknown function code 0x{function:02X} in response {raw:02X?}")]
    UnknownFunction { function: u8, raw: Vec<u8> },
    #[error("unknown device error, received {raw:02X?}")]
    UnknownDeviceError { raw: Vec<u8> },
    #[error("response frame too short")]
    Truncated,
    #[error("unsupported data length {0} in read response")]
    BadDataLength(usize),
}

/// Exception codes reported by the temperature controller.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum DeviceError {
    /// Exception code `0x02`.
    #[error("wrong start address")]
    BadAddress,
    /// Exception code `0x03`.
    #[error("variable data error")]
    BadData,
    /// Exception code `0x04`.
    #[error("operation error")]
    Operation,
}

/// Errors from parsing a waveform preamble.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum PreambleError {
    #[error("preamble field {0} is missing")]
    MissingField(usize),
    #[error("preamble field {0} has no ':' separated value")]
    MissingValue(usize),
    #[error("WFID segment {0} is missing")]
    MissingSegment(usize),
    /// Also raised for a bad number inside a WFID segment, in which case the
    /// index refers to the slash-separated segment.
    #[error("could not parse number {value:?} in preamble field {field}")]
    InvalidNumber { field: usize, value: String },
    #[error("step value {0:?} has no recognised unit suffix")]
    UnknownUnit(String),
}

/// Errors from decoding a binary curve payload.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum CurveError {
    #[error("curve transfer is {got} bytes, need at least {need}")]
    TooShort { got: usize, need: usize },
}
