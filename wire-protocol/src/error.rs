//! Decode failures for both wire formats. None of these are fatal: the
//! transport counts and discards the offending frame/line and never
//! propagates anything to the client.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame ended before {expected} bytes were read")]
    TruncatedFrame { expected: usize },

    #[error("bad magic byte: expected 0x4D, got {got:#04x}")]
    BadMagic { got: u8 },

    #[error("unknown message type byte: {got:#04x}")]
    UnknownMessageType { got: u8 },

    #[error("malformed csv field `{field}`: {detail}")]
    MalformedCsvField { field: &'static str, detail: String },

    #[error("csv line has wrong field count for its message type: {detail}")]
    WrongFieldCount { detail: String },

    #[error("empty or comment-only line")]
    BlankLine,
}
