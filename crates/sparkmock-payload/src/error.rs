//! Error types for payload encoding and decoding.

use thiserror::Error;

/// Errors from serializing a payload in either encoding mode.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("payload contains no metrics")]
    EmptyPayload,

    #[error("metric {name:?}: datatype {datatype} does not accept a {value} value")]
    ValueMismatch {
        name: String,
        datatype: &'static str,
        value: &'static str,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from decoding the compact wire format.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("varint exceeds 64 bits at byte {0}")]
    VarintOverflow(usize),

    #[error("field {field} has unsupported wire type {wire_type}")]
    UnsupportedWireType { field: u32, wire_type: u8 },

    #[error("unknown datatype tag {0}")]
    UnknownDataType(u64),

    #[error("metric {0:?} carries no value")]
    MissingValue(String),

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    #[error("sequence number {0} exceeds the 8-bit range")]
    SeqOutOfRange(u64),
}
