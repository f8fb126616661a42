use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComtradeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid section at line {line}: {reason}")]
    InvalidSection { line: usize, reason: String },

    #[error("Invalid number at line {line}, field {field}: {value:?}")]
    InvalidNumber { line: usize, field: usize, value: String },

    #[error("Invalid timestamp at line {line}: {value:?}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("Data file is empty")]
    EmptyData,

    #[error("Data file truncated: record {record} needs {needed} bytes, only {available} available")]
    TruncatedData { record: usize, needed: usize, available: usize },

    #[error("Channel {channel} out of range 1..={total}")]
    ChannelOutOfRange { channel: usize, total: usize },

    #[error("Header declares no usable sampling rate")]
    MissingSampleRate,

    #[error("Unsupported data file type: {0}")]
    UnsupportedFileType(String),

    #[error("Digital channel decoding is not implemented")]
    DigitalDecodingUnsupported,

    #[error("Timestamp out of range")]
    TimestampOverflow,

    #[error("Record expects {expected} {kind} values, got {got}")]
    RecordShape { kind: &'static str, expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, ComtradeError>;
