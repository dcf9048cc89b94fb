use std::io;

use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Fatal problems with the cache configuration, raised before a run starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be non-zero")]
    Zero { field: &'static str },

    #[error("{field} must be a power of two (got {value})")]
    NotPowerOfTwo { field: &'static str, value: u32 },

    #[error("--direct-mapped and --fully-associative are mutually exclusive")]
    ConflictingMapping,

    #[error("{option} expects a non-negative integer (got {value:?})")]
    InvalidNumber { option: &'static str, value: String },

    #[error("address fields do not fit in 32 bits ({offset_bits} offset + {index_bits} index)")]
    AddressSpaceTooWide { offset_bits: u32, index_bits: u32 },

    #[error("missing required option: {0}")]
    Missing(&'static str),

    #[error("unknown trace generator: {0}")]
    UnknownGenerator(String),

    #[error("matrix of {len} words is not {n} x {n}")]
    MatrixShape { n: usize, len: usize },

    #[error("{n} x {n} matrices starting at 0x{base:08x} do not fit in the 32-bit address space")]
    WorkloadTooLarge { n: usize, base: u32 },

    #[error("argument error: {0}")]
    Args(#[from] pico_args::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Reasons a single trace row is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestParseError {
    #[error("expected 2 or 3 fields, found {found}")]
    FieldCount { found: usize },

    #[error("unknown request type {0:?}")]
    UnknownKind(String),

    #[error("invalid hex address {0:?}")]
    BadAddress(String),

    #[error("invalid 32-bit value {0:?}")]
    BadValue(String),

    #[error("write without a value")]
    MissingValue,
}

/// Errors that abort a whole simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error(
        "request {position} addresses 0x{address:08X}, beyond the {capacity}-byte cache address space"
    )]
    AddressOutOfRange {
        position: usize,
        address: u32,
        capacity: u64,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
