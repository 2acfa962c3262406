//! Error type shared by the opack encoder and decoder.

use opack_buffers::BufferError;
use thiserror::Error;

/// Failure of a single encode or decode call. Every variant is terminal for
/// the call that produced it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OPackError {
    #[error("value of kind {0} cannot be encoded here")]
    UnsupportedValueType(&'static str),
    #[error("value not found in index tables: {0}")]
    ValueNotIndexed(String),
    #[error("invalid index table size class: {0}")]
    InvalidTableSizeClass(u8),
    #[error("invalid element tag 0x{tag:02x} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },
    #[error("table index {index} out of range (tables: {count})")]
    TableIndexOutOfRange { index: usize, count: usize },
    #[error("element index {index} out of range for table {table} (entries: {count})")]
    ElementIndexOutOfRange {
        table: usize,
        index: usize,
        count: usize,
    },
    #[error("unexpected end of input")]
    TruncatedInput,
    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,
    #[error("document needs {0} index tables, at most 255 are allowed")]
    TooManyTables(usize),
    #[error("index table with {0} entries exceeds the 4-byte index range")]
    TableTooLarge(usize),
    #[error("key table index {0} does not fit in 7 bits")]
    KeyTableIndexTooLarge(usize),
    #[error("index table entry with tag 0x{0:02x} is not a leaf value")]
    NonLeafTableEntry(u8),
    #[error("map key at table {table}, element {index} is not a string")]
    NonStringKey { table: usize, index: usize },
    #[error("timestamp outside the representable tick range")]
    DateTimeOutOfRange,
    #[error("nesting deeper than {0} levels")]
    DepthLimitExceeded(usize),
    #[error("decoded document exceeds {0} bytes")]
    OutputLimitExceeded(usize),
    #[error("{0} trailing bytes after root element")]
    TrailingBytes(usize),
}

impl From<BufferError> for OPackError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => OPackError::TruncatedInput,
            BufferError::InvalidUtf8 => OPackError::InvalidUtf8,
        }
    }
}

pub type Result<T> = std::result::Result<T, OPackError>;
