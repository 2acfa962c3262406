//! Byte buffer primitives shared by the opack encoder and decoder.
//!
//! All multi-byte quantities are little-endian.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Error raised by [`Reader`] when the input cannot satisfy a read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("end of buffer")]
    EndOfBuffer,
    #[error("invalid UTF-8")]
    InvalidUtf8,
}
