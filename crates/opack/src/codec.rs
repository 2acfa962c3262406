//! [`OPack`]: the document codec entry point.

use crate::decoder::OPackDecoder;
use crate::encoder::OPackEncoder;
use crate::error::Result;
use crate::options::OPackOptions;
use crate::value::Value;

/// Encodes and decodes whole documents.
///
/// The codec holds only its options. Each call builds its own tables and
/// cursor, so one instance can serve concurrent calls.
///
/// ```
/// use opack::{OPack, Value};
///
/// let doc: Value = [
///     ("id".to_owned(), Value::Int32(7)),
///     ("tag".to_owned(), Value::from("x")),
/// ]
/// .into_iter()
/// .collect();
///
/// let codec = OPack::new();
/// let bytes = codec.encode(&doc).unwrap();
/// assert_eq!(codec.decode(&bytes).unwrap(), doc);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OPack {
    options: OPackOptions,
}

impl OPack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: OPackOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &OPackOptions {
        &self.options
    }

    pub fn encode(&self, document: &Value) -> Result<Vec<u8>> {
        OPackEncoder::new(document, &self.options)?.encode()
    }

    pub fn decode(&self, data: &[u8]) -> Result<Value> {
        OPackDecoder::new(data, self.options.max_depth)
            .with_output_limit(self.options.max_output_bytes)
            .decode()
    }
}

/// Encodes with default options.
pub fn encode(document: &Value) -> Result<Vec<u8>> {
    OPack::new().encode(document)
}

/// Decodes with default options.
pub fn decode(data: &[u8]) -> Result<Value> {
    OPack::new().decode(data)
}
