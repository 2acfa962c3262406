//! Compact binary codec for tree-shaped documents.
//!
//! Every distinct map key, and optionally every distinct scalar of two bytes
//! or more, is written once into index tables at the head of the stream.
//! The document body then refers to table slots instead of repeating the
//! values, which pays off on arrays of uniform objects.
//!
//! Stream layout (multi-byte integers little-endian):
//!
//! ```text
//! stream := table_count:u8 table[table_count] root_element
//! table  := size_class:u8 count entry[count]
//! ```

pub mod cli;
mod codec;
pub mod constants;
mod decoder;
mod encoder;
mod error;
mod index_table;
mod options;
mod table_set;
mod value;

pub use codec::{decode, encode, OPack};
pub use decoder::OPackDecoder;
pub use encoder::OPackEncoder;
pub use error::{OPackError, Result};
pub use index_table::{build_tables, IndexTable, SizeClass, TINY_CAPACITY};
pub use options::OPackOptions;
pub use table_set::{collect_sets, CollectedSets, IndexKey, Slot, TableSet};
pub use value::{from_file_time, to_file_time, Map, Value};
