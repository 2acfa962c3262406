//! Codec configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TABLE_SPLIT_FOR_KEY: usize = 100;
pub const DEFAULT_MAX_TABLE_SPLIT_FOR_VALUE: usize = 150;
pub const DEFAULT_MAX_DEPTH: usize = 512;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 256 * 1024 * 1024;

/// Options recognized by [`OPack`](crate::OPack).
///
/// Deserializes from camelCase keys with every field optional, so it can be
/// embedded in a host application's config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OPackOptions {
    /// Deduplicate scalar values of two bytes or more, not just keys.
    pub index_values: bool,
    /// Bucket ceiling before the key set falls back to one unsplit table.
    pub max_table_split_for_key: usize,
    /// Bucket ceiling before the value set falls back to one unsplit table.
    pub max_table_split_for_value: usize,
    /// Use the one-byte compact indexed tags for the first 32 tables.
    pub write_optimized_indexed_types: bool,
    /// Nesting limit applied by both encode and decode.
    pub max_depth: usize,
    /// Decode ceiling on the materialized document: string bytes plus a
    /// fixed cost per element. Bounds fan-out through indexed references.
    pub max_output_bytes: usize,
}

impl Default for OPackOptions {
    fn default() -> Self {
        Self {
            index_values: true,
            max_table_split_for_key: DEFAULT_MAX_TABLE_SPLIT_FOR_KEY,
            max_table_split_for_value: DEFAULT_MAX_TABLE_SPLIT_FOR_VALUE,
            write_optimized_indexed_types: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl OPackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_values(mut self, on: bool) -> Self {
        self.index_values = on;
        self
    }

    pub fn max_table_split_for_key(mut self, n: usize) -> Self {
        self.max_table_split_for_key = n;
        self
    }

    pub fn max_table_split_for_value(mut self, n: usize) -> Self {
        self.max_table_split_for_value = n;
        self
    }

    pub fn write_optimized_indexed_types(mut self, on: bool) -> Self {
        self.write_optimized_indexed_types = on;
        self
    }

    pub fn max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    pub fn max_output_bytes(mut self, n: usize) -> Self {
        self.max_output_bytes = n;
        self
    }
}
