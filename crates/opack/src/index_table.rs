//! Index tables: deduplicated values referenced by position.

use crate::error::{OPackError, Result};
use crate::value::Value;

/// Entries a single bucket holds when a value set is split.
pub const TINY_CAPACITY: usize = u8::MAX as usize;

/// Width of an element index inside a table, chosen from the entry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SizeClass {
    /// Up to 255 entries, 1-byte element index.
    Tiny = 1,
    /// Up to 65 535 entries, 2-byte element index.
    Small = 2,
    /// Up to 2^32 - 1 entries, 4-byte element index.
    Normal = 3,
}

impl SizeClass {
    /// Smallest class that can address `count` entries.
    pub fn for_count(count: usize) -> Result<Self> {
        if count <= u8::MAX as usize {
            Ok(SizeClass::Tiny)
        } else if count <= u16::MAX as usize {
            Ok(SizeClass::Small)
        } else if count <= u32::MAX as usize {
            Ok(SizeClass::Normal)
        } else {
            Err(OPackError::TableTooLarge(count))
        }
    }

    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(SizeClass::Tiny),
            2 => Ok(SizeClass::Small),
            3 => Ok(SizeClass::Normal),
            other => Err(OPackError::InvalidTableSizeClass(other)),
        }
    }

    /// Bytes used for an element index (and for the table's entry count).
    pub const fn width(self) -> usize {
        match self {
            SizeClass::Tiny => 1,
            SizeClass::Small => 2,
            SizeClass::Normal => 4,
        }
    }
}

/// An ordered list of distinct values. An entry's position is its index on
/// the wire, so entries are never reordered once the table exists.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTable {
    size_class: SizeClass,
    entries: Vec<Value>,
}

impl IndexTable {
    pub fn new(entries: Vec<Value>) -> Result<Self> {
        let size_class = SizeClass::for_count(entries.len())?;
        Ok(Self {
            size_class,
            entries,
        })
    }

    /// Table read back from a stream. The declared class is kept as-is even
    /// when a narrower one would fit, since it dictates index width.
    pub(crate) fn with_size_class(size_class: SizeClass, entries: Vec<Value>) -> Self {
        Self {
            size_class,
            entries,
        }
    }

    pub fn size_class(&self) -> SizeClass {
        self.size_class
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.entries.get(index)
    }
}

/// Builds the tables for one value set.
///
/// Sets larger than one tiny table are cut into consecutive buckets of at
/// most [`TINY_CAPACITY`] entries, unless that would need more than
/// `max_split` buckets, in which case everything goes into a single wider
/// table. An empty set yields no tables.
pub fn build_tables(values: Vec<Value>, max_split: usize) -> Result<Vec<IndexTable>> {
    let count = values.len();
    if count == 0 {
        return Ok(Vec::new());
    }
    let bucket_count = count.div_ceil(TINY_CAPACITY);
    if bucket_count == 1 || bucket_count > max_split {
        return Ok(vec![IndexTable::new(values)?]);
    }
    let mut tables = Vec::with_capacity(bucket_count);
    let mut rest = values.into_iter();
    for _ in 0..bucket_count {
        let chunk: Vec<Value> = rest.by_ref().take(TINY_CAPACITY).collect();
        tables.push(IndexTable::new(chunk)?);
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(n: usize) -> Vec<Value> {
        (0..n as i32).map(Value::Int32).collect()
    }

    #[test]
    fn size_class_boundaries() {
        assert_eq!(SizeClass::for_count(0), Ok(SizeClass::Tiny));
        assert_eq!(SizeClass::for_count(255), Ok(SizeClass::Tiny));
        assert_eq!(SizeClass::for_count(256), Ok(SizeClass::Small));
        assert_eq!(SizeClass::for_count(65_535), Ok(SizeClass::Small));
        assert_eq!(SizeClass::for_count(65_536), Ok(SizeClass::Normal));
    }

    #[test]
    fn size_class_from_byte() {
        assert_eq!(SizeClass::from_u8(2), Ok(SizeClass::Small));
        assert_eq!(
            SizeClass::from_u8(0),
            Err(OPackError::InvalidTableSizeClass(0))
        );
        assert_eq!(
            SizeClass::from_u8(4),
            Err(OPackError::InvalidTableSizeClass(4))
        );
    }

    #[test]
    fn empty_set_has_no_tables() {
        assert!(build_tables(Vec::new(), 100).unwrap().is_empty());
    }

    #[test]
    fn single_bucket_stays_tiny() {
        let tables = build_tables(ints(255), 100).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].size_class(), SizeClass::Tiny);
        assert_eq!(tables[0].len(), 255);
    }

    #[test]
    fn one_past_tiny_without_split_is_small() {
        let tables = build_tables(ints(256), 1).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].size_class(), SizeClass::Small);
    }

    #[test]
    fn splits_into_tiny_buckets() {
        let tables = build_tables(ints(600), 100).unwrap();
        let sizes: Vec<_> = tables.iter().map(IndexTable::len).collect();
        assert_eq!(sizes, [255, 255, 90]);
        assert!(tables.iter().all(|t| t.size_class() == SizeClass::Tiny));
        assert_eq!(tables[1].get(0), Some(&Value::Int32(255)));
        assert_eq!(tables[2].get(89), Some(&Value::Int32(599)));
    }

    #[test]
    fn too_many_buckets_falls_back_to_one_table() {
        let tables = build_tables(ints(600), 2).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].size_class(), SizeClass::Small);
        assert_eq!(tables[0].len(), 600);
    }

    #[test]
    fn split_limit_is_inclusive() {
        let tables = build_tables(ints(510), 2).unwrap();
        assert_eq!(tables.len(), 2);
        let tables = build_tables(ints(511), 2).unwrap();
        assert_eq!(tables.len(), 1);
    }
}
