//! Tree walk that collects keys and indexable values, and the per-encode
//! table set built from them.
//!
//! Sets keep first-seen order of a depth-first walk (map entries in
//! insertion order). That order becomes table position, so it is also the
//! order the lookup map is built in.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;

use crate::error::{OPackError, Result};
use crate::index_table::{build_tables, IndexTable};
use crate::options::OPackOptions;
use crate::value::Value;

/// Hashable identity of an indexable value.
///
/// Width-sensitive like [`Value`]; floats compare by bit pattern, so NaN
/// deduplicates with an identical NaN and `-0.0` stays apart from `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKey<'a> {
    Str(&'a str),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(u32),
    Float64(u64),
    DateTime(DateTime<Utc>),
}

impl<'a> IndexKey<'a> {
    /// `None` for containers and for values that are always written inline
    /// (null and one-byte scalars).
    pub fn of(value: &'a Value) -> Option<Self> {
        Some(match value {
            Value::String(s) => IndexKey::Str(s),
            Value::Int16(v) => IndexKey::Int16(*v),
            Value::Int32(v) => IndexKey::Int32(*v),
            Value::Int64(v) => IndexKey::Int64(*v),
            Value::UInt16(v) => IndexKey::UInt16(*v),
            Value::UInt32(v) => IndexKey::UInt32(*v),
            Value::UInt64(v) => IndexKey::UInt64(*v),
            Value::Float32(v) => IndexKey::Float32(v.to_bits()),
            Value::Float64(v) => IndexKey::Float64(v.to_bits()),
            Value::DateTime(v) => IndexKey::DateTime(*v),
            Value::Null
            | Value::Bool(_)
            | Value::Int8(_)
            | Value::UInt8(_)
            | Value::Array(_)
            | Value::Map(_) => return None,
        })
    }

    pub fn to_value(self) -> Value {
        match self {
            IndexKey::Str(s) => Value::String(s.to_owned()),
            IndexKey::Int16(v) => Value::Int16(v),
            IndexKey::Int32(v) => Value::Int32(v),
            IndexKey::Int64(v) => Value::Int64(v),
            IndexKey::UInt16(v) => Value::UInt16(v),
            IndexKey::UInt32(v) => Value::UInt32(v),
            IndexKey::UInt64(v) => Value::UInt64(v),
            IndexKey::Float32(bits) => Value::Float32(f32::from_bits(bits)),
            IndexKey::Float64(bits) => Value::Float64(f64::from_bits(bits)),
            IndexKey::DateTime(v) => Value::DateTime(v),
        }
    }
}

/// Distinct keys and values of one document, in first-seen order.
#[derive(Debug, Default)]
pub struct CollectedSets<'a> {
    pub keys: IndexSet<&'a str>,
    pub values: IndexSet<IndexKey<'a>>,
}

/// Walks `value` and collects every map key, plus every indexable scalar
/// when `index_values` is set.
pub fn collect_sets<'a>(
    value: &'a Value,
    index_values: bool,
    max_depth: usize,
) -> Result<CollectedSets<'a>> {
    let mut sets = CollectedSets::default();
    sets.walk(value, index_values, max_depth, 0)?;
    Ok(sets)
}

impl<'a> CollectedSets<'a> {
    fn walk(
        &mut self,
        value: &'a Value,
        index_values: bool,
        max_depth: usize,
        depth: usize,
    ) -> Result<()> {
        match value {
            Value::Map(map) => {
                let depth = descend(depth, max_depth)?;
                for (key, val) in map {
                    self.keys.insert(key.as_str());
                    self.walk(val, index_values, max_depth, depth)?;
                }
            }
            Value::Array(arr) => {
                let depth = descend(depth, max_depth)?;
                for item in arr {
                    self.walk(item, index_values, max_depth, depth)?;
                }
            }
            _ => {
                if index_values {
                    if let Some(key) = IndexKey::of(value) {
                        self.values.insert(key);
                    }
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn descend(depth: usize, max_depth: usize) -> Result<usize> {
    if depth >= max_depth {
        Err(OPackError::DepthLimitExceeded(max_depth))
    } else {
        Ok(depth + 1)
    }
}

/// Position of an entry: table in the combined list, element in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub table: usize,
    pub element: usize,
}

/// Key tables followed by value tables, with a lookup from value to slot.
///
/// When a value appears in more than one table (a string used both as a key
/// and as a value) the first table wins, which is always a key table.
#[derive(Debug)]
pub struct TableSet<'a> {
    tables: Vec<IndexTable>,
    key_table_count: usize,
    lookup: HashMap<IndexKey<'a>, Slot>,
}

impl<'a> TableSet<'a> {
    pub fn build(document: &'a Value, options: &OPackOptions) -> Result<Self> {
        let sets = collect_sets(document, options.index_values, options.max_depth)?;

        let key_tables = build_tables(
            sets.keys.iter().map(|k| Value::String((*k).to_owned())).collect(),
            options.max_table_split_for_key,
        )?;
        let value_tables = build_tables(
            sets.values.iter().map(|k| k.to_value()).collect(),
            options.max_table_split_for_value,
        )?;

        let key_table_count = key_tables.len();
        let total = key_table_count + value_tables.len();
        if total > u8::MAX as usize {
            return Err(OPackError::TooManyTables(total));
        }
        // Key references carry the table index in 7 bits.
        if key_table_count > 128 {
            return Err(OPackError::KeyTableIndexTooLarge(key_table_count - 1));
        }

        let mut tables = key_tables;
        tables.extend(value_tables);

        let mut lookup = HashMap::with_capacity(sets.keys.len() + sets.values.len());
        let ordered = sets
            .keys
            .iter()
            .map(|k| IndexKey::Str(*k))
            .chain(sets.values.iter().copied());
        let slots = tables.iter().enumerate().flat_map(|(table, t)| {
            (0..t.len()).map(move |element| Slot { table, element })
        });
        for (key, slot) in ordered.zip(slots) {
            lookup.entry(key).or_insert(slot);
        }

        tracing::debug!(
            keys = sets.keys.len(),
            values = sets.values.len(),
            key_tables = key_table_count,
            value_tables = tables.len() - key_table_count,
            "built index tables"
        );

        Ok(Self {
            tables,
            key_table_count,
            lookup,
        })
    }

    pub fn tables(&self) -> &[IndexTable] {
        &self.tables
    }

    pub fn key_tables(&self) -> &[IndexTable] {
        &self.tables[..self.key_table_count]
    }

    pub fn value_tables(&self) -> &[IndexTable] {
        &self.tables[self.key_table_count..]
    }

    /// Slot of a key string.
    pub fn locate_key(&self, key: &'a str) -> Option<Slot> {
        self.lookup.get(&IndexKey::Str(key)).copied()
    }

    /// Slot of an indexable value; `None` for values that are never indexed.
    pub fn locate(&self, value: &'a Value) -> Option<Slot> {
        IndexKey::of(value).and_then(|key| self.lookup.get(&key).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_table::SizeClass;

    fn map(fields: Vec<(&str, Value)>) -> Value {
        Value::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        )
    }

    #[test]
    fn one_byte_scalars_are_never_collected() {
        let doc = Value::Array(vec![
            Value::Null,
            Value::Bool(true),
            Value::Int8(-1),
            Value::UInt8(7),
            Value::Int16(300),
        ]);
        let sets = collect_sets(&doc, true, 64).unwrap();
        assert!(sets.keys.is_empty());
        assert_eq!(
            sets.values.iter().copied().collect::<Vec<_>>(),
            [IndexKey::Int16(300)]
        );
    }

    #[test]
    fn keys_collected_without_value_indexing() {
        let doc = map(vec![
            ("a", Value::String("x".into())),
            ("b", map(vec![("a", Value::Int32(5))])),
        ]);
        let sets = collect_sets(&doc, false, 64).unwrap();
        assert_eq!(sets.keys.iter().copied().collect::<Vec<_>>(), ["a", "b"]);
        assert!(sets.values.is_empty());
    }

    #[test]
    fn first_seen_order_is_kept() {
        let doc = Value::Array(vec![
            Value::String("z".into()),
            Value::Int32(2),
            Value::String("a".into()),
            Value::Int32(2),
            Value::String("z".into()),
        ]);
        let sets = collect_sets(&doc, true, 64).unwrap();
        assert_eq!(
            sets.values.iter().copied().collect::<Vec<_>>(),
            [IndexKey::Str("z"), IndexKey::Int32(2), IndexKey::Str("a")]
        );
    }

    #[test]
    fn width_distinguishes_values() {
        let doc = Value::Array(vec![Value::Int32(1), Value::Int64(1), Value::UInt32(1)]);
        let sets = collect_sets(&doc, true, 64).unwrap();
        assert_eq!(sets.values.len(), 3);
    }

    #[test]
    fn depth_limit_applies_to_walk() {
        let mut doc = Value::Int16(1);
        for _ in 0..10 {
            doc = Value::Array(vec![doc]);
        }
        assert!(collect_sets(&doc, true, 10).is_ok());
        assert_eq!(
            collect_sets(&doc, true, 9).unwrap_err(),
            OPackError::DepthLimitExceeded(9)
        );
    }

    #[test]
    fn shared_value_gets_one_slot() {
        let doc = map(vec![("a", Value::Int32(1)), ("b", Value::Int32(1))]);
        let set = TableSet::build(&doc, &OPackOptions::default()).unwrap();
        assert_eq!(set.key_tables().len(), 1);
        assert_eq!(set.key_tables()[0].len(), 2);
        assert_eq!(set.value_tables().len(), 1);
        assert_eq!(set.value_tables()[0].entries(), &[Value::Int32(1)]);
        assert_eq!(
            set.locate(&Value::Int32(1)),
            Some(Slot {
                table: 1,
                element: 0
            })
        );
        assert_eq!(
            set.locate_key("b"),
            Some(Slot {
                table: 0,
                element: 1
            })
        );
    }

    #[test]
    fn string_value_equal_to_key_resolves_to_key_table() {
        let doc = map(vec![("name", Value::String("name".into()))]);
        let set = TableSet::build(&doc, &OPackOptions::default()).unwrap();
        assert_eq!(set.tables().len(), 2);
        assert_eq!(
            set.locate(&Value::String("name".into())),
            Some(Slot {
                table: 0,
                element: 0
            })
        );
    }

    #[test]
    fn split_key_tables_map_to_consecutive_slots() {
        let doc: Value = (0..600).map(|i| (format!("k{i}"), Value::Null)).collect();
        let set = TableSet::build(&doc, &OPackOptions::default()).unwrap();
        let sizes: Vec<_> = set.key_tables().iter().map(IndexTable::len).collect();
        assert_eq!(sizes, [255, 255, 90]);
        assert!(set
            .key_tables()
            .iter()
            .all(|t| t.size_class() == SizeClass::Tiny));
        assert_eq!(
            set.locate_key("k300"),
            Some(Slot {
                table: 1,
                element: 45
            })
        );
        assert!(set.value_tables().is_empty());
    }

    #[test]
    fn too_many_tables_rejected_before_encoding() {
        let doc: Value = (0..300).map(Value::Int32).collect();
        let options = OPackOptions::default();
        assert!(TableSet::build(&doc, &options).is_ok());

        let doc: Value = (0..(256 * 255) as i32).map(Value::Int32).collect();
        let options = OPackOptions::default().max_table_split_for_value(1000);
        assert_eq!(
            TableSet::build(&doc, &options).unwrap_err(),
            OPackError::TooManyTables(256)
        );
    }
}
