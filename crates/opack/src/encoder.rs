//! `OPackEncoder`: writes index tables and the root element.

use opack_buffers::Writer;

use crate::constants::{
    ElementType, SizedKind, INDEXED5_FIRST, MASK_5_BITS, MASK_7_BITS, MASK_BIT_8,
    MAX_COMPACT_TABLES,
};
use crate::error::{OPackError, Result};
use crate::index_table::{IndexTable, SizeClass};
use crate::options::OPackOptions;
use crate::table_set::{descend, Slot, TableSet};
use crate::value::{to_file_time, Map, Value};

/// Encoder state for one call: the output buffer plus the tables built for
/// the document being written. Never outlives the call.
pub struct OPackEncoder<'a, 'o> {
    writer: Writer,
    document: &'a Value,
    tables: TableSet<'a>,
    options: &'o OPackOptions,
}

impl<'a, 'o> OPackEncoder<'a, 'o> {
    pub fn new(document: &'a Value, options: &'o OPackOptions) -> Result<Self> {
        Ok(Self {
            writer: Writer::new(),
            document,
            tables: TableSet::build(document, options)?,
            options,
        })
    }

    /// Writes the table count, every table, then the document itself.
    pub fn encode(mut self) -> Result<Vec<u8>> {
        let count = self.tables.tables().len();
        self.writer.u8(count as u8);
        for index in 0..count {
            self.write_table(index)?;
        }
        self.write_any(self.document, true, 0)?;
        Ok(self.writer.flush())
    }

    fn write_table(&mut self, index: usize) -> Result<()> {
        let table: &IndexTable = &self.tables.tables()[index];
        let writer = &mut self.writer;
        let count = table.len();
        writer.u8(table.size_class() as u8);
        match table.size_class() {
            SizeClass::Tiny => writer.u8(count as u8),
            SizeClass::Small => writer.u16(count as u16),
            SizeClass::Normal => writer.u32(count as u32),
        }
        for entry in table.entries() {
            write_leaf(writer, entry)?;
        }
        Ok(())
    }

    /// Encodes one element. `lookup` enables indexed references for
    /// scalars of two bytes or more.
    pub fn write_any(&mut self, value: &'a Value, lookup: bool, depth: usize) -> Result<()> {
        match value {
            Value::Map(map) => self.write_map(map, depth),
            Value::Array(arr) => self.write_arr(arr, depth),
            Value::Null | Value::Bool(_) | Value::Int8(_) | Value::UInt8(_) => {
                write_leaf(&mut self.writer, value)
            }
            _ if lookup && self.options.index_values => self.write_indexed_value(value),
            _ => write_leaf(&mut self.writer, value),
        }
    }

    fn write_map(&mut self, map: &'a Map, depth: usize) -> Result<()> {
        let depth = descend(depth, self.options.max_depth)?;
        write_sized_hdr(&mut self.writer, SizedKind::Map, map.len())?;
        for (key, val) in map {
            self.write_indexed_key(key)?;
            self.write_any(val, true, depth)?;
        }
        Ok(())
    }

    fn write_arr(&mut self, arr: &'a [Value], depth: usize) -> Result<()> {
        let depth = descend(depth, self.options.max_depth)?;
        write_sized_hdr(&mut self.writer, SizedKind::Array, arr.len())?;
        for item in arr {
            self.write_any(item, true, depth)?;
        }
        Ok(())
    }

    /// `0b0EEEEEEE` for the first 128 entries of table 0, otherwise
    /// `0b1TTTTTTT` followed by the element index.
    fn write_indexed_key(&mut self, key: &'a str) -> Result<()> {
        let slot = self
            .tables
            .locate_key(key)
            .ok_or_else(|| OPackError::ValueNotIndexed(format!("key {key:?}")))?;
        if slot.table == 0 && slot.element <= MASK_7_BITS as usize {
            self.writer.u8(slot.element as u8);
            return Ok(());
        }
        if slot.table > MASK_7_BITS as usize {
            return Err(OPackError::KeyTableIndexTooLarge(slot.table));
        }
        self.writer.u8(slot.table as u8 | MASK_BIT_8);
        self.write_element_index(slot);
        Ok(())
    }

    fn write_indexed_value(&mut self, value: &'a Value) -> Result<()> {
        let slot = self
            .tables
            .locate(value)
            .ok_or_else(|| OPackError::ValueNotIndexed(format!("{value:?}")))?;
        if self.options.write_optimized_indexed_types && slot.table < MAX_COMPACT_TABLES {
            self.writer.u8(INDEXED5_FIRST + slot.table as u8);
        } else {
            self.writer.u8(ElementType::Indexed as u8);
            self.writer.u8(slot.table as u8);
        }
        self.write_element_index(slot);
        Ok(())
    }

    fn write_element_index(&mut self, slot: Slot) {
        let element = slot.element;
        match self.tables.tables()[slot.table].size_class() {
            SizeClass::Tiny => self.writer.u8(element as u8),
            SizeClass::Small => self.writer.u16(element as u16),
            SizeClass::Normal => self.writer.u32(element as u32),
        }
    }
}

/// Compact tag when `len` fits in 5 bits, otherwise the explicit tag and a
/// length of minimal width.
pub fn write_sized_hdr(writer: &mut Writer, kind: SizedKind, len: usize) -> Result<()> {
    let [tag8, tag16, tag32] = kind.explicit();
    if len <= MASK_5_BITS as usize {
        writer.u8(kind.compact_first() + len as u8);
    } else if len <= u8::MAX as usize {
        writer.u8(tag8 as u8);
        writer.u8(len as u8);
    } else if len <= u16::MAX as usize {
        writer.u8u16(tag16 as u8, len as u16);
    } else {
        let len = u32::try_from(len).map_err(|_| OPackError::UnsupportedValueType("oversized"))?;
        writer.u8u32(tag32 as u8, len);
    }
    Ok(())
}

/// Writes a scalar inline. Containers have no inline leaf form.
pub fn write_leaf(writer: &mut Writer, value: &Value) -> Result<()> {
    match value {
        Value::Null => writer.u8(ElementType::Null as u8),
        Value::Bool(true) => writer.u8(ElementType::True as u8),
        Value::Bool(false) => writer.u8(ElementType::False as u8),
        Value::Int8(v) => {
            writer.u8(ElementType::Int8 as u8);
            writer.i8(*v);
        }
        Value::UInt8(v) => {
            writer.u8(ElementType::UInt8 as u8);
            writer.u8(*v);
        }
        Value::String(s) => {
            write_sized_hdr(writer, SizedKind::String, s.len())?;
            writer.utf8(s);
        }
        Value::DateTime(dt) => {
            let ticks = to_file_time(dt)?;
            writer.u8(ElementType::DateTime as u8);
            writer.i64(ticks);
        }
        Value::Float32(v) => {
            writer.u8(ElementType::Float as u8);
            writer.f32(*v);
        }
        Value::Float64(v) => {
            writer.u8(ElementType::Double as u8);
            writer.f64(*v);
        }
        Value::Int16(v) => {
            writer.u8(ElementType::Int16 as u8);
            writer.i16(*v);
        }
        Value::Int32(v) => {
            writer.u8(ElementType::Int32 as u8);
            writer.i32(*v);
        }
        Value::Int64(v) => {
            writer.u8(ElementType::Int64 as u8);
            writer.i64(*v);
        }
        Value::UInt16(v) => {
            writer.u8(ElementType::UInt16 as u8);
            writer.u16(*v);
        }
        Value::UInt32(v) => {
            writer.u8(ElementType::UInt32 as u8);
            writer.u32(*v);
        }
        Value::UInt64(v) => {
            writer.u8(ElementType::UInt64 as u8);
            writer.u64(*v);
        }
        Value::Array(_) | Value::Map(_) => {
            return Err(OPackError::UnsupportedValueType(value.kind()))
        }
    }
    Ok(())
}
