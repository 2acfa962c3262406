//! `OPackDecoder`: reads index tables, then the root element.
//!
//! Table and element indices from the stream are bounds-checked before use;
//! every declared length is checked against the remaining input. Indexed
//! references can repeat one table entry many times, so the materialized
//! output is metered against a byte ceiling.

use opack_buffers::Reader;

use crate::constants::{ElementType, LengthWidth, SizedKind, Tag, MASK_7_BITS, MASK_BIT_8};
use crate::error::{OPackError, Result};
use crate::index_table::{IndexTable, SizeClass};
use crate::table_set::descend;
use crate::value::{from_file_time, Map, Value};

/// Metered cost of every decoded element, on top of its string bytes.
const ELEMENT_COST: usize = 8;

pub struct OPackDecoder<'a> {
    reader: Reader<'a>,
    tables: Vec<IndexTable>,
    max_depth: usize,
    max_output_bytes: usize,
    output_bytes: usize,
}

impl<'a> OPackDecoder<'a> {
    pub fn new(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            reader: Reader::new(data),
            tables: Vec::new(),
            max_depth,
            max_output_bytes: usize::MAX,
            output_bytes: 0,
        }
    }

    pub fn with_output_limit(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    /// Decodes a whole stream. Input must end exactly after the root element.
    pub fn decode(mut self) -> Result<Value> {
        self.read_tables()?;
        let root = self.read_any(0)?;
        match self.reader.size() {
            0 => Ok(root),
            rest => Err(OPackError::TrailingBytes(rest)),
        }
    }

    pub fn tables(&self) -> &[IndexTable] {
        &self.tables
    }

    /// Reads the table count and every table into the decoder.
    pub fn read_tables(&mut self) -> Result<()> {
        let count = self.reader.try_u8()? as usize;
        tracing::trace!(tables = count, "reading index tables");
        self.tables = Vec::with_capacity(count);
        for _ in 0..count {
            let table = self.read_table()?;
            self.tables.push(table);
        }
        Ok(())
    }

    fn read_table(&mut self) -> Result<IndexTable> {
        let size_class = SizeClass::from_u8(self.reader.try_u8()?)?;
        let count = self.read_index(size_class)?;
        tracing::trace!(?size_class, count, "index table header");
        let mut entries = Vec::with_capacity(count.min(self.reader.size()));
        for _ in 0..count {
            entries.push(self.read_leaf()?);
        }
        Ok(IndexTable::with_size_class(size_class, entries))
    }

    fn read_index(&mut self, size_class: SizeClass) -> Result<usize> {
        Ok(match size_class {
            SizeClass::Tiny => self.reader.try_u8()? as usize,
            SizeClass::Small => self.reader.try_u16()? as usize,
            SizeClass::Normal => self.reader.try_u32()? as usize,
        })
    }

    fn read_tag(&mut self) -> Result<Tag> {
        let offset = self.reader.x;
        let tag = self.reader.try_u8()?;
        Tag::classify(tag).ok_or(OPackError::InvalidTag { tag, offset })
    }

    /// Table entries are scalars written without lookup.
    fn read_leaf(&mut self) -> Result<Value> {
        let offset = self.reader.x;
        match self.read_tag()? {
            Tag::Null => Ok(Value::Null),
            Tag::Bool(b) => Ok(Value::Bool(b)),
            Tag::Sized(SizedKind::String, width) => {
                let len = self.read_length(width)?;
                self.read_str(len)
            }
            Tag::Scalar(ty) => self.read_scalar(ty),
            Tag::Indexed | Tag::Indexed5(_) | Tag::Sized(..) => Err(OPackError::NonLeafTableEntry(
                self.reader.uint8[offset],
            )),
        }
    }

    pub fn read_any(&mut self, depth: usize) -> Result<Value> {
        let value = self.read_element(depth)?;
        self.meter(&value)?;
        Ok(value)
    }

    fn meter(&mut self, value: &Value) -> Result<()> {
        let cost = match value {
            Value::String(s) => ELEMENT_COST + s.len(),
            _ => ELEMENT_COST,
        };
        self.output_bytes = self.output_bytes.saturating_add(cost);
        if self.output_bytes > self.max_output_bytes {
            return Err(OPackError::OutputLimitExceeded(self.max_output_bytes));
        }
        Ok(())
    }

    fn read_element(&mut self, depth: usize) -> Result<Value> {
        match self.read_tag()? {
            Tag::Null => Ok(Value::Null),
            Tag::Bool(b) => Ok(Value::Bool(b)),
            Tag::Indexed => {
                let table = self.reader.try_u8()? as usize;
                self.read_indexed(table)
            }
            Tag::Indexed5(table) => self.read_indexed(table as usize),
            Tag::Sized(kind, width) => {
                let len = self.read_length(width)?;
                match kind {
                    SizedKind::String => self.read_str(len),
                    SizedKind::Map => self.read_map(len, depth),
                    SizedKind::Array => self.read_arr(len, depth),
                }
            }
            Tag::Scalar(ty) => self.read_scalar(ty),
        }
    }

    fn read_length(&mut self, width: LengthWidth) -> Result<usize> {
        Ok(match width {
            LengthWidth::Packed(len) => len as usize,
            LengthWidth::U8 => self.reader.try_u8()? as usize,
            LengthWidth::U16 => self.reader.try_u16()? as usize,
            LengthWidth::U32 => self.reader.try_u32()? as usize,
        })
    }

    fn read_str(&mut self, len: usize) -> Result<Value> {
        Ok(Value::String(self.reader.try_utf8(len)?.to_owned()))
    }

    fn read_scalar(&mut self, ty: ElementType) -> Result<Value> {
        let r = &mut self.reader;
        Ok(match ty {
            ElementType::Int8 => Value::Int8(r.try_i8()?),
            ElementType::Int16 => Value::Int16(r.try_i16()?),
            ElementType::Int32 => Value::Int32(r.try_i32()?),
            ElementType::Int64 => Value::Int64(r.try_i64()?),
            ElementType::UInt8 => Value::UInt8(r.try_u8()?),
            ElementType::UInt16 => Value::UInt16(r.try_u16()?),
            ElementType::UInt32 => Value::UInt32(r.try_u32()?),
            ElementType::UInt64 => Value::UInt64(r.try_u64()?),
            ElementType::Float => Value::Float32(r.try_f32()?),
            ElementType::Double => Value::Float64(r.try_f64()?),
            ElementType::DateTime => Value::DateTime(from_file_time(r.try_i64()?)?),
            // Tag::classify routes every other explicit tag elsewhere.
            other => {
                return Err(OPackError::InvalidTag {
                    tag: other as u8,
                    offset: r.x - 1,
                })
            }
        })
    }

    fn read_map(&mut self, count: usize, depth: usize) -> Result<Value> {
        let depth = descend(depth, self.max_depth)?;
        let mut map = Map::with_capacity(count.min(self.reader.size()));
        for _ in 0..count {
            let key = self.read_key()?;
            let val = self.read_any(depth)?;
            map.insert(key, val);
        }
        Ok(Value::Map(map))
    }

    fn read_arr(&mut self, count: usize, depth: usize) -> Result<Value> {
        let depth = descend(depth, self.max_depth)?;
        let mut arr = Vec::with_capacity(count.min(self.reader.size()));
        for _ in 0..count {
            arr.push(self.read_any(depth)?);
        }
        Ok(Value::Array(arr))
    }

    /// High bit clear: element of table 0. High bit set: low 7 bits name the
    /// table and the element index follows.
    fn read_key(&mut self) -> Result<String> {
        let position = self.reader.try_u8()?;
        let (table, index) = if position & MASK_BIT_8 == 0 {
            (0, position as usize)
        } else {
            let table = (position & MASK_7_BITS) as usize;
            (table, self.read_element_index(table)?)
        };
        match self.entry(table, index)? {
            Value::String(key) => Ok(key.clone()),
            _ => Err(OPackError::NonStringKey { table, index }),
        }
    }

    fn read_indexed(&mut self, table: usize) -> Result<Value> {
        let index = self.read_element_index(table)?;
        self.entry(table, index).cloned()
    }

    fn read_element_index(&mut self, table: usize) -> Result<usize> {
        let size_class = self
            .tables
            .get(table)
            .map(IndexTable::size_class)
            .ok_or(OPackError::TableIndexOutOfRange {
                index: table,
                count: self.tables.len(),
            })?;
        self.read_index(size_class)
    }

    fn entry(&self, table: usize, index: usize) -> Result<&Value> {
        let t = self
            .tables
            .get(table)
            .ok_or(OPackError::TableIndexOutOfRange {
                index: table,
                count: self.tables.len(),
            })?;
        t.get(index).ok_or(OPackError::ElementIndexOutOfRange {
            table,
            index,
            count: t.len(),
        })
    }
}
