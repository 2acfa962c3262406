//! Element tag bytes.
//!
//! A value starts with one tag byte. Tags 1..=24 are explicit; four
//! 32-wide ranges carry a 5-bit count or table index in the low bits:
//!
//! | range       | high bits | meaning                         |
//! |-------------|-----------|---------------------------------|
//! | 0x60..=0x7F | `011`     | string, byte length 0..=31      |
//! | 0x80..=0x9F | `100`     | map, entry count 0..=31         |
//! | 0xA0..=0xBF | `101`     | array, element count 0..=31     |
//! | 0xC0..=0xDF | `110`     | indexed reference, table 0..=31 |

pub const STRING5_FIRST: u8 = 0x60;
pub const STRING5_LAST: u8 = 0x7f;
pub const MAP5_FIRST: u8 = 0x80;
pub const MAP5_LAST: u8 = 0x9f;
pub const ARRAY5_FIRST: u8 = 0xa0;
pub const ARRAY5_LAST: u8 = 0xbf;
pub const INDEXED5_FIRST: u8 = 0xc0;
pub const INDEXED5_LAST: u8 = 0xdf;

pub const MASK_5_BITS: u8 = 0x1f;
pub const MASK_7_BITS: u8 = 0x7f;
pub const MASK_BIT_8: u8 = 0x80;

/// Tables addressable through the compact indexed range.
pub const MAX_COMPACT_TABLES: usize = 32;

/// Explicit one-byte element tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ElementType {
    Null = 1,
    True = 2,
    False = 3,
    Indexed = 4,
    Map8 = 5,
    Map16 = 6,
    Map32 = 7,
    Array8 = 8,
    Array16 = 9,
    Array32 = 10,
    Int8 = 11,
    Int16 = 12,
    Int32 = 13,
    Int64 = 14,
    UInt8 = 15,
    UInt16 = 16,
    UInt32 = 17,
    UInt64 = 18,
    Float = 19,
    Double = 20,
    String8 = 21,
    String16 = 22,
    String32 = 23,
    DateTime = 24,
}

impl ElementType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        use ElementType::*;
        Some(match byte {
            1 => Null,
            2 => True,
            3 => False,
            4 => Indexed,
            5 => Map8,
            6 => Map16,
            7 => Map32,
            8 => Array8,
            9 => Array16,
            10 => Array32,
            11 => Int8,
            12 => Int16,
            13 => Int32,
            14 => Int64,
            15 => UInt8,
            16 => UInt16,
            17 => UInt32,
            18 => UInt64,
            19 => Float,
            20 => Double,
            21 => String8,
            22 => String16,
            23 => String32,
            24 => DateTime,
            _ => return None,
        })
    }
}

/// Element kinds whose tag carries a length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizedKind {
    String,
    Map,
    Array,
}

impl SizedKind {
    /// First tag of the compact range for this kind.
    pub const fn compact_first(self) -> u8 {
        match self {
            SizedKind::String => STRING5_FIRST,
            SizedKind::Map => MAP5_FIRST,
            SizedKind::Array => ARRAY5_FIRST,
        }
    }

    /// Explicit tags for 1-, 2- and 4-byte lengths.
    pub const fn explicit(self) -> [ElementType; 3] {
        match self {
            SizedKind::String => [
                ElementType::String8,
                ElementType::String16,
                ElementType::String32,
            ],
            SizedKind::Map => [ElementType::Map8, ElementType::Map16, ElementType::Map32],
            SizedKind::Array => [
                ElementType::Array8,
                ElementType::Array16,
                ElementType::Array32,
            ],
        }
    }
}

/// Width of an explicit length field following a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthWidth {
    /// Length packed into the low 5 bits of the tag.
    Packed(u8),
    U8,
    U16,
    U32,
}

/// Classification of a raw tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Null,
    Bool(bool),
    /// Explicit indexed reference; a table-index byte follows.
    Indexed,
    /// Compact indexed reference into the given table.
    Indexed5(u8),
    Sized(SizedKind, LengthWidth),
    Scalar(ElementType),
}

impl Tag {
    /// Returns `None` for bytes that match no explicit tag and no compact
    /// range.
    pub fn classify(byte: u8) -> Option<Tag> {
        match byte {
            STRING5_FIRST..=STRING5_LAST => {
                return Some(Tag::Sized(
                    SizedKind::String,
                    LengthWidth::Packed(byte & MASK_5_BITS),
                ))
            }
            MAP5_FIRST..=MAP5_LAST => {
                return Some(Tag::Sized(
                    SizedKind::Map,
                    LengthWidth::Packed(byte & MASK_5_BITS),
                ))
            }
            ARRAY5_FIRST..=ARRAY5_LAST => {
                return Some(Tag::Sized(
                    SizedKind::Array,
                    LengthWidth::Packed(byte & MASK_5_BITS),
                ))
            }
            INDEXED5_FIRST..=INDEXED5_LAST => return Some(Tag::Indexed5(byte - INDEXED5_FIRST)),
            _ => {}
        }
        use ElementType as E;
        let ty = ElementType::from_u8(byte)?;
        Some(match ty {
            E::Null => Tag::Null,
            E::True => Tag::Bool(true),
            E::False => Tag::Bool(false),
            E::Indexed => Tag::Indexed,
            E::Map8 => Tag::Sized(SizedKind::Map, LengthWidth::U8),
            E::Map16 => Tag::Sized(SizedKind::Map, LengthWidth::U16),
            E::Map32 => Tag::Sized(SizedKind::Map, LengthWidth::U32),
            E::Array8 => Tag::Sized(SizedKind::Array, LengthWidth::U8),
            E::Array16 => Tag::Sized(SizedKind::Array, LengthWidth::U16),
            E::Array32 => Tag::Sized(SizedKind::Array, LengthWidth::U32),
            E::String8 => Tag::Sized(SizedKind::String, LengthWidth::U8),
            E::String16 => Tag::Sized(SizedKind::String, LengthWidth::U16),
            E::String32 => Tag::Sized(SizedKind::String, LengthWidth::U32),
            scalar => Tag::Scalar(scalar),
        })
    }
}
