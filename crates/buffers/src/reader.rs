//! Binary buffer reader with cursor tracking.
//!
//! Every read is bounds-checked and returns [`BufferError`] instead of
//! panicking, since the input is untrusted.

use std::str;

use crate::BufferError;

/// A little-endian binary reader over a byte slice.
///
/// # Example
///
/// ```
/// use opack_buffers::Reader;
///
/// let data = [0x01, 0x03, 0x02];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.try_u8(), Ok(0x01));
/// assert_eq!(reader.try_u16(), Ok(0x0203));
/// assert!(reader.try_u8().is_err());
/// ```
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.uint8.len().saturating_sub(self.x)
    }

    /// Checks that `n` more bytes are available from the current cursor.
    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        match self.x.checked_add(n) {
            Some(end) if end <= self.uint8.len() => Ok(()),
            _ => Err(BufferError::EndOfBuffer),
        }
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.uint8[self.x..self.x + N]);
        self.x += N;
        Ok(out)
    }

    #[inline]
    pub fn try_u8(&mut self) -> Result<u8, BufferError> {
        self.check(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    #[inline]
    pub fn try_i8(&mut self) -> Result<i8, BufferError> {
        Ok(self.try_u8()? as i8)
    }

    #[inline]
    pub fn try_u16(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    #[inline]
    pub fn try_i16(&mut self) -> Result<i16, BufferError> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    #[inline]
    pub fn try_u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    #[inline]
    pub fn try_i32(&mut self) -> Result<i32, BufferError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    #[inline]
    pub fn try_u64(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    #[inline]
    pub fn try_i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    #[inline]
    pub fn try_f32(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    #[inline]
    pub fn try_f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Reads `size` raw bytes and advances the cursor.
    pub fn try_buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let x = self.x;
        let end = x + size;
        let bin = &self.uint8[x..end];
        self.x = end;
        Ok(bin)
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn try_utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let bin = self.try_buf(size)?;
        str::from_utf8(bin).map_err(|_| BufferError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        let data = [0x01, 0x02, 0x04, 0x03, 0x02, 0x01];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.try_u16(), Ok(0x0201));
        assert_eq!(reader.try_u32(), Ok(0x01020304));
        assert_eq!(reader.size(), 0);
    }

    #[test]
    fn short_read_does_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.try_u8(), Ok(0x01));
        assert_eq!(reader.try_u32(), Err(BufferError::EndOfBuffer));
        assert_eq!(reader.x, 1);
        assert_eq!(reader.try_u16(), Ok(0x0302));
    }

    #[test]
    fn huge_length_is_rejected() {
        let data = [0u8; 4];
        let mut reader = Reader::new(&data);
        reader.try_u8().unwrap();
        assert_eq!(reader.try_buf(usize::MAX), Err(BufferError::EndOfBuffer));
    }

    #[test]
    fn floats_roundtrip() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-2.25f64).to_le_bytes());
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.try_f32(), Ok(1.5));
        assert_eq!(reader.try_f64(), Ok(-2.25));
    }

    #[test]
    fn utf8_validation() {
        let mut reader = Reader::new("héllo".as_bytes());
        assert_eq!(reader.try_utf8(6), Ok("héllo"));

        let bad = [0xff, 0xfe];
        let mut reader = Reader::new(&bad);
        assert_eq!(reader.try_utf8(2), Err(BufferError::InvalidUtf8));
    }
}
