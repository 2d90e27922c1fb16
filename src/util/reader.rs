//! Bounds-checked little-endian cursor over content bytes.
//!
//! Every binary loader in the crate reads through [`ByteReader`]; a short
//! buffer surfaces as [`Error::UnexpectedEof`] instead of an out-of-bounds read.

use byteorder::{ByteOrder, LittleEndian};

use super::{Error, Result};

/// Cursor over a borrowed byte buffer.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Total buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the next `len` bytes and advance.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::UnexpectedEof {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Skip reserved bytes.
    #[inline]
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Consume an ASCII magic tag, failing if it does not match.
    pub fn expect_tag(&mut self, tag: &[u8]) -> Result<()> {
        let found = self.read_bytes(tag.len())?;
        if found != tag {
            return Err(Error::InvalidMagic {
                expected: String::from_utf8_lossy(tag).into_owned(),
                actual: String::from_utf8_lossy(found).into_owned(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    /// Read `count` packed floats.
    pub fn read_f32_vec(&mut self, count: usize) -> Result<Vec<f32>> {
        let bytes = self.read_bytes(count.checked_mul(4).ok_or_else(|| {
            Error::invalid(format!("float count {} overflows", count))
        })?)?;
        let mut out = vec![0.0f32; count];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }

    /// Read `count` packed 16-bit values.
    pub fn read_u16_vec(&mut self, count: usize) -> Result<Vec<u16>> {
        let bytes = self.read_bytes(count.checked_mul(2).ok_or_else(|| {
            Error::invalid(format!("index count {} overflows", count))
        })?)?;
        let mut out = vec![0u16; count];
        LittleEndian::read_u16_into(bytes, &mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scalars() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x80, 0x3F, 0xFF, 0xFF];
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u32().unwrap(), 0x04030201);
        assert_eq!(r.read_f32().unwrap(), 1.0);
        assert_eq!(r.read_i16().unwrap(), -1);
        assert!(r.is_at_end());
    }

    #[test]
    fn test_truncated_read() {
        let bytes = [0u8; 3];
        let mut r = ByteReader::new(&bytes);
        let err = r.read_u32().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { offset: 0, needed: 4, available: 3 }));
        // Failed reads do not move the cursor
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn test_expect_tag() {
        let mut r = ByteReader::new(b"GEMesh  rest");
        r.expect_tag(b"GEMesh  ").unwrap();
        assert_eq!(r.remaining(), 4);

        let mut r = ByteReader::new(b"NotAMesh");
        assert!(matches!(r.expect_tag(b"GEMesh  "), Err(Error::InvalidMagic { .. })));
    }
}
