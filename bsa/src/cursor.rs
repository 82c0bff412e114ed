use enumflags2::{BitFlag, BitFlags};

use crate::error::Error;

/// A position-tracking view over an immutable byte slice (spec component
/// C0). Never copies the underlying buffer; every read either advances
/// `pos` or fails with `Error::TruncatedInput`.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reposition to an absolute offset from the start of the buffer.
    pub fn at(&self, abs_offset: usize) -> Result<Cursor<'a>, Error> {
        if abs_offset > self.buf.len() {
            return Err(Error::TruncatedInput { want: 0, have: self.buf.len(), at: abs_offset });
        }
        Ok(Cursor { buf: self.buf, pos: abs_offset })
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.take(n).map(|_| ())
    }

    pub fn peek(&self, n: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < n {
            return Err(Error::TruncatedInput { want: n, have: self.remaining(), at: self.pos });
        }
        Ok(&self.buf[self.pos..self.pos + n])
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let s = self.peek(n)?;
        self.pos += n;
        Ok(s)
    }

    /// Everything from the current position to the end of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_array4(&mut self) -> Result<[u8; 4], Error> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Bytes up to (not including) a NUL terminator; fails if none is found
    /// before the buffer ends.
    pub fn read_nul_string(&mut self) -> Result<String, Error> {
        let start = self.pos;
        let rest = self.rest();
        let end = rest.iter().position(|&b| b == 0).ok_or(Error::TruncatedInput {
            want: 1,
            have: 0,
            at: self.pos + rest.len(),
        })?;
        let s = std::str::from_utf8(&rest[..end])
            .map_err(|_| Error::EncodingError { at: start })?
            .to_owned();
        self.pos += end + 1;
        Ok(s)
    }

    /// Fixed-width field: read `n` bytes, trim trailing NULs, decode UTF-8.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, Error> {
        let start = self.pos;
        let bytes = self.take(n)?;
        let trimmed = match bytes.iter().position(|&b| b == 0) {
            Some(i) => &bytes[..i],
            None => bytes,
        };
        std::str::from_utf8(trimmed)
            .map(str::to_owned)
            .map_err(|_| Error::EncodingError { at: start })
    }

    /// A BSA-style directory/file name: 1-byte length prefix, then that many
    /// bytes including a trailing NUL (the NUL is dropped from the result).
    pub fn read_u8_len_nul_string(&mut self) -> Result<String, Error> {
        let start = self.pos;
        let len = self.read_u8()? as usize;
        let bytes = self.take(len)?;
        let trimmed = bytes.strip_suffix(&[0]).unwrap_or(bytes);
        std::str::from_utf8(trimmed)
            .map(str::to_owned)
            .map_err(|_| Error::EncodingError { at: start })
    }

    /// A BA2 name-table entry: u16-LE length prefix, then that many UTF-8 bytes.
    pub fn read_u16_len_string(&mut self) -> Result<String, Error> {
        let start = self.pos;
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes).map(str::to_owned).map_err(|_| Error::EncodingError { at: start })
    }

    /// Decode a bitflag word, keeping both the recognized flag set and the
    /// raw integer so unknown bits survive a round trip losslessly.
    pub fn read_flags_u32<T>(&mut self) -> Result<(BitFlags<T>, u32), Error>
    where
        T: BitFlag<Numeric = u32>,
    {
        let raw = self.read_u32()?;
        Ok((BitFlags::<T>::from_bits_truncate(raw), raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_reads_advance_position() {
        let buf = [0x01u8, 0x00, 0x00, 0x00, 0x02, 0x00];
        let mut c = Cursor::new(&buf);
        assert_eq!(c.read_u32().unwrap(), 1);
        assert_eq!(c.read_u16().unwrap(), 2);
        assert_eq!(c.position(), 6);
        assert!(c.is_empty());
    }

    #[test]
    fn take_past_end_is_truncated_input() {
        let buf = [0u8; 2];
        let mut c = Cursor::new(&buf);
        match c.read_u32() {
            Err(Error::TruncatedInput { want: 4, have: 2, .. }) => {}
            other => panic!("expected TruncatedInput, got {:?}", other),
        }
    }

    #[test]
    fn nul_string_stops_before_terminator() {
        let buf = b"hello\0world";
        let mut c = Cursor::new(buf);
        assert_eq!(c.read_nul_string().unwrap(), "hello");
        assert_eq!(c.position(), 6);
    }

    #[test]
    fn fixed_string_trims_trailing_nuls() {
        let buf = b"abc\0\0\0";
        let mut c = Cursor::new(buf);
        assert_eq!(c.read_fixed_string(6).unwrap(), "abc");
    }

    #[test]
    fn u8_len_nul_string_round_trips() {
        let buf = [5u8, b't', b'e', b'x', b't', 0];
        let mut c = Cursor::new(&buf);
        assert_eq!(c.read_u8_len_nul_string().unwrap(), "text");
    }

    #[test]
    fn at_reindexes_to_absolute_offset() {
        let buf = [1u8, 2, 3, 4];
        let c = Cursor::new(&buf);
        let c2 = c.at(2).unwrap();
        assert_eq!(c2.remaining(), 2);
        assert!(c.at(10).is_err());
    }
}
