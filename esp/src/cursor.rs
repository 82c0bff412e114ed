use enumflags2::{BitFlag, BitFlags};

use crate::error::EspError;

/// Position-tracking view over an immutable byte slice (spec component
/// C0), specialized for plugin framing. Kept independent of `bsa`'s
/// cursor rather than shared through a third crate, the same way the
/// teacher project keeps a separate read-primitive module per crate.
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

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn peek(&self, n: usize) -> Result<&'a [u8], EspError> {
        if self.remaining() < n {
            return Err(EspError::TruncatedInput { want: n, have: self.remaining(), at: self.pos });
        }
        Ok(&self.buf[self.pos..self.pos + n])
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], EspError> {
        let s = self.peek(n)?;
        self.pos += n;
        Ok(s)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), EspError> {
        self.take(n).map(|_| ())
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn read_u8(&mut self) -> Result<u8, EspError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, EspError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, EspError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u32(&mut self) -> Result<u32, EspError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> Result<f32, EspError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_array4(&mut self) -> Result<[u8; 4], EspError> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Fixed-width field: read `n` bytes, trim trailing NULs, decode UTF-8.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, EspError> {
        let start = self.pos;
        let bytes = self.take(n)?;
        let trimmed = match bytes.iter().position(|&b| b == 0) {
            Some(i) => &bytes[..i],
            None => bytes,
        };
        std::str::from_utf8(trimmed).map(str::to_owned).map_err(|_| EspError::EncodingError { at: start })
    }

    pub fn read_nul_string(&mut self) -> Result<String, EspError> {
        let start = self.pos;
        let rest = self.rest();
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(EspError::TruncatedInput { want: 1, have: 0, at: self.pos + rest.len() })?;
        let s = std::str::from_utf8(&rest[..end]).map_err(|_| EspError::EncodingError { at: start })?.to_owned();
        self.pos += end + 1;
        Ok(s)
    }

    pub fn read_flags_u32<T>(&mut self) -> Result<(BitFlags<T>, u32), EspError>
    where
        T: BitFlag<Numeric = u32>,
    {
        let raw = self.read_u32()?;
        Ok((BitFlags::<T>::from_bits_truncate(raw), raw))
    }
}
