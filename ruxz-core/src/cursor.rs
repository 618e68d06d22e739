//! Forward-only cursor over an immutable input buffer.
//!
//! All container and payload parsing reads through [`ByteCursor`]: fixed
//! width integers, the XZ variable-length ("multibyte") integer encoding,
//! raw slices, and zero-padding to 4-byte alignment. The cursor never
//! rewinds and never mutates the underlying buffer.

use crate::error::{Result, XzError};

/// A forward-only reader over a borrowed byte buffer.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current absolute position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the cursor has consumed the whole buffer.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| XzError::unexpected_eof(1))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read a big-endian 16-bit integer.
    pub fn read_u16be(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian 32-bit integer.
    pub fn read_u32le(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read `n` bytes as a borrowed slice.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(XzError::unexpected_eof(n - self.remaining()));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read an XZ variable-length integer (7 bits per byte, little-endian
    /// groups, high bit as continuation). At most 63 significant bits.
    pub fn read_multibyte(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;

        loop {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(XzError::malformed("multibyte integer overflow"));
            }
        }
    }

    /// Consume zero bytes until the absolute position is a multiple of
    /// `align`. Any nonzero byte in the padding is a structural error.
    pub fn read_zero_padding(&mut self, align: usize) -> Result<()> {
        while self.pos % align != 0 {
            if self.read_u8()? != 0 {
                return Err(XzError::malformed("nonzero padding byte"));
            }
        }
        Ok(())
    }
}
