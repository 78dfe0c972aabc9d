//! Binary reader for font data

use super::ParseError;

/// Big-endian binary reader with bounds checking
#[derive(Debug, Clone)]
pub struct FontReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FontReader<'a> {
    /// Create a new reader at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a new reader positioned at `pos`
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Get current position
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(ParseError::OutOfBounds {
                offset: self.pos,
                len: n,
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Skip bytes
    pub fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        self.take(n).map(|_| ())
    }

    /// Read big-endian u16
    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read big-endian i16
    pub fn read_i16(&mut self) -> Result<i16, ParseError> {
        Ok(self.read_u16()? as i16)
    }

    /// Read big-endian u32
    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read 4-byte tag
    pub fn read_tag(&mut self) -> Result<[u8; 4], ParseError> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Read bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        self.take(n)
    }

    /// Remaining bytes
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }
}
