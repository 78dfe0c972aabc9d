//! Minimal sfnt parser
//!
//! Only the pieces the renderer needs are read here: the table directory,
//! the `name` table and the `kern` table. Outlines and metrics come from the
//! glyph engine.

pub mod reader;
pub mod name;
pub mod kern;

pub use reader::FontReader;

use crate::FontError;

/// Offset of the table count in the sfnt header
const NUM_TABLES_OFFSET: usize = 4;

/// Size of the sfnt header preceding the table directory
const HEADER_SIZE: usize = 12;

/// Size of one table directory record
const TABLE_RECORD_SIZE: usize = 16;

/// Low-level font parsing error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },

    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("table '{tag}' ({offset}+{length}) exceeds the font data")]
    TableOutOfBounds { tag: String, offset: u32, length: u32 },
}

impl From<ParseError> for FontError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::TableNotFound(tag) => FontError::TableNotFound(tag),
            other => FontError::MalformedFont(other.to_string()),
        }
    }
}

/// Table directory of an sfnt font file
///
/// Lookups scan the directory linearly and compare tags byte for byte. The
/// returned table views borrow from the original buffer.
#[derive(Debug, Clone, Copy)]
pub struct TableDirectory<'a> {
    data: &'a [u8],
    num_tables: u16,
}

impl<'a> TableDirectory<'a> {
    /// Read the directory header of `data`
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        let num_tables = FontReader::at(data, NUM_TABLES_OFFSET).read_u16()?;
        Ok(Self { data, num_tables })
    }

    /// Number of directory entries
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }

    /// Find an optional table, `Ok(None)` when the font has no such table
    pub fn find(&self, tag: &[u8; 4]) -> Result<Option<&'a [u8]>, ParseError> {
        for idx in 0..self.num_tables as usize {
            let mut r = FontReader::at(self.data, HEADER_SIZE + idx * TABLE_RECORD_SIZE);
            if r.read_tag()? != *tag {
                continue;
            }
            r.skip(4)?; // checksum
            let offset = r.read_u32()?;
            let length = r.read_u32()?;

            let start = offset as usize;
            let end = start.checked_add(length as usize);
            return match end {
                Some(end) if end <= self.data.len() => Ok(Some(&self.data[start..end])),
                _ => Err(ParseError::TableOutOfBounds {
                    tag: tag_name(tag),
                    offset,
                    length,
                }),
            };
        }
        Ok(None)
    }

    /// Find a required table
    pub fn table(&self, tag: &[u8; 4]) -> Result<&'a [u8], ParseError> {
        self.find(tag)?
            .ok_or_else(|| ParseError::TableNotFound(tag_name(tag)))
    }
}

fn tag_name(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}
