//! `kern` table parsing

use super::{FontReader, ParseError};
use crate::font::KerningTable;

/// Size of a subtable header (version, length, coverage)
const SUBTABLE_HEADER_SIZE: usize = 6;

/// Size of the format 0 header following the subtable header
const FORMAT0_HEADER_SIZE: usize = 8;

/// Size of one format 0 pair (left, right, value)
const PAIR_RECORD_SIZE: usize = 6;

/// Coverage bits selecting horizontal, non-minimum, non-cross-stream data
const COVERAGE_AXIS_MASK: u16 = 3;
const COVERAGE_HORIZONTAL: u16 = 1;

/// Parse the `kern` table into `table`.
///
/// Only horizontal format 0 subtables are read; later subtables overwrite
/// earlier ones for the same pair. Unsupported formats and truncated data
/// are logged and skipped, never reported as errors.
pub fn parse_kern_table(data: &[u8], table: &mut KerningTable) {
    if let Err(err) = read_subtables(data, table) {
        tracing::warn!(%err, "truncated kern table, keeping pairs read so far");
    }
}

fn read_subtables(data: &[u8], table: &mut KerningTable) -> Result<(), ParseError> {
    let mut header = FontReader::new(data);
    let version = header.read_u16()?;
    let num_tables = header.read_u16()?;

    let mut offset = header.pos();
    for _ in 0..num_tables {
        let mut r = FontReader::at(data, offset);
        let _sub_version = r.read_u16()?;
        let length = r.read_u16()? as usize;
        let coverage = r.read_u16()?;
        let horizontal = coverage & COVERAGE_AXIS_MASK == COVERAGE_HORIZONTAL;

        let length = match coverage >> 8 {
            // Large pair lists overflow the 16-bit length, trust the pair count
            0 => {
                let num_pairs = r.read_u16()? as usize;
                if horizontal {
                    read_format0(&mut r, num_pairs, table)?;
                }
                SUBTABLE_HEADER_SIZE + FORMAT0_HEADER_SIZE + num_pairs * PAIR_RECORD_SIZE
            }
            format => {
                if horizontal {
                    tracing::warn!(format, version, "unsupported kerning subtable format");
                }
                length
            }
        };

        if length < SUBTABLE_HEADER_SIZE {
            tracing::warn!(length, "kerning subtable length too small, stopping");
            break;
        }
        offset += length;
    }
    Ok(())
}

fn read_format0(
    r: &mut FontReader<'_>,
    num_pairs: usize,
    table: &mut KerningTable,
) -> Result<(), ParseError> {
    r.skip(FORMAT0_HEADER_SIZE - 2)?; // search range, entry selector, range shift

    for _ in 0..num_pairs {
        let left = r.read_u16()?;
        let right = r.read_u16()?;
        let value = r.read_i16()?;
        if value != 0 {
            table.insert(left, right, value);
        }
    }
    Ok(())
}
