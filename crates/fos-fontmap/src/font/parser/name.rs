//! `name` table parsing

use encoding_rs::{Encoding, EUC_JP, ISO_2022_JP, MACINTOSH, SHIFT_JIS, UTF_16BE};

use super::{FontReader, ParseError};

const PLATFORM_UNICODE: u16 = 0;
const PLATFORM_MACINTOSH: u16 = 1;
const PLATFORM_MICROSOFT: u16 = 3;

/// Macintosh language code for English
const MAC_LANGUAGE_ENGLISH: u16 = 0;

/// Microsoft primary language sub-tag for English (low byte of the LCID)
const MS_PRIMARY_LANGUAGE_ENGLISH: u16 = 0x09;

/// Size of one name record
const NAME_RECORD_SIZE: usize = 12;

/// Number of name slots kept (ids 1..=6, slot 0 unused)
pub const NAME_SLOTS: usize = 7;

/// Name ids recognized by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameId {
    Family = 1,
    Subfamily = 2,
    UniqueId = 3,
    FullName = 4,
    Version = 5,
    PostScriptName = 6,
}

impl NameId {
    /// All recognized ids in slot order
    pub const ALL: [NameId; 6] = [
        NameId::Family,
        NameId::Subfamily,
        NameId::UniqueId,
        NameId::FullName,
        NameId::Version,
        NameId::PostScriptName,
    ];
}

/// Font naming strings read from the `name` table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontMetadata {
    names: [Option<String>; NAME_SLOTS],
}

impl FontMetadata {
    /// Get a name by id
    pub fn get(&self, id: NameId) -> Option<&str> {
        self.names[id as usize].as_deref()
    }

    /// Get a name by raw slot index (1..=6)
    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx)?.as_deref()
    }

    /// Font family name
    pub fn family(&self) -> Option<&str> {
        self.get(NameId::Family)
    }

    /// Font subfamily (style) name
    pub fn subfamily(&self) -> Option<&str> {
        self.get(NameId::Subfamily)
    }

    /// Full font name
    pub fn full_name(&self) -> Option<&str> {
        self.get(NameId::FullName)
    }

    /// PostScript name
    pub fn postscript_name(&self) -> Option<&str> {
        self.get(NameId::PostScriptName)
    }
}

/// Text encoding of a name record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameEncoding {
    Utf16Be,
    MacRoman,
    Japanese,
}

impl NameEncoding {
    fn from_ids(platform_id: u16, encoding_id: u16) -> Option<Self> {
        match (platform_id, encoding_id) {
            (PLATFORM_UNICODE, 0 | 3) | (PLATFORM_MICROSOFT, 0 | 1) => Some(Self::Utf16Be),
            (PLATFORM_MACINTOSH, 0) => Some(Self::MacRoman),
            (PLATFORM_MACINTOSH, 1) | (PLATFORM_MICROSOFT, 2) => Some(Self::Japanese),
            _ => None,
        }
    }

    /// Decode `bytes`, `None` if they are not valid in this encoding
    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf16Be => decode_strict(UTF_16BE, bytes),
            Self::MacRoman => decode_strict(MACINTOSH, bytes),
            Self::Japanese => decode_japanese(bytes),
        }
    }
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|s| s.into_owned())
}

/// Guess between ISO-2022-JP, Shift_JIS and EUC-JP
fn decode_japanese(bytes: &[u8]) -> Option<String> {
    if bytes.contains(&0x1B) {
        return decode_strict(ISO_2022_JP, bytes);
    }
    decode_strict(SHIFT_JIS, bytes).or_else(|| decode_strict(EUC_JP, bytes))
}

/// One entry of the name record list
#[derive(Debug, Clone, Copy)]
struct NameRecord {
    platform_id: u16,
    encoding_id: u16,
    language_id: u16,
    name_id: u16,
    length: u16,
    offset: u16,
}

impl NameRecord {
    fn read(data: &[u8], idx: usize) -> Result<Self, ParseError> {
        let mut r = FontReader::at(data, 6 + idx * NAME_RECORD_SIZE);
        Ok(Self {
            platform_id: r.read_u16()?,
            encoding_id: r.read_u16()?,
            language_id: r.read_u16()?,
            name_id: r.read_u16()?,
            length: r.read_u16()?,
            offset: r.read_u16()?,
        })
    }
}

fn is_preferred(platform_id: u16, language_id: u16) -> bool {
    match platform_id {
        PLATFORM_MICROSOFT => language_id & 0xFF == MS_PRIMARY_LANGUAGE_ENGLISH,
        PLATFORM_MACINTOSH => language_id == MAC_LANGUAGE_ENGLISH,
        _ => false,
    }
}

/// Parse the `name` table.
///
/// Later records overwrite earlier ones for the same id until an English
/// Microsoft or Macintosh record has been stored; after that the slot is
/// frozen. Records with an unknown platform/encoding pair are skipped.
pub fn parse_name_table(data: &[u8]) -> Result<FontMetadata, ParseError> {
    let mut header = FontReader::at(data, 2);
    let count = header.read_u16()?;
    let string_offset = header.read_u16()? as usize;

    let mut metadata = FontMetadata::default();
    let mut preferred = 0u32;

    for idx in 0..count as usize {
        let record = match NameRecord::read(data, idx) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(%err, record = idx, "truncated name record list");
                break;
            }
        };
        let NameRecord {
            platform_id,
            encoding_id,
            language_id,
            name_id,
            length,
            offset,
        } = record;

        let slot = name_id as usize;
        if slot == 0 || slot >= NAME_SLOTS || preferred & (1 << slot) != 0 {
            continue;
        }

        let Some(encoding) = NameEncoding::from_ids(platform_id, encoding_id) else {
            tracing::debug!(platform_id, encoding_id, name_id, "unsupported name record encoding");
            continue;
        };

        let text = if length == 0 {
            String::new()
        } else {
            FontReader::at(data, string_offset + offset as usize)
                .read_bytes(length as usize)
                .ok()
                .and_then(|bytes| encoding.decode(bytes))
                .unwrap_or_else(|| {
                    tracing::warn!(platform_id, encoding_id, name_id, "can't decode name string");
                    String::new()
                })
        };
        metadata.names[slot] = Some(text);

        if is_preferred(platform_id, language_id) {
            preferred |= 1 << slot;
        }
    }

    Ok(metadata)
}
