//! Font file loading

mod kerning;
pub mod parser;

pub use kerning::{KerningRow, KerningTable};
pub use parser::name::{FontMetadata, NameId};

use std::path::Path;
use std::sync::Arc;

use parser::{kern::parse_kern_table, name::parse_name_table, TableDirectory};

use crate::config::RendererConfig;
use crate::render::{GpuContext, OutlineRasterizer};
use crate::renderer::FontRenderer;
use crate::Result;

/// A loaded font file.
///
/// Holds the raw bytes, the naming strings and the whole-font kerning
/// table (in font units). Shared read-only by every [`FontRenderer`]
/// created from it.
#[derive(Debug)]
pub struct FontFile {
    data: Arc<[u8]>,
    metadata: FontMetadata,
    kerning: KerningTable,
    has_raw_kerning: bool,
}

impl FontFile {
    /// Parse a font from its raw bytes.
    ///
    /// Fails when the `name` table is missing or the table directory is
    /// malformed. A missing `kern` table just means no kerning.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let data: Arc<[u8]> = data.into();
        let dir = TableDirectory::parse(&data)?;

        let metadata = parse_name_table(dir.table(b"name")?)?;
        let mut kerning = KerningTable::new();
        let kern = dir.find(b"kern")?;
        if let Some(kern) = kern {
            parse_kern_table(kern, &mut kerning);
        }
        let has_raw_kerning = kern.is_some();

        tracing::debug!(
            family = metadata.family().unwrap_or_default(),
            kerning_pairs = kerning.len(),
            "loaded font"
        );

        Ok(Self {
            data,
            metadata,
            kerning,
            has_raw_kerning,
        })
    }

    /// Read a font file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Read only the naming strings of a font, without building kerning
    pub fn read_names(data: &[u8]) -> Result<FontMetadata> {
        let dir = TableDirectory::parse(data)?;
        Ok(parse_name_table(dir.table(b"name")?)?)
    }

    /// Naming strings
    pub fn metadata(&self) -> &FontMetadata {
        &self.metadata
    }

    /// Whole-font kerning pairs in font units
    pub fn kerning(&self) -> &KerningTable {
        &self.kerning
    }

    /// Whether the font carries a `kern` table
    pub fn has_raw_kerning(&self) -> bool {
        self.has_raw_kerning
    }

    /// Raw font bytes
    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    /// Create a renderer for `pixel_size` backed by the outline rasterizer
    pub fn create_renderer(
        self: &Arc<Self>,
        pixel_size: f32,
        gpu: &mut dyn GpuContext,
        config: RendererConfig,
    ) -> Result<FontRenderer<OutlineRasterizer>> {
        let engine = OutlineRasterizer::open(self.data.clone(), pixel_size)?;
        FontRenderer::new(self.clone(), engine, gpu, config)
    }
}
