//! Glyph records and the per-size glyph cache

use super::engine::GlyphEngine;
use crate::font::KerningTable;
use crate::paged::PagedArray;

/// Normalized texture-space rectangle of a placed glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexRect {
    pub tx0: f32,
    pub ty0: f32,
    pub tx1: f32,
    pub ty1: f32,
}

/// Atlas state of a glyph bitmap
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Placement {
    /// Not in the atlas texture (never drawn, or evicted by a rebuild)
    #[default]
    Unplaced,
    /// Stored in the atlas texture
    Placed(TexRect),
}

/// A glyph at one pixel size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Glyph index in the font
    pub index: u16,
    /// Bitmap width in pixels
    pub width: u16,
    /// Bitmap height in pixels
    pub height: u16,
    /// Horizontal offset from the pen position to the bitmap
    pub x_offset: i32,
    /// Vertical offset from the top of the line to the bitmap
    pub y_offset: i32,
    /// Horizontal advance
    pub x_advance: i32,
    /// Atlas placement
    pub placement: Placement,
}

impl Glyph {
    /// A glyph without ink that only advances the pen
    pub fn blank(index: u16, x_advance: i32) -> Self {
        Self {
            index,
            width: 0,
            height: 0,
            x_offset: 0,
            y_offset: 0,
            x_advance,
            placement: Placement::Unplaced,
        }
    }

    /// Whether the glyph has no bitmap to draw
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Horizontal extent of the ink from the pen position
    pub fn ink_extent(&self) -> i32 {
        self.x_offset + self.width as i32
    }

    /// Atlas rectangle, if placed
    pub fn tex_rect(&self) -> Option<TexRect> {
        match self.placement {
            Placement::Placed(rect) => Some(rect),
            Placement::Unplaced => None,
        }
    }
}

/// Glyphs of one font-size instance.
///
/// Code points are mapped to glyph indices through a paged table; glyph
/// records live in a flat array indexed by glyph index, so every code point
/// aliasing the same glyph shares one record. The cache also owns the
/// per-size kerning rows (pixels), filled the first time a glyph resolves.
#[derive(Debug, Clone)]
pub struct GlyphCache {
    glyphs: Vec<Option<Glyph>>,
    by_code_point: PagedArray<Option<u16>>,
    kerning: KerningTable,
    max_width: u32,
    max_height: u32,
    baseline: i32,
    has_kerning: bool,
}

impl GlyphCache {
    /// Create a cache for a font with `glyph_count` glyphs.
    ///
    /// Glyphs whose bitmap exceeds `max_width` x `max_height` are kept as
    /// blank glyphs. `baseline` converts bearings to top-of-line offsets.
    pub fn new(glyph_count: u16, max_width: u32, max_height: u32, baseline: i32, has_kerning: bool) -> Self {
        Self {
            glyphs: vec![None; glyph_count as usize + 1],
            by_code_point: PagedArray::new(),
            kerning: KerningTable::new(),
            max_width,
            max_height,
            baseline,
            has_kerning,
        }
    }

    /// Resolve a code point to its glyph.
    ///
    /// Returns `None` only when the engine fails to load the glyph; such
    /// failures are not cached and are retried on the next call.
    pub fn resolve<E: GlyphEngine>(
        &mut self,
        code_point: u32,
        engine: &mut E,
        font_kerning: &KerningTable,
    ) -> Option<Glyph> {
        if let Some(Some(index)) = self.by_code_point.get(code_point) {
            return self.glyphs[*index as usize];
        }

        let mut index = engine.glyph_index(code_point);
        if index as usize >= self.glyphs.len() {
            tracing::warn!(code_point, index, "glyph index out of range, using missing glyph");
            index = 0;
        }
        let glyph = self.resolve_by_index(index, engine, font_kerning)?;
        self.by_code_point.set(code_point, Some(glyph.index));
        Some(glyph)
    }

    /// Resolve a glyph index, loading its metrics on first use
    pub fn resolve_by_index<E: GlyphEngine>(
        &mut self,
        index: u16,
        engine: &mut E,
        font_kerning: &KerningTable,
    ) -> Option<Glyph> {
        let slot = self.glyphs.get(index as usize)?;
        if let Some(glyph) = slot {
            return Some(*glyph);
        }

        let metrics = match engine.load_glyph(index) {
            Ok(metrics) => metrics,
            Err(err) => {
                tracing::warn!(%err, index, "failed to load glyph");
                return None;
            }
        };

        let glyph = if metrics.width > self.max_width || metrics.height > self.max_height {
            tracing::warn!(
                index,
                width = metrics.width,
                height = metrics.height,
                "glyph larger than the atlas, drawing it blank"
            );
            Glyph::blank(index, metrics.advance)
        } else {
            Glyph {
                index,
                width: metrics.width as u16,
                height: metrics.height as u16,
                x_offset: metrics.bearing_x,
                y_offset: self.baseline - metrics.bearing_y,
                x_advance: metrics.advance,
                placement: Placement::Unplaced,
            }
        };
        self.glyphs[index as usize] = Some(glyph);

        if self.has_kerning {
            self.kerning
                .fill_row(index, font_kerning, |left, rights| engine.kerning_row(left, rights));
        }
        Some(glyph)
    }

    /// Cached glyph by index
    pub fn get(&self, index: u16) -> Option<&Glyph> {
        self.glyphs.get(index as usize)?.as_ref()
    }

    /// Kerning in pixels between two resolved glyphs
    pub fn kerning(&self, left: u16, right: u16) -> i32 {
        self.kerning.lookup(left, right) as i32
    }

    /// Record the atlas placement of a glyph
    pub fn set_placement(&mut self, index: u16, placement: Placement) {
        if let Some(Some(glyph)) = self.glyphs.get_mut(index as usize) {
            glyph.placement = placement;
        }
    }

    /// Mark every glyph as not in the atlas
    pub fn evict_placements(&mut self) {
        for glyph in self.glyphs.iter_mut().flatten() {
            glyph.placement = Placement::Unplaced;
        }
    }

    /// Iterate over resolved glyphs
    pub fn iter(&self) -> impl Iterator<Item = &Glyph> + '_ {
        self.glyphs.iter().flatten()
    }
}
