//! Glyph engine interface
//!
//! The renderer never turns outlines into pixels itself. A [`GlyphEngine`]
//! bound to one pixel size does that, and reports glyph and font metrics.

use crate::Result;

/// Ink metrics of one glyph at the engine's pixel size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// Offset from the pen position to the left edge of the bitmap
    pub bearing_x: i32,
    /// Offset from the baseline up to the top edge of the bitmap
    pub bearing_y: i32,
    /// Horizontal advance in pixels
    pub advance: i32,
}

/// Font-wide metrics at the engine's pixel size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontMetrics {
    /// Distance between consecutive baselines
    pub line_height: i32,
    /// Distance from the top of the line to the baseline
    pub ascent: i32,
    /// Largest distance below the baseline
    pub max_descent: i32,
    /// Underline position relative to the baseline (negative is below)
    pub underline_position: i32,
    /// Underline thickness
    pub underline_thickness: i32,
    /// Largest glyph bitmap width
    pub max_glyph_width: i32,
    /// Number of glyphs in the font
    pub glyph_count: u16,
    /// Whether pair kerning is available
    pub has_kerning: bool,
    /// Whether every glyph has the same advance
    pub monospaced: bool,
}

/// A font opened at one pixel size by an external rasterizer
pub trait GlyphEngine {
    /// Map a code point to a glyph index (0 is the missing glyph)
    fn glyph_index(&self, code_point: u32) -> u16;

    /// Load the ink metrics of a glyph
    fn load_glyph(&mut self, glyph: u16) -> Result<GlyphMetrics>;

    /// Rasterize a glyph into `buffer` as 8-bit alpha rows of `stride` bytes.
    ///
    /// The bitmap has the size reported by [`GlyphEngine::load_glyph`].
    fn render_glyph(&mut self, glyph: u16, buffer: &mut [u8], stride: usize) -> Result<()>;

    /// Horizontal kerning between two glyphs in pixels, 0 if none
    fn kerning(&self, left: u16, right: u16) -> i32;

    /// Kerning of `left` against each glyph of `rights`, in order
    fn kerning_row(&self, left: u16, rights: &[u16]) -> Vec<i32> {
        rights.iter().map(|&right| self.kerning(left, right)).collect()
    }

    /// Font-wide metrics
    fn metrics(&self) -> FontMetrics;
}
