//! Shelf-packed glyph atlas

use super::engine::GlyphEngine;
use super::glyph::{Glyph, TexRect};
use super::gpu::{GpuContext, TextureId};
use crate::Result;

/// A horizontal strip of the atlas filled left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    /// Top edge in pixels
    pub y: u32,
    /// Height in pixels (multiple of 4 unless clamped to the texture)
    pub height: u32,
    /// Next free column
    pub x: u32,
}

/// Glyph bitmaps packed into one 8-bit alpha texture.
///
/// Rows are allocated top-down and never move. When no row fits and the
/// texture has no vertical room left, [`GlyphAtlas::find_row`] reports the
/// atlas as full; the owner then flushes pending draws, calls
/// [`GlyphAtlas::reset`] and evicts every placement before retrying.
#[derive(Debug)]
pub struct GlyphAtlas {
    texture: TextureId,
    width: u32,
    height: u32,
    rows: Vec<Row>,
    /// Top of the unallocated area
    next_y: u32,
    /// Staging buffer for rasterized bitmaps
    scratch: Vec<u8>,
    /// Number of resets so far
    pub rebuilds: u64,
}

impl GlyphAtlas {
    /// Create the atlas texture
    pub fn new(gpu: &mut dyn GpuContext, width: u32, height: u32) -> Result<Self> {
        let texture = gpu.create_texture(width, height)?;
        Ok(Self {
            texture,
            width,
            height,
            rows: Vec::new(),
            next_y: 0,
            scratch: Vec::new(),
            rebuilds: 0,
        })
    }

    /// Texture holding the glyph bitmaps
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Texture width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Texture height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Allocated rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Find a row with room for a `width` x `height` bitmap.
    ///
    /// Picks the shortest existing row whose height lies in `[h, 2h)` for
    /// the 4-aligned height `h` and which has `width` free columns. Opens a
    /// new row when none qualifies. Returns `None` when the texture is full.
    pub fn find_row(&mut self, width: u32, height: u32) -> Option<usize> {
        if width > self.width || height > self.height {
            return None;
        }
        let height = ((height + 3) & !3).min(self.height);
        let end = self.width - width;

        let best = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.height >= height && row.height < height * 2 && row.x <= end)
            .min_by_key(|(_, row)| row.height)
            .map(|(i, _)| i);
        if best.is_some() {
            return best;
        }

        if self.height - self.next_y < height {
            return None;
        }
        tracing::trace!(y = self.next_y, height, "new atlas row");
        self.rows.push(Row {
            y: self.next_y,
            height,
            x: 0,
        });
        self.next_y += height;
        Some(self.rows.len() - 1)
    }

    /// Rasterize `glyph` into `row` and upload it.
    ///
    /// The row cursor only advances once the engine produced the bitmap.
    pub fn upload<E: GlyphEngine>(
        &mut self,
        gpu: &mut dyn GpuContext,
        engine: &mut E,
        row: usize,
        glyph: &Glyph,
    ) -> Result<TexRect> {
        let (width, height) = (glyph.width as u32, glyph.height as u32);
        self.scratch.clear();
        self.scratch.resize(width as usize * height as usize, 0);
        engine.render_glyph(glyph.index, &mut self.scratch, width as usize)?;

        let row = &mut self.rows[row];
        let (x, y) = (row.x, row.y);
        row.x += width;
        gpu.upload_alpha(self.texture, x, y, width, height, &self.scratch);
        Ok(self.tex_rect(x, y, width, height))
    }

    /// Normalized rectangle of a bitmap at `(x, y)`.
    ///
    /// A bitmap one texel wide or high maps to the texel centre with zero
    /// extent on that axis.
    pub fn tex_rect(&self, x: u32, y: u32, width: u32, height: u32) -> TexRect {
        let (mut fx, mut fy) = (x as f32, y as f32);
        let (mut w, mut h) = (width as f32, height as f32);
        if width == 1 {
            fx += 0.5;
            w = 0.0;
        }
        if height == 1 {
            fy += 0.5;
            h = 0.0;
        }
        let sx = 1.0 / self.width as f32;
        let sy = 1.0 / self.height as f32;
        TexRect {
            tx0: fx * sx,
            ty0: fy * sy,
            tx1: (fx + w) * sx,
            ty1: (fy + h) * sy,
        }
    }

    /// Drop every row and start packing from the top again
    pub fn reset(&mut self) {
        self.rows.clear();
        self.next_y = 0;
        self.rebuilds += 1;
        tracing::debug!(rebuilds = self.rebuilds, "glyph atlas rebuilt");
    }

    /// Release the texture
    pub fn destroy(self, gpu: &mut dyn GpuContext) {
        gpu.destroy_texture(self.texture);
    }
}
