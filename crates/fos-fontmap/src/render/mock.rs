//! Deterministic glyph engine for unit tests

use std::cell::Cell;
use std::collections::HashMap;

use super::engine::{FontMetrics, GlyphEngine, GlyphMetrics};
use crate::{FontError, Result};

/// Every printable ASCII glyph is a 6x10 box with advance 8, the space is
/// blank with advance 4. Glyph 0 is the missing-glyph box.
pub(crate) struct MockEngine {
    pub metrics: FontMetrics,
    pub loads: usize,
    pub renders: usize,
    pub fail_loads: bool,
    pub fail_renders: bool,
    pub kerning_rows: Cell<usize>,
    glyphs: Vec<GlyphMetrics>,
    chars: HashMap<u32, u16>,
    kerning: HashMap<(u16, u16), i32>,
}

const BOX: GlyphMetrics = GlyphMetrics {
    width: 6,
    height: 10,
    bearing_x: 1,
    bearing_y: 10,
    advance: 8,
};

impl MockEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            metrics: FontMetrics {
                line_height: 16,
                ascent: 12,
                max_descent: 4,
                underline_position: -2,
                underline_thickness: 1,
                max_glyph_width: 8,
                glyph_count: 0,
                has_kerning: false,
                monospaced: false,
            },
            loads: 0,
            renders: 0,
            fail_loads: false,
            fail_renders: false,
            kerning_rows: Cell::new(0),
            glyphs: vec![BOX],
            chars: HashMap::new(),
            kerning: HashMap::new(),
        };
        engine.push(' ', GlyphMetrics { advance: 4, ..GlyphMetrics::default() });
        for c in '!'..='~' {
            engine.push(c, BOX);
        }
        engine
    }

    fn push(&mut self, c: char, metrics: GlyphMetrics) -> u16 {
        let index = self.glyphs.len() as u16;
        self.glyphs.push(metrics);
        self.chars.insert(c as u32, index);
        self.metrics.glyph_count = self.glyphs.len() as u16;
        index
    }

    /// Replace the glyph of `c` with a `width` x `height` box
    pub fn add_glyph(&mut self, c: char, width: u32, height: u32, advance: i32) -> u16 {
        self.push(
            c,
            GlyphMetrics {
                width,
                height,
                bearing_x: 0,
                bearing_y: height as i32,
                advance,
            },
        )
    }

    /// Map `c` to the glyph of `target`
    pub fn map_char(&mut self, c: char, target: char) {
        let index = self.index_of(target);
        self.chars.insert(c as u32, index);
    }

    pub fn index_of(&self, c: char) -> u16 {
        self.chars.get(&(c as u32)).copied().unwrap_or(0)
    }

    pub fn kern(&mut self, left: u16, right: u16, value: i32) {
        self.kerning.insert((left, right), value);
        self.metrics.has_kerning = true;
    }
}

impl GlyphEngine for MockEngine {
    fn glyph_index(&self, code_point: u32) -> u16 {
        self.chars.get(&code_point).copied().unwrap_or(0)
    }

    fn load_glyph(&mut self, glyph: u16) -> Result<GlyphMetrics> {
        if self.fail_loads {
            return Err(FontError::RasterizationFailed {
                glyph,
                reason: "mock failure".into(),
            });
        }
        self.loads += 1;
        Ok(self.glyphs[glyph as usize])
    }

    fn render_glyph(&mut self, glyph: u16, buffer: &mut [u8], stride: usize) -> Result<()> {
        if self.fail_renders {
            return Err(FontError::RasterizationFailed {
                glyph,
                reason: "mock failure".into(),
            });
        }
        self.renders += 1;
        let metrics = self.glyphs[glyph as usize];
        for row in 0..metrics.height as usize {
            buffer[row * stride..][..metrics.width as usize].fill(0xFF);
        }
        Ok(())
    }

    fn kerning(&self, left: u16, right: u16) -> i32 {
        self.kerning.get(&(left, right)).copied().unwrap_or(0)
    }

    fn kerning_row(&self, left: u16, rights: &[u16]) -> Vec<i32> {
        self.kerning_rows.set(self.kerning_rows.get() + 1);
        rights.iter().map(|&right| self.kerning(left, right)).collect()
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }
}
