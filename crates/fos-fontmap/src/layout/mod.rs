//! Text measurement and line layout
//!
//! All functions walk the text left to right one code point at a time.
//! Code points whose glyph cannot be resolved are skipped. Kerning between
//! two consecutive resolved glyphs is added to the cursor before the
//! second glyph's advance.

use crate::render::Glyph;

/// Horizontal alignment of a line inside a box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlignment {
    Left,
    Center,
    Right,
}

impl HAlignment {
    /// Offset of a line of `line_width` inside `width`
    pub fn offset(self, width: i32, line_width: i32) -> i32 {
        match self {
            HAlignment::Left => 0,
            HAlignment::Center => (width - line_width) / 2,
            HAlignment::Right => width - line_width,
        }
    }
}

/// Width and alignment offset of one line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineInfo {
    pub width: i32,
    pub x_offset: i32,
}

/// Resolves characters to glyphs for layout
pub trait GlyphSource {
    /// Glyph for `c`, `None` if it cannot be resolved
    fn glyph(&mut self, c: char) -> Option<Glyph>;

    /// Kerning between two consecutive glyphs
    fn kerning(&self, left: &Glyph, right: &Glyph) -> i32;
}

/// Total advance of `text` including kerning
pub fn measure_width<S: GlyphSource + ?Sized>(source: &mut S, text: &str) -> i32 {
    let mut width = 0;
    let mut last: Option<Glyph> = None;
    for c in text.chars() {
        let Some(glyph) = source.glyph(c) else {
            continue;
        };
        if let Some(prev) = &last {
            width += source.kerning(prev, &glyph);
        }
        width += glyph.x_advance;
        last = Some(glyph);
    }
    width
}

/// Number of characters of `text` that fit in `available` pixels.
///
/// A proportional font stops at the first glyph whose advance takes the
/// cursor past `available`. A fixed-pitch font stops at the first glyph
/// whose ink would cross `available`, so a glyph ending exactly on the
/// boundary still fits.
pub fn count_visible_glyphs<S: GlyphSource + ?Sized>(
    source: &mut S,
    text: &str,
    available: i32,
    proportional: bool,
) -> usize {
    let mut count = 0;
    let mut width = 0;
    let mut last: Option<Glyph> = None;
    for c in text.chars() {
        if let Some(glyph) = source.glyph(c) {
            if let Some(prev) = &last {
                width += source.kerning(prev, &glyph);
            }
            if proportional {
                width += glyph.x_advance;
                if width > available {
                    break;
                }
            } else {
                if width + glyph.ink_extent() > available {
                    break;
                }
                width += glyph.x_advance;
            }
            last = Some(glyph);
        }
        count += 1;
    }
    count
}

/// Lines of `text` separated by `'\n'`; a trailing newline adds no line
pub fn lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.split_terminator('\n')
}

/// Width and offset of every line of `text` aligned inside `width`
pub fn layout_multi_line<S: GlyphSource + ?Sized>(
    source: &mut S,
    text: &str,
    width: i32,
    align: HAlignment,
) -> Vec<LineInfo> {
    lines(text)
        .map(|line| {
            let line_width = measure_width(source, line);
            LineInfo {
                width: line_width,
                x_offset: align.offset(width, line_width),
            }
        })
        .collect()
}

/// Width of the widest line of `text`
pub fn multi_line_width<S: GlyphSource + ?Sized>(source: &mut S, text: &str) -> i32 {
    lines(text)
        .map(|line| measure_width(source, line))
        .max()
        .unwrap_or(0)
}
