//! Font-size instances: measurement and batched drawing

use std::sync::Arc;

use tiny_skia::{Color, Rect};

use crate::config::RendererConfig;
use crate::font::{FontFile, KerningTable};
use crate::layout::{self, GlyphSource, HAlignment, LineInfo};
use crate::render::{
    Glyph, GlyphAtlas, GlyphCache, GlyphEngine, GpuContext, Placement, TexRect, Vertex,
};
use crate::Result;

/// Lines drawn over a string after its glyphs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextDecoration {
    pub underline: bool,
    pub line_through: bool,
}

impl TextDecoration {
    pub const NONE: Self = Self {
        underline: false,
        line_through: false,
    };
    pub const UNDERLINE: Self = Self {
        underline: true,
        line_through: false,
    };
    pub const LINE_THROUGH: Self = Self {
        underline: false,
        line_through: true,
    };
}

/// A font at one pixel size.
///
/// Owns the glyph cache, the atlas texture and the vertex batch. Measuring
/// only loads glyph metrics; bitmaps are rasterized into the atlas the
/// first time a glyph is drawn.
pub struct FontRenderer<E: GlyphEngine> {
    font: Arc<FontFile>,
    engine: E,
    glyphs: GlyphCache,
    atlas: GlyphAtlas,
    vertices: Vec<Vertex>,
    batch_vertices: usize,
    line_height: i32,
    baseline: i32,
    underline_offset: i32,
    underline_thickness: i32,
    space_width: i32,
    ex: i32,
    proportional: bool,
}

/// Resolves glyphs through the cache for the layout functions
struct Resolver<'a, E: GlyphEngine> {
    glyphs: &'a mut GlyphCache,
    engine: &'a mut E,
    font_kerning: &'a KerningTable,
}

impl<E: GlyphEngine> GlyphSource for Resolver<'_, E> {
    fn glyph(&mut self, c: char) -> Option<Glyph> {
        self.glyphs.resolve(c as u32, &mut *self.engine, self.font_kerning)
    }

    fn kerning(&self, left: &Glyph, right: &Glyph) -> i32 {
        self.glyphs.kerning(left.index, right.index)
    }
}

impl<E: GlyphEngine> FontRenderer<E> {
    /// Create a renderer drawing `font` through `engine`
    pub fn new(
        font: Arc<FontFile>,
        engine: E,
        gpu: &mut dyn GpuContext,
        config: RendererConfig,
    ) -> Result<Self> {
        let metrics = engine.metrics();
        let atlas = GlyphAtlas::new(gpu, config.atlas_width, config.atlas_height)?;
        let glyphs = GlyphCache::new(
            metrics.glyph_count,
            config.atlas_width,
            config.atlas_height,
            metrics.ascent,
            metrics.has_kerning,
        );

        let mut renderer = Self {
            font,
            engine,
            glyphs,
            atlas,
            vertices: Vec::with_capacity(config.batch_quads * 4),
            batch_vertices: config.batch_quads * 4,
            line_height: metrics.line_height,
            baseline: metrics.ascent,
            underline_offset: metrics.ascent - metrics.underline_position - metrics.underline_thickness,
            underline_thickness: metrics.underline_thickness,
            space_width: 1,
            ex: 1,
            proportional: !metrics.monospaced,
        };
        renderer.space_width = renderer
            .glyph(' ')
            .map_or(1, |g| g.x_advance + g.width as i32);
        renderer.ex = renderer.glyph('x').map_or(1, |g| g.height as i32);

        tracing::debug!(
            family = renderer.font.metadata().family().unwrap_or_default(),
            line_height = renderer.line_height,
            glyphs = metrics.glyph_count,
            "created font renderer"
        );
        Ok(renderer)
    }

    /// Distance between consecutive lines
    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    /// Distance from the top of the line to the baseline
    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    /// Em size, reported as the line height
    pub fn em(&self) -> i32 {
        self.line_height
    }

    /// Height of `x`
    pub fn ex(&self) -> i32 {
        self.ex
    }

    /// Width of a space including its ink
    pub fn space_width(&self) -> i32 {
        self.space_width
    }

    /// Distance from the top of the line to the top of the underline
    pub fn underline_offset(&self) -> i32 {
        self.underline_offset
    }

    pub fn underline_thickness(&self) -> i32 {
        self.underline_thickness
    }

    /// Whether glyph advances vary
    pub fn is_proportional(&self) -> bool {
        self.proportional
    }

    pub fn font(&self) -> &Arc<FontFile> {
        &self.font
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn glyph_cache(&self) -> &GlyphCache {
        &self.glyphs
    }

    /// Resolve the glyph of `c`
    pub fn glyph(&mut self, c: char) -> Option<Glyph> {
        self.resolver().glyph(c)
    }

    fn resolver(&mut self) -> Resolver<'_, E> {
        Resolver {
            glyphs: &mut self.glyphs,
            engine: &mut self.engine,
            font_kerning: self.font.kerning(),
        }
    }

    /// Width of `text` including kerning
    pub fn measure_width(&mut self, text: &str) -> i32 {
        layout::measure_width(&mut self.resolver(), text)
    }

    /// Number of characters of `text` that fit in `available` pixels
    pub fn count_visible_glyphs(&mut self, text: &str, available: i32) -> usize {
        let proportional = self.proportional;
        layout::count_visible_glyphs(&mut self.resolver(), text, available, proportional)
    }

    /// Width and alignment offset of every line of `text`
    pub fn layout_multi_line(&mut self, text: &str, width: i32, align: HAlignment) -> Vec<LineInfo> {
        layout::layout_multi_line(&mut self.resolver(), text, width, align)
    }

    /// Width of the widest line of `text`
    pub fn multi_line_width(&mut self, text: &str) -> i32 {
        layout::multi_line_width(&mut self.resolver(), text)
    }

    /// Start drawing in `color`.
    ///
    /// Pending quads are submitted when the returned batch is dropped.
    pub fn begin_batch<'a>(&'a mut self, gpu: &'a mut dyn GpuContext, color: Color) -> DrawBatch<'a, E> {
        DrawBatch {
            renderer: self,
            gpu,
            color,
        }
    }

    /// Release the atlas texture
    pub fn destroy(self, gpu: &mut dyn GpuContext) {
        self.atlas.destroy(gpu);
    }

    fn flush(&mut self, gpu: &mut dyn GpuContext, color: Color) {
        if !self.vertices.is_empty() {
            gpu.draw_quads(self.atlas.texture(), color, &self.vertices);
            self.vertices.clear();
        }
    }

    /// Make sure the bitmap of `glyph` is in the atlas
    fn ensure_placed(&mut self, gpu: &mut dyn GpuContext, color: Color, glyph: &Glyph) -> Option<TexRect> {
        if glyph.is_empty() {
            return None;
        }
        if let Placement::Placed(rect) = glyph.placement {
            return Some(rect);
        }

        let (width, height) = (glyph.width as u32, glyph.height as u32);
        let row = match self.atlas.find_row(width, height) {
            Some(row) => row,
            None => {
                // Quads already batched still sample the old contents
                self.flush(gpu, color);
                self.atlas.reset();
                self.glyphs.evict_placements();
                let Some(row) = self.atlas.find_row(width, height) else {
                    tracing::warn!(glyph = glyph.index, width, height, "glyph does not fit an empty atlas");
                    return None;
                };
                row
            }
        };

        match self.atlas.upload(gpu, &mut self.engine, row, glyph) {
            Ok(rect) => {
                self.glyphs.set_placement(glyph.index, Placement::Placed(rect));
                Some(rect)
            }
            Err(err) => {
                tracing::warn!(%err, glyph = glyph.index, "failed to rasterize glyph");
                None
            }
        }
    }

    fn push_quad(&mut self, gpu: &mut dyn GpuContext, color: Color, glyph: &Glyph, rect: TexRect, x: i32, y: i32) {
        if self.vertices.len() + 4 > self.batch_vertices {
            self.flush(gpu, color);
        }
        let x0 = (x + glyph.x_offset) as f32;
        let y0 = (y + glyph.y_offset) as f32;
        let x1 = x0 + glyph.width as f32;
        let y1 = y0 + glyph.height as f32;
        self.vertices.extend_from_slice(&[
            Vertex { u: rect.tx0, v: rect.ty0, x: x0, y: y0 },
            Vertex { u: rect.tx0, v: rect.ty1, x: x0, y: y1 },
            Vertex { u: rect.tx1, v: rect.ty1, x: x1, y: y1 },
            Vertex { u: rect.tx1, v: rect.ty0, x: x1, y: y0 },
        ]);
    }

    fn draw_decorations(
        &self,
        gpu: &mut dyn GpuContext,
        color: Color,
        x: i32,
        y: i32,
        width: i32,
        decoration: TextDecoration,
    ) {
        if width <= 0 {
            return;
        }
        let mut line = |top: i32| {
            let rect = Rect::from_xywh(x as f32, top as f32, width as f32, self.underline_thickness as f32);
            if let Some(rect) = rect {
                gpu.fill_rect(color, rect);
            }
        };
        if decoration.underline {
            line(y + self.underline_offset);
        }
        if decoration.line_through {
            line(y + self.line_height / 2);
        }
    }
}

/// An open draw batch of one [`FontRenderer`].
///
/// Quads are buffered and submitted when the buffer fills, when the atlas
/// has to be rebuilt, and when the batch is dropped.
pub struct DrawBatch<'a, E: GlyphEngine> {
    renderer: &'a mut FontRenderer<E>,
    gpu: &'a mut dyn GpuContext,
    color: Color,
}

impl<E: GlyphEngine> DrawBatch<'_, E> {
    /// Draw `text` with its top-left corner at `(x, y)`.
    ///
    /// Returns the advance of the text, identical to
    /// [`FontRenderer::measure_width`].
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str) -> i32 {
        let renderer = &mut *self.renderer;
        let mut pen = x;
        let mut last: Option<Glyph> = None;
        for c in text.chars() {
            let Some(glyph) = renderer.glyph(c) else {
                continue;
            };
            if let Some(prev) = &last {
                pen += renderer.glyphs.kerning(prev.index, glyph.index);
            }
            if let Some(rect) = renderer.ensure_placed(self.gpu, self.color, &glyph) {
                renderer.push_quad(self.gpu, self.color, &glyph, rect, pen, y);
            }
            pen += glyph.x_advance;
            last = Some(glyph);
        }
        pen - x
    }

    /// Draw `text` and then its decoration lines
    pub fn draw_decorated_text(&mut self, x: i32, y: i32, text: &str, decoration: TextDecoration) -> i32 {
        let width = self.draw_text(x, y, text);
        if decoration != TextDecoration::NONE {
            self.flush();
            self.renderer
                .draw_decorations(self.gpu, self.color, x, y, width, decoration);
        }
        width
    }

    /// Draw each line of `text` aligned inside `width`, one line height
    /// apart. Returns the number of lines.
    pub fn draw_multi_line_text(&mut self, x: i32, y: i32, text: &str, width: i32, align: HAlignment) -> usize {
        let mut y = y;
        let mut count = 0;
        for line in layout::lines(text) {
            let x_offset = match align {
                HAlignment::Left => 0,
                HAlignment::Center | HAlignment::Right => {
                    align.offset(width, self.renderer.measure_width(line))
                }
            };
            self.draw_text(x + x_offset, y, line);
            y += self.renderer.line_height;
            count += 1;
        }
        count
    }

    /// Submit buffered quads
    pub fn flush(&mut self) {
        self.renderer.flush(self.gpu, self.color);
    }
}

impl<E: GlyphEngine> Drop for DrawBatch<'_, E> {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::parser::kern::tests::{build_kern_table, format0_subtable};
    use crate::font::parser::name::tests::build_name_table;
    use crate::font::parser::tests::build_font;
    use crate::render::mock::MockEngine;
    use crate::render::{DrawCall, SoftwareGpu};

    fn plain_font() -> Arc<FontFile> {
        let name = build_name_table(&[]);
        Arc::new(FontFile::from_bytes(build_font(&[(b"name", &name)])).unwrap())
    }

    fn renderer(gpu: &mut SoftwareGpu, engine: MockEngine, config: RendererConfig) -> FontRenderer<MockEngine> {
        FontRenderer::new(plain_font(), engine, gpu, config).unwrap()
    }

    fn quad_count(gpu: &SoftwareGpu) -> usize {
        gpu.quads().count()
    }

    #[test]
    fn test_scalar_metrics() {
        let mut gpu = SoftwareGpu::new();
        let r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        assert_eq!(r.line_height(), 16);
        assert_eq!(r.em(), 16);
        assert_eq!(r.baseline(), 12);
        assert_eq!(r.underline_offset(), 13);
        assert_eq!(r.underline_thickness(), 1);
        assert_eq!(r.space_width(), 4);
        assert_eq!(r.ex(), 10);
        assert!(r.is_proportional());
    }

    #[test]
    fn test_monospaced_is_not_proportional() {
        let mut gpu = SoftwareGpu::new();
        let mut engine = MockEngine::new();
        engine.metrics.monospaced = true;
        let mut r = renderer(&mut gpu, engine, RendererConfig::default());
        assert!(!r.is_proportional());
        // Ink of 'A' spans 1..7
        assert_eq!(r.count_visible_glyphs("AAA", 7), 1);
    }

    #[test]
    fn test_measure_does_not_rasterize() {
        let mut gpu = SoftwareGpu::new();
        let mut r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        assert_eq!(r.measure_width("Hello world"), 10 * 8 + 4);
        assert_eq!(r.engine().renders, 0);
        assert!(r.atlas().rows().is_empty());
    }

    #[test]
    fn test_kerned_measure_matches_draw() {
        let mut engine = MockEngine::new();
        let (a, v) = (engine.index_of('A'), engine.index_of('V'));
        engine.kern(a, v, -2);
        engine.kern(v, a, -1);
        let kern = build_kern_table(&[format0_subtable(0x0001, &[(a, v, -100), (v, a, -50)])]);
        let name = build_name_table(&[]);
        let font = Arc::new(FontFile::from_bytes(build_font(&[(b"kern", &kern), (b"name", &name)])).unwrap());

        let mut gpu = SoftwareGpu::new();
        let mut r = FontRenderer::new(font, engine, &mut gpu, RendererConfig::default()).unwrap();
        let measured = r.measure_width("AVAV");
        assert_eq!(measured, 4 * 8 - 2 - 1 - 2);

        let drawn = r.begin_batch(&mut gpu, Color::BLACK).draw_text(0, 0, "AVAV");
        assert_eq!(drawn, measured);
    }

    #[test]
    fn test_quad_geometry() {
        let mut gpu = SoftwareGpu::new();
        let mut r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        let width = r.begin_batch(&mut gpu, Color::BLACK).draw_text(10, 20, "A B");
        assert_eq!(width, 8 + 4 + 8);

        let quads: Vec<_> = gpu.quads().collect();
        assert_eq!(quads.len(), 2);
        let q = quads[0];
        // x_offset 1, y_offset 12 - 10
        assert_eq!((q[0].x, q[0].y), (11.0, 22.0));
        assert_eq!((q[1].x, q[1].y), (11.0, 32.0));
        assert_eq!((q[2].x, q[2].y), (17.0, 32.0));
        assert_eq!((q[3].x, q[3].y), (17.0, 22.0));
        assert_eq!((q[0].u, q[0].v), (q[1].u, q[3].v));
        assert_eq!(quads[1][0].x, 10.0 + 12.0 + 1.0);
    }

    #[test]
    fn test_glyph_rasterized_once() {
        let mut gpu = SoftwareGpu::new();
        let mut r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        {
            let mut batch = r.begin_batch(&mut gpu, Color::BLACK);
            batch.draw_text(0, 0, "AAAA");
            batch.draw_text(0, 20, "A");
        }
        assert_eq!(r.engine().renders, 1);
        assert_eq!(quad_count(&gpu), 5);
    }

    #[test]
    fn test_render_failure_keeps_advance() {
        let mut gpu = SoftwareGpu::new();
        let mut engine = MockEngine::new();
        engine.fail_renders = true;
        let mut r = renderer(&mut gpu, engine, RendererConfig::default());
        let measured = r.measure_width("AB");

        let drawn = r.begin_batch(&mut gpu, Color::BLACK).draw_text(0, 0, "AB");
        assert_eq!(drawn, measured);
        assert_eq!(quad_count(&gpu), 0);
        assert_eq!(r.glyph('A').unwrap().placement, Placement::Unplaced);
        assert_eq!(r.glyph('B').unwrap().placement, Placement::Unplaced);

        r.engine.fail_renders = false;
        let drawn = r.begin_batch(&mut gpu, Color::BLACK).draw_text(0, 0, "AB");
        assert_eq!(drawn, measured);
        assert_eq!(quad_count(&gpu), 2);
        assert!(matches!(r.glyph('A').unwrap().placement, Placement::Placed(_)));
        assert_eq!(r.engine().renders, 2);
    }

    #[test]
    fn test_batch_flushes_when_full() {
        let mut gpu = SoftwareGpu::new();
        let config = RendererConfig::default().batch_quads(2);
        let mut r = renderer(&mut gpu, MockEngine::new(), config);
        r.begin_batch(&mut gpu, Color::BLACK).draw_text(0, 0, "ABCDE");

        let sizes: Vec<_> = gpu
            .calls
            .iter()
            .map(|call| match call {
                DrawCall::Quads { vertices, .. } => vertices.len() / 4,
                DrawCall::Rect { .. } => 0,
            })
            .collect();
        assert_eq!(sizes, [2, 2, 1]);
    }

    #[test]
    fn test_batch_drop_flushes() {
        let mut gpu = SoftwareGpu::new();
        let mut r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        let mut batch = r.begin_batch(&mut gpu, Color::WHITE);
        batch.draw_text(0, 0, "Hi");
        drop(batch);
        assert_eq!(gpu.calls.len(), 1);
        assert!(matches!(&gpu.calls[0], DrawCall::Quads { color, .. } if *color == Color::WHITE));
    }

    #[test]
    fn test_atlas_rebuild_keeps_metrics() {
        let mut gpu = SoftwareGpu::new();
        // Room for one 12 pixel row of two 6 pixel glyphs
        let config = RendererConfig::default().atlas_size(16, 16);
        let mut r = renderer(&mut gpu, MockEngine::new(), config);
        let before = r.glyph('A').unwrap();

        let width = r.begin_batch(&mut gpu, Color::BLACK).draw_text(0, 0, "ABC");
        assert_eq!(width, 24);
        assert_eq!(r.atlas().rebuilds, 1);
        assert_eq!(quad_count(&gpu), 3);
        assert_eq!(r.glyph('A').unwrap().placement, Placement::Unplaced);
        assert!(r.glyph('C').unwrap().tex_rect().is_some());

        r.begin_batch(&mut gpu, Color::BLACK).draw_text(0, 0, "A");
        let after = r.glyph('A').unwrap();
        assert!(after.tex_rect().is_some());
        assert_eq!((after.width, after.height, after.x_advance), (before.width, before.height, before.x_advance));
        assert_eq!(r.atlas().rebuilds, 1);
    }

    #[test]
    fn test_oversized_glyph_draws_nothing() {
        let mut gpu = SoftwareGpu::new();
        let config = RendererConfig::default().atlas_size(8, 8);
        let mut r = renderer(&mut gpu, MockEngine::new(), config);
        let glyph = r.glyph('A').unwrap();
        assert_eq!((glyph.width, glyph.height, glyph.x_advance), (0, 0, 8));

        let width = r.begin_batch(&mut gpu, Color::BLACK).draw_text(0, 0, "AA");
        assert_eq!(width, 16);
        assert_eq!(quad_count(&gpu), 0);
    }

    #[test]
    fn test_decorations() {
        let mut gpu = SoftwareGpu::new();
        let mut r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        let both = TextDecoration {
            underline: true,
            line_through: true,
        };
        r.begin_batch(&mut gpu, Color::BLACK).draw_decorated_text(5, 10, "AB", both);

        let rects: Vec<_> = gpu
            .calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Rect { rect, .. } => Some(*rect),
                DrawCall::Quads { .. } => None,
            })
            .collect();
        assert_eq!(rects.len(), 2);
        assert_eq!((rects[0].x(), rects[0].y(), rects[0].width()), (5.0, 23.0, 16.0));
        assert_eq!(rects[0].height(), 1.0);
        assert_eq!(rects[1].y(), 18.0);
        // Glyph quads are submitted before the lines
        assert!(matches!(gpu.calls[0], DrawCall::Quads { .. }));
    }

    #[test]
    fn test_empty_text_has_no_decoration() {
        let mut gpu = SoftwareGpu::new();
        let mut r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        let width = r
            .begin_batch(&mut gpu, Color::BLACK)
            .draw_decorated_text(0, 0, "", TextDecoration::UNDERLINE);
        assert_eq!(width, 0);
        assert!(gpu.calls.is_empty());
    }

    #[test]
    fn test_multi_line_drawing() {
        let mut gpu = SoftwareGpu::new();
        let mut r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        let lines = r
            .begin_batch(&mut gpu, Color::BLACK)
            .draw_multi_line_text(0, 0, "A\nBB\n", 40, HAlignment::Right);
        assert_eq!(lines, 2);

        let quads: Vec<_> = gpu.quads().collect();
        assert_eq!(quads.len(), 3);
        assert_eq!((quads[0][0].x, quads[0][0].y), (33.0, 2.0));
        assert_eq!((quads[1][0].x, quads[1][0].y), (25.0, 18.0));

        assert_eq!(r.multi_line_width("A\nBB\n"), 16);
        let info = r.layout_multi_line("A\nBB", 40, HAlignment::Center);
        assert_eq!(info[0], LineInfo { width: 8, x_offset: 16 });
    }

    #[test]
    fn test_destroy_releases_texture() {
        let mut gpu = SoftwareGpu::new();
        let r = renderer(&mut gpu, MockEngine::new(), RendererConfig::default());
        assert_eq!(gpu.texture_count(), 1);
        r.destroy(&mut gpu);
        assert_eq!(gpu.texture_count(), 0);
    }
}
