//! Outline glyph rasterization

use std::sync::Arc;

use ttf_parser::{Face, GlyphId, OutlineBuilder};

use super::engine::{FontMetrics, GlyphEngine, GlyphMetrics};
use crate::{FontError, Result};

/// Glyph engine rasterizing TrueType/CFF outlines with tiny-skia
#[derive(Debug, Clone)]
pub struct OutlineRasterizer {
    data: Arc<[u8]>,
    pixel_size: f32,
    /// Font units to pixels
    scale: f32,
    metrics: FontMetrics,
}

/// Glyph bounding box snapped outward to whole pixels
#[derive(Debug, Clone, Copy)]
struct PixelBox {
    x_min: i32,
    y_max: i32,
    width: u32,
    height: u32,
}

impl OutlineRasterizer {
    /// Open a font at `pixel_size` (pixels per em)
    pub fn open(data: Arc<[u8]>, pixel_size: f32) -> Result<Self> {
        let face = parse_face(&data)?;
        let units_per_em = face.units_per_em();
        if units_per_em == 0 || !(pixel_size > 0.0) {
            return Err(FontError::UnsupportedFormat(format!(
                "cannot scale {units_per_em} units per em to {pixel_size}px"
            )));
        }
        let scale = pixel_size / units_per_em as f32;
        let px = |v: f32| (v * scale).round() as i32;

        let ascender = face.ascender() as f32;
        let descender = face.descender() as f32;
        let line_gap = face.line_gap() as f32;
        let underline = face.underline_metrics();
        let bbox = face.global_bounding_box();

        let metrics = FontMetrics {
            line_height: px(ascender - descender + line_gap),
            ascent: px(ascender),
            max_descent: px(-descender),
            underline_position: underline.map_or(-1, |u| px(u.position as f32)),
            underline_thickness: underline.map_or(1, |u| px(u.thickness as f32).max(1)),
            max_glyph_width: ((bbox.x_max as f32 - bbox.x_min as f32) * scale).ceil() as i32,
            glyph_count: face.number_of_glyphs(),
            has_kerning: face.tables().kern.is_some_and(|k| !k.subtables.is_empty()),
            monospaced: face.is_monospaced(),
        };
        drop(face);

        Ok(Self {
            data,
            pixel_size,
            scale,
            metrics,
        })
    }

    /// Pixels per em
    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    fn face(&self) -> Result<Face<'_>> {
        parse_face(&self.data)
    }

    fn pixel_box(&self, face: &Face<'_>, glyph: GlyphId) -> Option<PixelBox> {
        let bbox = face.glyph_bounding_box(glyph)?;
        let x_min = (bbox.x_min as f32 * self.scale).floor() as i32;
        let x_max = (bbox.x_max as f32 * self.scale).ceil() as i32;
        let y_min = (bbox.y_min as f32 * self.scale).floor() as i32;
        let y_max = (bbox.y_max as f32 * self.scale).ceil() as i32;
        Some(PixelBox {
            x_min,
            y_max,
            width: (x_max - x_min).max(0) as u32,
            height: (y_max - y_min).max(0) as u32,
        })
    }
}

fn parse_face(data: &[u8]) -> Result<Face<'_>> {
    Face::parse(data, 0).map_err(|err| FontError::UnsupportedFormat(err.to_string()))
}

fn raster_error(glyph: u16, reason: impl Into<String>) -> FontError {
    FontError::RasterizationFailed {
        glyph,
        reason: reason.into(),
    }
}

impl GlyphEngine for OutlineRasterizer {
    fn glyph_index(&self, code_point: u32) -> u16 {
        let Ok(face) = self.face() else {
            return 0;
        };
        char::from_u32(code_point)
            .and_then(|c| face.glyph_index(c))
            .map_or(0, |g| g.0)
    }

    fn load_glyph(&mut self, glyph: u16) -> Result<GlyphMetrics> {
        let face = self.face()?;
        let id = GlyphId(glyph);
        let advance = face
            .glyph_hor_advance(id)
            .ok_or_else(|| raster_error(glyph, "no horizontal metrics"))?;
        let advance = (advance as f32 * self.scale).round() as i32;

        // Glyphs without outline (space) have no ink
        let metrics = match self.pixel_box(&face, id) {
            Some(pbox) if pbox.width > 0 && pbox.height > 0 => GlyphMetrics {
                width: pbox.width,
                height: pbox.height,
                bearing_x: pbox.x_min,
                bearing_y: pbox.y_max,
                advance,
            },
            _ => GlyphMetrics {
                advance,
                ..GlyphMetrics::default()
            },
        };
        Ok(metrics)
    }

    fn render_glyph(&mut self, glyph: u16, buffer: &mut [u8], stride: usize) -> Result<()> {
        let face = self.face()?;
        let id = GlyphId(glyph);
        let Some(pbox) = self.pixel_box(&face, id).filter(|b| b.width > 0 && b.height > 0) else {
            return Ok(());
        };
        let (width, height) = (pbox.width as usize, pbox.height as usize);
        if stride < width || buffer.len() < (height - 1) * stride + width {
            return Err(raster_error(glyph, "destination buffer too small"));
        }

        let mut builder = PathBuilder::new(self.scale, pbox.x_min as f32, pbox.y_max as f32);
        face.outline_glyph(id, &mut builder)
            .ok_or_else(|| raster_error(glyph, "no outline"))?;
        let path = builder
            .finish()
            .ok_or_else(|| raster_error(glyph, "empty outline"))?;

        let mut mask = tiny_skia::Mask::new(pbox.width, pbox.height)
            .ok_or_else(|| raster_error(glyph, "invalid bitmap size"))?;
        mask.fill_path(
            &path,
            tiny_skia::FillRule::Winding,
            true,
            tiny_skia::Transform::identity(),
        );

        for (row, src) in mask.data().chunks_exact(width).enumerate() {
            let start = row * stride;
            buffer[start..start + width].copy_from_slice(src);
        }
        Ok(())
    }

    fn kerning(&self, left: u16, right: u16) -> i32 {
        self.kerning_row(left, &[right]).first().copied().unwrap_or(0)
    }

    fn kerning_row(&self, left: u16, rights: &[u16]) -> Vec<i32> {
        let kern = self.face().ok().and_then(|face| face.tables().kern);
        let Some(kern) = kern else {
            return vec![0; rights.len()];
        };
        rights
            .iter()
            .map(|&right| {
                // Later subtables override earlier ones
                let value = kern
                    .subtables
                    .into_iter()
                    .filter(|st| st.horizontal && !st.has_cross_stream)
                    .filter_map(|st| st.glyphs_kerning(GlyphId(left), GlyphId(right)))
                    .last();
                value.map_or(0, |v| (v as f32 * self.scale).round() as i32)
            })
            .collect()
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }
}

/// Path builder that converts ttf-parser outlines to tiny-skia paths
/// positioned inside the glyph's pixel box
struct PathBuilder {
    builder: tiny_skia::PathBuilder,
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl PathBuilder {
    fn new(scale: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            builder: tiny_skia::PathBuilder::new(),
            scale,
            offset_x,
            offset_y,
        }
    }

    fn transform_x(&self, x: f32) -> f32 {
        x * self.scale - self.offset_x
    }

    fn transform_y(&self, y: f32) -> f32 {
        self.offset_y - y * self.scale // Flip Y axis
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for PathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.transform_x(x), self.transform_y(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.transform_x(x), self.transform_y(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(
            self.transform_x(x1), self.transform_y(y1),
            self.transform_x(x), self.transform_y(y),
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.transform_x(x1), self.transform_y(y1),
            self.transform_x(x2), self.transform_y(y2),
            self.transform_x(x), self.transform_y(y),
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    #[test]
    fn test_rejects_non_font_data() {
        let err = OutlineRasterizer::open(Arc::from(vec![0u8; 64]), 16.0).unwrap_err();
        assert!(matches!(err, FontError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_system_font_glyph() {
        // Only runs where the DejaVu fonts are installed
        let Ok(data) = std::fs::read(SYSTEM_FONT) else {
            return;
        };
        let mut engine = OutlineRasterizer::open(Arc::from(data), 32.0).unwrap();
        let a = engine.glyph_index('A' as u32);
        assert_ne!(a, 0);

        let metrics = engine.load_glyph(a).unwrap();
        assert!(metrics.width > 0 && metrics.height > 0);
        assert!(metrics.advance > 0);

        let stride = metrics.width as usize;
        let mut buffer = vec![0u8; stride * metrics.height as usize];
        engine.render_glyph(a, &mut buffer, stride).unwrap();
        assert!(buffer.iter().any(|&a| a > 0));

        let space = engine.load_glyph(engine.glyph_index(' ' as u32)).unwrap();
        assert_eq!((space.width, space.height), (0, 0));
        assert!(space.advance > 0);
    }

    #[test]
    fn test_system_font_kerning_row_matches_pairs() {
        let Ok(data) = std::fs::read(SYSTEM_FONT) else {
            return;
        };
        let engine = OutlineRasterizer::open(Arc::from(data), 32.0).unwrap();
        let a = engine.glyph_index('A' as u32);
        let rights: Vec<u16> = ['V', 'W', 'T', 'o']
            .into_iter()
            .map(|c| engine.glyph_index(c as u32))
            .collect();

        let row = engine.kerning_row(a, &rights);
        assert_eq!(row.len(), rights.len());
        for (&right, value) in rights.iter().zip(&row) {
            assert_eq!(engine.kerning(a, right), *value);
        }
    }
}
