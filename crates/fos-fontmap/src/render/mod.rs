//! Glyph rendering module

mod atlas;
mod engine;
mod glyph;
mod gpu;
mod rasterizer;

#[cfg(test)]
pub(crate) mod mock;

pub use atlas::{GlyphAtlas, Row};
pub use engine::{FontMetrics, GlyphEngine, GlyphMetrics};
pub use glyph::{Glyph, GlyphCache, Placement, TexRect};
pub use gpu::{DrawCall, GpuContext, SoftwareGpu, TextureId, Vertex};
pub use rasterizer::OutlineRasterizer;
