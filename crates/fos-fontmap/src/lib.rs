//! fOS Fontmap - TrueType glyph atlas renderer
//!
//! This crate turns TrueType font files into GPU-resident glyph bitmaps:
//! - Table directory, `name` and `kern` parsing
//! - Paged glyph cache keyed by Unicode code point
//! - Shelf-packing alpha texture atlas with rebuild on overflow
//! - Kerning-aware measurement, line layout and quad batching
//!
//! A font file is loaded once as a [`FontFile`] and shared by every
//! [`FontRenderer`] created for it, one per pixel size.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fos_fontmap::{FontFile, RendererConfig, SoftwareGpu, Color};
//!
//! let font = Arc::new(FontFile::open("DejaVuSans.ttf")?);
//! let mut gpu = SoftwareGpu::new();
//! let mut renderer = font.create_renderer(16.0, &mut gpu, RendererConfig::default())?;
//! let width = renderer.measure_width("Hello");
//! {
//!     let mut batch = renderer.begin_batch(&mut gpu, Color::BLACK);
//!     batch.draw_text(10, 10, "Hello");
//! }
//! renderer.destroy(&mut gpu);
//! ```

pub mod config;
pub mod font;
pub mod layout;
pub mod paged;
pub mod render;
mod renderer;

pub use config::RendererConfig;
pub use font::{FontFile, FontMetadata, KerningTable, NameId};
pub use layout::{GlyphSource, HAlignment, LineInfo};
pub use paged::PagedArray;
pub use render::{
    DrawCall, FontMetrics, Glyph, GlyphAtlas, GlyphCache, GlyphEngine, GlyphMetrics, GpuContext,
    OutlineRasterizer, Placement, SoftwareGpu, TexRect, TextureId, Vertex,
};
pub use renderer::{DrawBatch, FontRenderer, TextDecoration};
pub use tiny_skia::Color;

/// Font loading and rendering error types
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("Required table not found: {0}")]
    TableNotFound(String),

    #[error("Malformed font: {0}")]
    MalformedFont(String),

    #[error("Unsupported font format: {0}")]
    UnsupportedFormat(String),

    #[error("Rasterization of glyph {glyph} failed: {reason}")]
    RasterizationFailed { glyph: u16, reason: String },

    #[error("Texture creation failed: {0}")]
    TextureCreation(String),

    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FontError>;
