//! GPU texture and draw interface

use std::collections::HashMap;

use tiny_skia::{Color, Mask, Rect};

use crate::{FontError, Result};

/// Handle of a texture owned by a [`GpuContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// One vertex of a textured quad
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    /// Normalized texture x
    pub u: f32,
    /// Normalized texture y
    pub v: f32,
    /// Screen x
    pub x: f32,
    /// Screen y
    pub y: f32,
}

/// Texture upload and drawing backend.
///
/// All calls happen on the thread owning the context; implementations do
/// not need to be thread-safe.
pub trait GpuContext {
    /// Create a zero-filled 8-bit alpha texture
    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureId>;

    /// Copy `width * height` alpha bytes into the texture at `(x, y)`
    fn upload_alpha(&mut self, texture: TextureId, x: u32, y: u32, width: u32, height: u32, pixels: &[u8]);

    /// Draw quads (four vertices each) sampling `texture`, tinted with `color`
    fn draw_quads(&mut self, texture: TextureId, color: Color, vertices: &[Vertex]);

    /// Fill an untextured rectangle
    fn fill_rect(&mut self, color: Color, rect: Rect);

    /// Release a texture
    fn destroy_texture(&mut self, texture: TextureId);
}

/// A recorded draw operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// Textured quads
    Quads {
        texture: TextureId,
        color: Color,
        vertices: Vec<Vertex>,
    },
    /// Solid rectangle
    Rect { color: Color, rect: Rect },
}

/// CPU-side [`GpuContext`] keeping textures as alpha masks and recording
/// draw calls instead of issuing them
#[derive(Default)]
pub struct SoftwareGpu {
    textures: HashMap<TextureId, Mask>,
    next_id: u32,
    /// Draw calls in submission order
    pub calls: Vec<DrawCall>,
}

impl std::fmt::Debug for SoftwareGpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareGpu")
            .field("textures", &self.textures.len())
            .field("calls", &self.calls.len())
            .finish()
    }
}

impl SoftwareGpu {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a live texture
    pub fn texture(&self, id: TextureId) -> Option<&Mask> {
        self.textures.get(&id)
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// All recorded quads flattened in submission order
    pub fn quads(&self) -> impl Iterator<Item = &[Vertex]> + '_ {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Quads { vertices, .. } => Some(vertices.chunks_exact(4)),
                DrawCall::Rect { .. } => None,
            })
            .flatten()
    }

    /// Forget recorded draw calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl GpuContext for SoftwareGpu {
    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureId> {
        let mask = Mask::new(width, height).ok_or_else(|| {
            FontError::TextureCreation(format!("invalid texture size {width}x{height}"))
        })?;
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(id, mask);
        Ok(id)
    }

    fn upload_alpha(&mut self, texture: TextureId, x: u32, y: u32, width: u32, height: u32, pixels: &[u8]) {
        let Some(mask) = self.textures.get_mut(&texture) else {
            tracing::warn!(?texture, "upload to unknown texture");
            return;
        };
        if pixels.len() < width as usize * height as usize {
            tracing::warn!(?texture, width, height, len = pixels.len(), "short pixel upload");
            return;
        }
        let tex_width = mask.width() as usize;
        let tex_height = mask.height() as usize;
        let data = mask.data_mut();
        for row in 0..height as usize {
            let dst_y = y as usize + row;
            if dst_y >= tex_height {
                break;
            }
            let src = &pixels[row * width as usize..][..width as usize];
            let dst_x = x as usize;
            let count = (width as usize).min(tex_width.saturating_sub(dst_x));
            let start = dst_y * tex_width + dst_x;
            data[start..start + count].copy_from_slice(&src[..count]);
        }
    }

    fn draw_quads(&mut self, texture: TextureId, color: Color, vertices: &[Vertex]) {
        self.calls.push(DrawCall::Quads {
            texture,
            color,
            vertices: vertices.to_vec(),
        });
    }

    fn fill_rect(&mut self, color: Color, rect: Rect) {
        self.calls.push(DrawCall::Rect { color, rect });
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }
}
