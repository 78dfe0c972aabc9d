//! Renderer configuration

/// Default atlas texture edge length in pixels
pub const DEFAULT_ATLAS_SIZE: u32 = 1024;

/// Default number of quads buffered before a draw call is issued
pub const DEFAULT_BATCH_QUADS: usize = 512;

/// Per font-size renderer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Atlas texture width in pixels
    pub atlas_width: u32,
    /// Atlas texture height in pixels
    pub atlas_height: u32,
    /// Quads per vertex batch (flushed to the GPU when full)
    pub batch_quads: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            atlas_width: DEFAULT_ATLAS_SIZE,
            atlas_height: DEFAULT_ATLAS_SIZE,
            batch_quads: DEFAULT_BATCH_QUADS,
        }
    }
}

impl RendererConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the atlas texture size
    pub fn atlas_size(mut self, width: u32, height: u32) -> Self {
        self.atlas_width = width;
        self.atlas_height = height;
        self
    }

    /// Set the number of quads per batch (at least one)
    pub fn batch_quads(mut self, quads: usize) -> Self {
        self.batch_quads = quads.max(1);
        self
    }
}
