//! Texture resources

use crate::render::backend::TextureId;
use crate::resources::resource::Resource;

/// Pixel storage formats the render core needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA color
    Rgba8,
    /// 16-bit single-face depth (directional/spot shadow maps)
    Depth16,
    /// 16-bit cubemap depth (point light shadow maps)
    DepthCube16,
}

/// A GPU texture tracked by name
#[derive(Debug)]
pub struct Texture {
    name: String,
    id: TextureId,
    size: (u32, u32),
    format: TextureFormat,
}

impl Texture {
    /// Wrap a backend texture as a named resource
    pub fn new(name: impl Into<String>, id: TextureId, size: (u32, u32), format: TextureFormat) -> Self {
        Self {
            name: name.into(),
            id,
            size,
            format,
        }
    }

    /// Backend handle
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Width and height in texels
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Storage format
    pub fn format(&self) -> TextureFormat {
        self.format
    }
}

impl Resource for Texture {
    fn name(&self) -> &str {
        &self.name
    }
}
