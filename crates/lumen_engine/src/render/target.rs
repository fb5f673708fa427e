//! Off-screen render targets
//!
//! A target pairs a backend framebuffer handle with the texture that
//! backs it. Release is explicit (`destroy` takes the backend) rather
//! than RAII: the owner decides when the GPU-side objects go away.

use crate::render::backend::{RenderBackend, RenderError, TargetId};
use crate::resources::texture::{Texture, TextureFormat};
use std::sync::Arc;

/// An owned off-screen render target and its backing texture
#[derive(Debug)]
pub struct RenderTarget {
    target: TargetId,
    texture: Arc<Texture>,
}

impl RenderTarget {
    /// Allocate a target of the given size and attachment format
    pub fn create(
        name: impl Into<String>,
        backend: &mut dyn RenderBackend,
        size: (u32, u32),
        format: TextureFormat,
    ) -> Result<Self, RenderError> {
        let (target, texture_id) = backend.create_render_target(size, format)?;
        Ok(Self {
            target,
            texture: Arc::new(Texture::new(name, texture_id, size, format)),
        })
    }

    /// Backend target handle
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Backing texture (shared so samplers can reference it)
    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    /// Release the backend objects
    pub fn destroy(self, backend: &mut dyn RenderBackend) {
        backend.destroy_render_target(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessBackend;

    #[test]
    fn test_create_and_destroy() {
        let mut backend = HeadlessBackend::new();
        let target = RenderTarget::create(
            "shadow",
            &mut backend,
            (512, 512),
            TextureFormat::Depth16,
        )
        .unwrap();
        let id = target.target();
        assert!(backend.target_exists(id));

        target.destroy(&mut backend);
        assert!(!backend.target_exists(id));
    }

    #[test]
    fn test_allocation_failure_propagates() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next_target = true;
        let result = RenderTarget::create(
            "shadow",
            &mut backend,
            (512, 512),
            TextureFormat::DepthCube16,
        );
        assert!(result.is_err());
    }
}
