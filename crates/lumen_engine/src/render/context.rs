//! Explicitly owned render state bundle
//!
//! Everything the draw path needs — backend, resource registry, shader
//! assembler, settings, uniform-name tables — lives in one context value
//! passed by `&mut`. There is no global registry; tests build as many
//! independent contexts as they need.

use crate::render::backend::RenderBackend;
use crate::render::headless::HeadlessBackend;
use crate::render::light::MaxLights;
use crate::render::light_uniforms::LightUniformNames;
use crate::render::shader_assembler::ShaderAssembler;
use crate::resources::{ResourceError, ResourceManager};
use crate::settings::{keys, Settings};

/// Render-state bundle shared by every draw-path component
pub struct RenderContext {
    /// The graphics backend
    pub backend: Box<dyn RenderBackend>,
    /// Named resource registry
    pub resources: ResourceManager,
    /// Shader permutation cache
    pub assembler: ShaderAssembler,
    /// Configuration store
    pub settings: Settings,
    /// Pre-built light uniform names
    pub light_uniforms: LightUniformNames,
    /// Configured per-type light maxima
    pub max_lights: MaxLights,
    /// Shadow map edge length in texels
    pub shadow_resolution: u32,
    /// Attenuated-intensity light-cull threshold
    pub cull_threshold: f32,
    /// Validate programs before each draw
    pub validate_shaders: bool,
}

impl RenderContext {
    /// Build a context over a backend, reading tunables from settings
    pub fn new(
        mut backend: Box<dyn RenderBackend>,
        settings: Settings,
    ) -> Result<Self, ResourceError> {
        let max_lights = MaxLights::from_settings(&settings);
        let shadow_resolution = settings.get_u32(keys::SHADOW_MAP_RESOLUTION, 512);
        let cull_threshold = settings.get_f32(keys::LIGHT_CULL_THRESHOLD, 0.001);
        let validate_shaders = settings.get_bool(keys::VALIDATE_SHADERS, false);

        let resources = ResourceManager::new(backend.as_mut())?;
        let assembler = ShaderAssembler::new(max_lights, validate_shaders);
        let light_uniforms =
            LightUniformNames::new(max_lights.point, max_lights.directional, max_lights.spot);

        log::info!(
            "render context up: {} point / {} directional / {} spot lights, {}px shadows",
            max_lights.point,
            max_lights.directional,
            max_lights.spot,
            shadow_resolution
        );

        Ok(Self {
            backend,
            resources,
            assembler,
            settings,
            light_uniforms,
            max_lights,
            shadow_resolution,
            cull_threshold,
            validate_shaders,
        })
    }

    /// Context over the recording backend with default settings
    pub fn headless() -> Result<Self, ResourceError> {
        Self::new(Box::new(HeadlessBackend::new()), Settings::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingValue;

    #[test]
    fn test_headless_context_builds_sentinels() {
        let ctx = RenderContext::headless().unwrap();
        assert!(ctx.resources.shaders.exists("lumen_error_shader"));
        assert_eq!(ctx.max_lights.point, 8);
    }

    #[test]
    fn test_settings_override_maxima() {
        let mut settings = Settings::new();
        settings.set(keys::MAX_POINT_LIGHTS, SettingValue::Int(4));
        settings.set(keys::SHADOW_MAP_RESOLUTION, SettingValue::Int(256));

        let ctx = RenderContext::new(Box::new(HeadlessBackend::new()), settings).unwrap();
        assert_eq!(ctx.max_lights.point, 4);
        assert_eq!(ctx.shadow_resolution, 256);
        assert_eq!(ctx.light_uniforms.point.len(), 4);
    }
}
