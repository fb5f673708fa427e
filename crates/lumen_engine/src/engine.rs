//! The frame loop
//!
//! The engine owns the scene, the renderer, and the render context, and
//! drives fixed-update, update, and draw strictly in sequence on one
//! thread. Game logic hooks in through closures handed to `frame`; the
//! headless driver uses `run_frames`.

use crate::foundation::time::{FixedStep, Timer};
use crate::render::{FrameStats, RenderContext, Renderer};
use crate::resources::ResourceError;
use crate::scene::Scene;
use crate::settings::{Settings, SettingsError};
use serde::Deserialize;
use thiserror::Error;

/// Engine startup errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required built-in resource failed to build
    #[error("engine startup failed: {0}")]
    Startup(#[from] ResourceError),

    /// The configuration file failed to parse
    #[error("engine configuration failed to parse: {0}")]
    Config(String),
}

/// Engine loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed-update step length in seconds
    pub fixed_step: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fixed_step: 1.0 / 60.0 }
    }
}

impl EngineConfig {
    /// Parse the `[engine]` section of a TOML config document
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct Document {
            engine: EngineConfig,
        }
        let doc: Document =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        Ok(doc.engine)
    }
}

/// The engine: scene, renderer, context, and the frame clock
pub struct Engine {
    /// The scene graph
    pub scene: Scene,
    /// The renderer
    pub renderer: Renderer,
    /// Render state bundle
    pub context: RenderContext,
    timer: Timer,
    fixed: FixedStep,
    frame_count: u64,
}

impl Engine {
    /// Build an engine over a prepared render context
    pub fn new(context: RenderContext, config: &EngineConfig) -> Self {
        let renderer = Renderer::new(&context);
        log::info!("engine up, fixed step {:.4}s", config.fixed_step);
        Self {
            scene: Scene::new(),
            renderer,
            context,
            timer: Timer::new(),
            fixed: FixedStep::new(config.fixed_step),
            frame_count: 0,
        }
    }

    /// Headless engine with default settings, for tests and demos
    pub fn headless() -> Result<Self, EngineError> {
        let context = RenderContext::headless()?;
        Ok(Self::new(context, &EngineConfig::default()))
    }

    /// Headless engine configured from TOML settings text
    pub fn headless_with_settings(toml_text: &str) -> Result<Self, EngineError> {
        let settings = Settings::from_toml_str(toml_text)
            .map_err(|e: SettingsError| EngineError::Config(e.to_string()))?;
        let context = RenderContext::new(
            Box::new(crate::render::HeadlessBackend::new()),
            settings,
        )?;
        Ok(Self::new(context, &EngineConfig::default()))
    }

    /// Frames drawn so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Run one frame: fixed updates, one variable update, one draw
    ///
    /// `fixed_update` runs zero or more times with the fixed step;
    /// `update` runs once with the frame delta.
    pub fn frame(
        &mut self,
        mut fixed_update: impl FnMut(&mut Scene, f32),
        mut update: impl FnMut(&mut Scene, f32),
    ) -> FrameStats {
        let delta = self.timer.delta_time();

        let steps = self.fixed.advance(delta);
        for _ in 0..steps {
            fixed_update(&mut self.scene, self.fixed.step());
        }
        update(&mut self.scene, delta);

        let stats = self.renderer.draw_frame(&self.scene, &mut self.context);
        self.frame_count += 1;
        log::trace!(
            "frame {}: {} draws, {} shadow maps",
            self.frame_count,
            stats.draw_calls,
            stats.shadow_maps_drawn
        );
        stats
    }

    /// Drive a fixed number of frames with no game logic
    pub fn run_frames(&mut self, frames: u32) -> FrameStats {
        let mut total = FrameStats::default();
        for _ in 0..frames {
            let stats = self.frame(|_, _| {}, |_, _| {});
            total.draw_calls += stats.draw_calls;
            total.shadow_maps_drawn += stats.shadow_maps_drawn;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::material::Material;
    use crate::resources::mesh::Mesh;
    use crate::resources::model::Model;
    use crate::render::Drawable;

    #[test]
    fn test_config_from_toml() {
        let config = EngineConfig::from_toml_str("[engine]\nfixed_step = 0.01\n").unwrap();
        assert!((config.fixed_step - 0.01).abs() < 1e-9);

        let defaulted = EngineConfig::from_toml_str("").unwrap();
        assert!((defaulted.fixed_step - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_frames_counts() {
        let mut engine = Engine::headless().unwrap();
        let layer = engine.renderer.create_layer("main");

        let object = engine.scene.create_object("cube");
        let mesh = engine
            .context
            .resources
            .get_mesh("cube", || Ok(Mesh::cube("cube", 1.0)));
        let material = engine
            .context
            .resources
            .get_material("m", || Ok(Material::new("m").with_phong()));
        let mut drawable = Drawable::new(object, "cube");
        drawable.set_model(Model::new(&mesh, material));
        let key = engine.renderer.add_drawable(drawable);
        engine.renderer.add_drawable_to_layer(layer, key);

        let total = engine.run_frames(3);
        assert_eq!(total.draw_calls, 3);
        assert_eq!(engine.frame_count(), 3);
    }

    #[test]
    fn test_update_hooks_run() {
        let mut engine = Engine::headless().unwrap();
        let mut updates = 0;
        engine.frame(|_, _| {}, |_, _| updates += 1);
        assert_eq!(updates, 1);
    }
}
