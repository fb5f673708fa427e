//! Frame orchestration over the component arenas
//!
//! The renderer owns every drawable, light, layer, and camera in slotmap
//! arenas; everything else refers to them by generational key. A frame
//! runs shadow passes for every casting light first, then the layers in
//! driver order — shadow maps must be complete before anything samples
//! them.

use crate::render::camera::{Camera, CameraKey, ViewInfo};
use crate::render::context::RenderContext;
use crate::render::drawable::{Drawable, DrawableKey};
use crate::render::layer::{Layer, LayerKey};
use crate::render::light::{LightContainer, LightKey, LightSource};
use crate::scene::Scene;
use slotmap::SlotMap;
use std::collections::HashSet;

/// Per-frame counters reported by [`Renderer::draw_frame`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Shadow maps that actually recorded geometry
    pub shadow_maps_drawn: u32,
    /// Drawable draw calls issued across all layers
    pub draw_calls: u32,
}

/// Arena-backed renderer and frame driver
pub struct Renderer {
    drawables: SlotMap<DrawableKey, Drawable>,
    lights: SlotMap<LightKey, LightSource>,
    layers: SlotMap<LayerKey, Layer>,
    cameras: SlotMap<CameraKey, Camera>,
    /// Driver-determined layer draw order
    layer_order: Vec<LayerKey>,
    default_camera: Option<CameraKey>,
    light_batch: LightContainer,
}

impl Renderer {
    /// Create an empty renderer sized from the context's light maxima
    pub fn new(ctx: &RenderContext) -> Self {
        Self {
            drawables: SlotMap::with_key(),
            lights: SlotMap::with_key(),
            layers: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            layer_order: Vec::new(),
            default_camera: None,
            light_batch: LightContainer::new(ctx.max_lights),
        }
    }

    /// Register a drawable
    pub fn add_drawable(&mut self, drawable: Drawable) -> DrawableKey {
        self.drawables.insert(drawable)
    }

    /// Borrow a drawable
    pub fn drawable(&self, key: DrawableKey) -> Option<&Drawable> {
        self.drawables.get(key)
    }

    /// Mutably borrow a drawable
    pub fn drawable_mut(&mut self, key: DrawableKey) -> Option<&mut Drawable> {
        self.drawables.get_mut(key)
    }

    /// Remove a drawable, unbinding it from every layer holding it
    pub fn remove_drawable(&mut self, key: DrawableKey) {
        let Some(drawable) = self.drawables.remove(key) else {
            return;
        };
        for layer_key in drawable.bound_layers() {
            if let Some(layer) = self.layers.get_mut(*layer_key) {
                layer.remove_drawable(key);
            }
        }
    }

    /// Register a light
    pub fn add_light(&mut self, light: LightSource) -> LightKey {
        self.lights.insert(light)
    }

    /// Borrow a light
    pub fn light(&self, key: LightKey) -> Option<&LightSource> {
        self.lights.get(key)
    }

    /// Mutably borrow a light
    pub fn light_mut(&mut self, key: LightKey) -> Option<&mut LightSource> {
        self.lights.get_mut(key)
    }

    /// Remove a light, releasing any shadow map it owns
    pub fn remove_light(&mut self, key: LightKey, ctx: &mut RenderContext) {
        if let Some(mut light) = self.lights.remove(key) {
            light.set_cast_shadows(false, ctx.backend.as_mut(), ctx.shadow_resolution);
        }
    }

    /// Register a camera
    pub fn add_camera(&mut self, camera: Camera) -> CameraKey {
        self.cameras.insert(camera)
    }

    /// Mutably borrow a camera
    pub fn camera_mut(&mut self, key: CameraKey) -> Option<&mut Camera> {
        self.cameras.get_mut(key)
    }

    /// The process default camera, created on first use
    pub fn default_camera(&mut self) -> CameraKey {
        if let Some(key) = self.default_camera {
            if self.cameras.contains_key(key) {
                return key;
            }
        }
        let key = self.cameras.insert(Camera::default());
        self.default_camera = Some(key);
        key
    }

    /// Create a layer at the end of the draw order
    pub fn create_layer(&mut self, id: impl Into<String>) -> LayerKey {
        let key = self.layers.insert(Layer::new(id));
        self.layer_order.push(key);
        key
    }

    /// Borrow a layer
    pub fn layer(&self, key: LayerKey) -> Option<&Layer> {
        self.layers.get(key)
    }

    /// Mutably borrow a layer
    pub fn layer_mut(&mut self, key: LayerKey) -> Option<&mut Layer> {
        self.layers.get_mut(key)
    }

    /// Remove a layer, its target, and every binding to or from it
    pub fn remove_layer(&mut self, key: LayerKey, ctx: &mut RenderContext) {
        let Some(mut layer) = self.layers.remove(key) else {
            return;
        };
        if let Some(target) = layer.take_target() {
            target.destroy(ctx.backend.as_mut());
        }
        for drawable_key in layer.draw_list().iter() {
            if let Some(drawable) = self.drawables.get_mut(drawable_key) {
                drawable.unbind_layer(key);
            }
        }
        for other in self.layers.values_mut() {
            other.unbind_layer(key);
        }
        self.layer_order.retain(|k| *k != key);
    }

    /// Bind a drawable into a layer's draw list (both directions)
    pub fn add_drawable_to_layer(&mut self, layer: LayerKey, drawable: DrawableKey) {
        let (Some(layer_ref), Some(drawable_ref)) =
            (self.layers.get_mut(layer), self.drawables.get_mut(drawable))
        else {
            log::warn!("stale key in add_drawable_to_layer, ignoring");
            return;
        };
        layer_ref.add_drawable(drawable);
        drawable_ref.bind_layer(layer);
    }

    /// Remove a drawable from one layer (both directions)
    pub fn remove_drawable_from_layer(&mut self, layer: LayerKey, drawable: DrawableKey) {
        if let Some(layer_ref) = self.layers.get_mut(layer) {
            layer_ref.remove_drawable(drawable);
        }
        if let Some(drawable_ref) = self.drawables.get_mut(drawable) {
            drawable_ref.unbind_layer(layer);
        }
    }

    /// Draw one frame: shadow passes first, then layers in driver order
    pub fn draw_frame(&mut self, scene: &Scene, ctx: &mut RenderContext) -> FrameStats {
        let mut stats = FrameStats::default();

        let light_keys: Vec<LightKey> = self.lights.keys().collect();
        for key in light_keys {
            let Self {
                lights, drawables, ..
            } = self;
            let Some(light) = lights.get_mut(key) else {
                continue;
            };
            if !light.casts_shadows() || !scene.is_active(light.object()) {
                continue;
            }
            if light.draw_shadow_map(
                scene,
                drawables,
                ctx.backend.as_mut(),
                &mut ctx.assembler,
                &mut ctx.resources,
                ctx.cull_threshold,
            ) {
                stats.shadow_maps_drawn += 1;
            }
        }

        for key in self.layer_order.clone() {
            stats.draw_calls += self.draw_layer_base(key, scene, ctx);
        }

        stats
    }

    /// Run one layer's pass; returns the number of draw calls issued
    ///
    /// Inactive layers no-op. A layer with no camera adopts the default
    /// camera permanently. Bound layers' draw lists are traversed before
    /// the layer's own, each in insertion order; stale keys are marked
    /// and swept after the pass.
    pub fn draw_layer_base(
        &mut self,
        key: LayerKey,
        scene: &Scene,
        ctx: &mut RenderContext,
    ) -> u32 {
        let default_camera = self.default_camera();
        {
            let Some(layer) = self.layers.get_mut(key) else {
                return 0;
            };
            if !layer.is_active() {
                return 0;
            }
            layer.adopt_camera(default_camera);
        }

        // Gather the draw order up front so traversal never aliases the
        // arenas it mutates.
        let (camera_key, target, order, stale_bound) = {
            let Some(layer) = self.layers.get(key) else {
                return 0;
            };
            let camera_key = layer.camera().unwrap_or(default_camera);
            let target = layer.target().map(|t| t.target());

            let mut order: Vec<(LayerKey, DrawableKey)> = Vec::new();
            let mut stale_bound = false;
            for bound in layer.bound_layers().iter() {
                match self.layers.get(bound) {
                    Some(other) => {
                        order.extend(other.draw_list().iter().map(|d| (bound, d)));
                    }
                    None => stale_bound = true,
                }
            }
            order.extend(layer.draw_list().iter().map(|d| (key, d)));
            (camera_key, target, order, stale_bound)
        };

        let camera = self
            .cameras
            .get(camera_key)
            .or_else(|| self.cameras.get(default_camera));
        let Some(camera) = camera else {
            return 0;
        };
        let view = ViewInfo::for_camera(camera, scene);

        if let Some(target) = target {
            if !ctx.backend.bind_render_target(target) {
                log::warn!("layer target handle is stale, drawing to default framebuffer");
                ctx.backend.unbind_render_target();
            }
        } else {
            ctx.backend.unbind_render_target();
        }
        ctx.backend.set_depth_test(true);
        ctx.backend.set_face_cull(true);

        let mut draws = 0;
        let mut stale_lists: HashSet<LayerKey> = HashSet::new();
        {
            let Self {
                drawables,
                lights,
                light_batch,
                ..
            } = self;

            for (owner, drawable_key) in order {
                let Some(drawable) = drawables.get(drawable_key) else {
                    stale_lists.insert(owner);
                    continue;
                };

                // Per-drawable light eligibility: render mask and range cull.
                let position = scene.global_position(drawable.object());
                let group_bit = 1u32 << drawable.render_group();
                light_batch.clear();
                for (light_key, light) in lights.iter() {
                    if !scene.is_active(light.object()) || light.mask() & group_bit == 0 {
                        continue;
                    }
                    let light_position = scene.global_position(light.object());
                    if light.touches(light_position, position, ctx.cull_threshold) {
                        light_batch.push(light.light_type(), light_key);
                    }
                }

                let Some(drawable) = drawables.get_mut(drawable_key) else {
                    continue;
                };
                if drawable.draw(
                    scene,
                    &view,
                    light_batch,
                    lights,
                    ctx.backend.as_mut(),
                    &mut ctx.assembler,
                    &mut ctx.resources,
                    &ctx.light_uniforms,
                    ctx.validate_shaders,
                ) {
                    draws += 1;
                }
            }
        }

        if target.is_some() {
            ctx.backend.unbind_render_target();
        }

        // Apply deferred marks, then sweep. Marked bound layers are
        // swept here too: an inactive bound layer never runs a pass of
        // its own, so this is its only chance to compact.
        let mut to_sweep = stale_lists;
        for owner in &to_sweep {
            if let Some(layer) = self.layers.get_mut(*owner) {
                layer.draw_list_mut().mark();
            }
        }
        to_sweep.insert(key);
        let live_layers: HashSet<LayerKey> = self.layers.keys().collect();
        let Self {
            layers, drawables, ..
        } = self;
        for owner in to_sweep {
            if let Some(layer) = layers.get_mut(owner) {
                if owner == key && stale_bound {
                    layer.bound_layers_mut().mark();
                }
                layer.sweep_removed(
                    |d| drawables.contains_key(d),
                    |l| live_layers.contains(&l),
                );
            }
        }

        draws
    }

    /// Number of registered drawables
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Number of registered lights
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    #[cfg(test)]
    fn evict_drawable_for_test(&mut self, key: DrawableKey) {
        self.drawables.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Color;
    use crate::foundation::math::Vec3;
    use crate::render::light::LightType;
    use crate::resources::material::Material;
    use crate::resources::mesh::Mesh;
    use crate::resources::model::Model;

    fn setup() -> (RenderContext, Renderer, Scene) {
        let ctx = RenderContext::headless().unwrap();
        let renderer = Renderer::new(&ctx);
        (ctx, renderer, Scene::new())
    }

    fn cube_drawable(
        ctx: &mut RenderContext,
        scene: &mut Scene,
        id: &str,
    ) -> Drawable {
        let object = scene.create_object(id);
        let mesh = ctx.resources.get_mesh("cube", || Ok(Mesh::cube("cube", 1.0)));
        let material = ctx
            .resources
            .get_material("phong", || Ok(Material::new("phong").with_phong()));
        let mut drawable = Drawable::new(object, id);
        drawable.set_model(Model::new(&mesh, material));
        drawable
    }

    #[test]
    fn test_frame_draws_layer_contents() {
        let (mut ctx, mut renderer, mut scene) = setup();
        let layer = renderer.create_layer("main");
        let drawable = cube_drawable(&mut ctx, &mut scene, "cube");
        let key = renderer.add_drawable(drawable);
        renderer.add_drawable_to_layer(layer, key);

        let stats = renderer.draw_frame(&scene, &mut ctx);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.shadow_maps_drawn, 0);
    }

    #[test]
    fn test_inactive_layer_draws_nothing() {
        let (mut ctx, mut renderer, mut scene) = setup();
        let layer = renderer.create_layer("main");
        let drawable = cube_drawable(&mut ctx, &mut scene, "cube");
        let key = renderer.add_drawable(drawable);
        renderer.add_drawable_to_layer(layer, key);
        renderer.layer_mut(layer).unwrap().set_active(false);

        let stats = renderer.draw_frame(&scene, &mut ctx);
        assert_eq!(stats.draw_calls, 0);
    }

    #[test]
    fn test_shadow_pass_runs_before_layers() {
        let (mut ctx, mut renderer, mut scene) = setup();
        let layer = renderer.create_layer("main");
        let drawable = cube_drawable(&mut ctx, &mut scene, "cube");
        let key = renderer.add_drawable(drawable);
        renderer.add_drawable_to_layer(layer, key);

        let light_obj = scene.create_object("light");
        scene.transform_mut(light_obj).unwrap().position = Vec3::new(0.0, 2.0, 0.0);
        let mut light = LightSource::new(light_obj, "sun", LightType::Point);
        light.set_intensity_all(Color::WHITE);
        light.set_attenuation(1.0, 4.5, 75.0);
        light.set_cast_shadows(true, ctx.backend.as_mut(), ctx.shadow_resolution);
        renderer.add_light(light);

        let stats = renderer.draw_frame(&scene, &mut ctx);
        assert_eq!(stats.shadow_maps_drawn, 1);
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn test_removed_drawable_leaves_every_layer() {
        let (mut ctx, mut renderer, mut scene) = setup();
        let layer_a = renderer.create_layer("a");
        let layer_b = renderer.create_layer("b");
        let drawable = cube_drawable(&mut ctx, &mut scene, "cube");
        let key = renderer.add_drawable(drawable);
        renderer.add_drawable_to_layer(layer_a, key);
        renderer.add_drawable_to_layer(layer_b, key);

        renderer.remove_drawable(key);
        assert!(!renderer.layer(layer_a).unwrap().draw_list().contains(key));
        assert!(!renderer.layer(layer_b).unwrap().draw_list().contains(key));
    }

    #[test]
    fn test_stale_draw_list_entry_is_swept_after_pass() {
        let (mut ctx, mut renderer, mut scene) = setup();
        let layer = renderer.create_layer("main");
        let drawable = cube_drawable(&mut ctx, &mut scene, "cube");
        let key = renderer.add_drawable(drawable);
        renderer.add_drawable_to_layer(layer, key);

        // Evict without unbinding to leave a stale key in the list.
        renderer.evict_drawable_for_test(key);
        assert!(renderer.layer(layer).unwrap().draw_list().contains(key));

        renderer.draw_frame(&scene, &mut ctx);
        assert!(!renderer.layer(layer).unwrap().draw_list().contains(key));
    }

    #[test]
    fn test_bound_layer_contents_draw_first() {
        let (mut ctx, mut renderer, mut scene) = setup();
        let content = renderer.create_layer("content");
        let compositor = renderer.create_layer("compositor");

        // Only the compositor participates in the frame.
        renderer.layer_mut(content).unwrap().set_active(false);
        renderer
            .layer_mut(compositor)
            .unwrap()
            .bind_layer(content);

        let drawable = cube_drawable(&mut ctx, &mut scene, "cube");
        let key = renderer.add_drawable(drawable);
        renderer.add_drawable_to_layer(content, key);

        let stats = renderer.draw_frame(&scene, &mut ctx);
        // The inactive content layer draws nothing itself, but the
        // compositor traverses its list.
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn test_stale_entry_in_inactive_bound_layer_is_swept() {
        let (mut ctx, mut renderer, mut scene) = setup();
        let content = renderer.create_layer("content");
        let compositor = renderer.create_layer("compositor");

        // The content layer never runs its own pass; only the
        // compositor traverses its list.
        renderer.layer_mut(content).unwrap().set_active(false);
        renderer
            .layer_mut(compositor)
            .unwrap()
            .bind_layer(content);

        let drawable = cube_drawable(&mut ctx, &mut scene, "cube");
        let key = renderer.add_drawable(drawable);
        renderer.add_drawable_to_layer(content, key);

        renderer.evict_drawable_for_test(key);
        assert!(renderer.layer(content).unwrap().draw_list().contains(key));

        renderer.draw_frame(&scene, &mut ctx);
        assert!(!renderer.layer(content).unwrap().draw_list().contains(key));
    }

    #[test]
    fn test_layer_with_no_camera_adopts_default() {
        let (mut ctx, mut renderer, scene) = setup();
        let layer = renderer.create_layer("main");
        assert!(renderer.layer(layer).unwrap().camera().is_none());

        renderer.draw_frame(&scene, &mut ctx);
        assert!(renderer.layer(layer).unwrap().camera().is_some());
    }
}
