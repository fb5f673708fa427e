//! Light sources and the per-frame light batch
//!
//! A light's shadow map is an explicit resource-acquisition toggle:
//! enabling shadow casting allocates the render target and light-space
//! matrices immediately, disabling releases them immediately. Nothing
//! here is cached lazily across the toggle.

use crate::foundation::color::Color;
use crate::foundation::math::{look_at, orthographic, perspective, Mat4, Vec2, Vec3};
use crate::render::backend::{ProgramId, RenderBackend};
use crate::render::drawable::{Drawable, DrawableFlags, DrawableKey, MODEL_MATRIX_LOCATION};
use crate::render::light_uniforms::{
    LightUniformNames, NUM_DIRECTIONAL_LIGHTS, NUM_POINT_LIGHTS, NUM_SPOT_LIGHTS, RECEIVE_LIGHTS,
    RECEIVE_SHADOWS,
};
use crate::render::shader_assembler::ShaderAssembler;
use crate::render::target::RenderTarget;
use crate::resources::material::MapSlot;
use crate::resources::texture::TextureFormat;
use crate::resources::ResourceManager;
use crate::scene::{ObjectKey, Scene};
use crate::settings::{keys, Settings};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational handle to a light in the renderer
    pub struct LightKey;
}

/// Intensity at which a light's influence is considered negligible,
/// as a fraction of one 8-bit channel step
const RANGE_FALLOFF: f32 = 256.0 / 5.0;

/// Depth cap for shadow projections; a light whose attenuation never
/// decays (`range() == INFINITY`) still needs a finite far plane
const MAX_SHADOW_RANGE: f32 = 100.0;

/// Light emitter kinds; fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Omnidirectional emitter with distance attenuation
    Point,
    /// Infinitely distant parallel emitter, no attenuation
    Directional,
    /// Cone emitter with distance attenuation and cutoff angles
    Spot,
}

impl LightType {
    /// Stable numeric tag used by the persisted form
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Point => 0,
            Self::Directional => 1,
            Self::Spot => 2,
        }
    }

    /// Parse the persisted numeric tag
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Point),
            1 => Some(Self::Directional),
            2 => Some(Self::Spot),
            _ => None,
        }
    }
}

/// Intensity color slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensitySlot {
    /// Ambient contribution
    Ambient,
    /// Diffuse contribution
    Diffuse,
    /// Specular contribution
    Specular,
}

/// Coefficient slots in the attenuation triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttenuationSlot {
    /// Distance-independent term
    Constant,
    /// Linear falloff term
    Linear,
    /// Quadratic falloff term
    Quadratic,
}

/// Configured per-type light maxima
#[derive(Debug, Clone, Copy)]
pub struct MaxLights {
    /// Point lights per draw
    pub point: u32,
    /// Directional lights per draw
    pub directional: u32,
    /// Spot lights per draw
    pub spot: u32,
}

impl Default for MaxLights {
    fn default() -> Self {
        Self {
            point: 8,
            directional: 2,
            spot: 2,
        }
    }
}

impl MaxLights {
    /// Read the maxima from settings, falling back to the defaults
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        Self {
            point: settings.get_u32(keys::MAX_POINT_LIGHTS, defaults.point),
            directional: settings.get_u32(keys::MAX_DIRECTIONAL_LIGHTS, defaults.directional),
            spot: settings.get_u32(keys::MAX_SPOT_LIGHTS, defaults.spot),
        }
    }
}

/// An owned shadow map and its light-space matrices
#[derive(Debug)]
pub struct ShadowMap {
    target: RenderTarget,
    /// 6 matrices for point lights, 1 otherwise
    matrices: Vec<Mat4>,
    /// Depth normalization distance for point lights
    far_plane: f32,
}

impl ShadowMap {
    /// Light-space matrices recorded by the last shadow pass
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    /// The shadow target
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }
}

/// A light component attached to one scene object
#[derive(Debug)]
pub struct LightSource {
    id: String,
    object: ObjectKey,
    light_type: LightType,
    ambient: Color,
    diffuse: Color,
    specular: Color,
    /// Constant, linear, quadratic coefficients
    attenuation: [f32; 3],
    /// Inner, outer cone angles in radians
    cutoff: [f32; 2],
    mask: u32,
    shadow: Option<ShadowMap>,
}

impl LightSource {
    /// Create a light; the type never changes afterwards
    pub fn new(object: ObjectKey, id: impl Into<String>, light_type: LightType) -> Self {
        Self {
            id: id.into(),
            object,
            light_type,
            ambient: Color::BLACK,
            diffuse: Color::WHITE,
            specular: Color::WHITE,
            attenuation: [1.0, 0.0, 0.0],
            cutoff: [0.17, 0.17],
            mask: 1,
            shadow: None,
        }
    }

    /// Component id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning scene object
    pub fn object(&self) -> ObjectKey {
        self.object
    }

    /// Emitter kind
    pub fn light_type(&self) -> LightType {
        self.light_type
    }

    /// Set one intensity color
    pub fn set_intensity(&mut self, slot: IntensitySlot, color: Color) {
        match slot {
            IntensitySlot::Ambient => self.ambient = color,
            IntensitySlot::Diffuse => self.diffuse = color,
            IntensitySlot::Specular => self.specular = color,
        }
    }

    /// Set all three intensity colors at once
    pub fn set_intensities(&mut self, ambient: Color, diffuse: Color, specular: Color) {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.specular = specular;
    }

    /// Set every intensity slot to the same color
    pub fn set_intensity_all(&mut self, color: Color) {
        self.set_intensities(color, color, color);
    }

    /// Read one intensity color
    pub fn intensity(&self, slot: IntensitySlot) -> Color {
        match slot {
            IntensitySlot::Ambient => self.ambient,
            IntensitySlot::Diffuse => self.diffuse,
            IntensitySlot::Specular => self.specular,
        }
    }

    /// Set the attenuation triple (constant, linear, quadratic)
    pub fn set_attenuation(&mut self, constant: f32, linear: f32, quadratic: f32) {
        self.attenuation = [constant, linear, quadratic];
    }

    /// Set one attenuation coefficient
    pub fn set_attenuation_component(&mut self, slot: AttenuationSlot, value: f32) {
        let index = match slot {
            AttenuationSlot::Constant => 0,
            AttenuationSlot::Linear => 1,
            AttenuationSlot::Quadratic => 2,
        };
        self.attenuation[index] = value;
    }

    /// Derive attenuation coefficients from a target influence radius
    pub fn set_attenuation_from_range(&mut self, range: f32) {
        self.attenuation = [1.0, 4.5 / range, 75.0 / (range * range)];
    }

    /// Attenuation triple
    pub fn attenuation(&self) -> [f32; 3] {
        self.attenuation
    }

    /// Set the spot cone angles in radians
    pub fn set_cutoff(&mut self, inner: f32, outer: f32) {
        self.cutoff = [inner, outer];
    }

    /// Inner/outer cone angles in radians
    pub fn cutoff(&self) -> [f32; 2] {
        self.cutoff
    }

    /// Render mask; bit `1 << render_group` gates each drawable
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Set the render mask
    pub fn set_mask(&mut self, mask: u32) {
        self.mask = mask;
    }

    /// Whether this light currently owns a shadow map
    pub fn casts_shadows(&self) -> bool {
        self.shadow.is_some()
    }

    /// The owned shadow map, if casting
    pub fn shadow(&self) -> Option<&ShadowMap> {
        self.shadow.as_ref()
    }

    /// Enable or disable shadow casting
    ///
    /// Enabling allocates the shadow target now; if allocation fails the
    /// light stays non-casting. Disabling releases the target now.
    pub fn set_cast_shadows(
        &mut self,
        enabled: bool,
        backend: &mut dyn RenderBackend,
        resolution: u32,
    ) {
        match (enabled, self.shadow.take()) {
            (true, Some(existing)) => self.shadow = Some(existing),
            (true, None) => {
                let (format, matrix_count) = match self.light_type {
                    LightType::Point => (TextureFormat::DepthCube16, 6),
                    _ => (TextureFormat::Depth16, 1),
                };
                match RenderTarget::create(
                    format!("{}_shadow", self.id),
                    backend,
                    (resolution, resolution),
                    format,
                ) {
                    Ok(target) => {
                        self.shadow = Some(ShadowMap {
                            target,
                            matrices: vec![Mat4::identity(); matrix_count],
                            far_plane: 0.0,
                        });
                    }
                    Err(e) => {
                        log::warn!("light '{}': shadow map allocation failed: {e}", self.id);
                    }
                }
            }
            (false, Some(shadow)) => shadow.target.destroy(backend),
            (false, None) => {}
        }
    }

    /// Effective influence radius derived from attenuation and peak intensity
    ///
    /// Solves `q·d² + l·d + c = max_channel · 256/5` for `d`: the distance
    /// at which the attenuated brightest diffuse channel falls below
    /// roughly five 8-bit steps.
    pub fn range(&self) -> f32 {
        let [c, l, q] = self.attenuation;
        let max = f32::from(self.diffuse.max_channel());
        let reach = max * RANGE_FALLOFF;

        if q.abs() <= f32::EPSILON {
            if l.abs() <= f32::EPSILON {
                return f32::INFINITY;
            }
            return ((reach - c) / l).max(0.0);
        }

        let discriminant = l * l - 4.0 * q * (c - reach);
        if discriminant < 0.0 {
            return 0.0;
        }
        ((-l + discriminant.sqrt()) / (2.0 * q)).max(0.0)
    }

    /// Approximate influence test against a world position
    ///
    /// Directional lights always pass. The threshold is a tunable; results
    /// near it are approximate by design.
    pub fn touches(&self, light_position: Vec3, target: Vec3, threshold: f32) -> bool {
        if self.light_type == LightType::Directional {
            return true;
        }
        let [c, l, q] = self.attenuation;
        let d = (target - light_position).norm();
        let denom = c + l * d + q * d * d;
        if denom <= f32::EPSILON {
            return true;
        }
        1.0 / denom > threshold
    }

    /// Render this light's shadow map from the given drawables
    ///
    /// Rebuilds the light-space matrices, records depth for every active
    /// shadow-casting drawable passing the mask and influence tests, and
    /// reports whether anything was drawn (an empty map can be skipped
    /// downstream). Not casting shadows is a no-op returning false.
    pub fn draw_shadow_map(
        &mut self,
        scene: &Scene,
        drawables: &SlotMap<DrawableKey, Drawable>,
        backend: &mut dyn RenderBackend,
        assembler: &mut ShaderAssembler,
        resources: &mut ResourceManager,
        cull_threshold: f32,
    ) -> bool {
        if self.shadow.is_none() {
            return false;
        }

        let position = scene.global_position(self.object);
        let front = scene.global_front(self.object);
        // Constant-only attenuation yields an infinite range; the
        // projection needs a finite far plane.
        let range = self.range().min(MAX_SHADOW_RANGE);

        let (matrices, far_plane) = match self.light_type {
            LightType::Point => {
                let far = (range * 10.0).max(1.0);
                (Self::cube_face_matrices(position, far), far)
            }
            LightType::Spot => {
                let proj = perspective(2.0 * self.cutoff[1], 1.0, 0.1, range.max(1.0));
                let view = look_at(position, position + front, Vec3::y());
                (vec![proj * view], range)
            }
            LightType::Directional => {
                // The owning object's local scale stands in for the
                // frustum extents.
                let scale = scene
                    .get(self.object)
                    .map_or_else(|| Vec3::new(1.0, 1.0, 1.0), |o| o.transform.scale);
                let proj = orthographic(
                    -scale.x, scale.x, -scale.y, scale.y, -scale.z, scale.z,
                );
                let view = look_at(position, position + front, Vec3::y());
                (vec![proj * view], scale.z)
            }
        };

        let shader = if self.light_type == LightType::Point {
            assembler.depth_point_shader(backend, resources)
        } else {
            assembler.depth_shader(backend, resources)
        };
        let program = shader.program();
        backend.bind_program(program);

        {
            let Some(shadow) = self.shadow.as_mut() else {
                return false;
            };
            shadow.matrices = matrices;
            shadow.far_plane = far_plane;

            if !backend.bind_render_target(shadow.target.target()) {
                log::warn!("light '{}': stale shadow target handle", self.id);
                return false;
            }
            backend.clear_depth();

            if self.light_type == LightType::Point {
                backend.set_uniform_mat4_array(program, "u_face_matrices", &shadow.matrices);
                backend.set_uniform_vec3(program, "u_light_position", position);
                backend.set_uniform_f32(program, "u_far_plane", far_plane);
            } else {
                backend.set_uniform_mat4(program, "u_light_matrix", &shadow.matrices[0]);
            }
        }

        let mut drew = false;
        for drawable in drawables.values() {
            if !drawable.has_flag(DrawableFlags::CAST_SHADOWS)
                || !scene.is_active(drawable.object())
                || self.mask & (1 << drawable.render_group()) == 0
            {
                continue;
            }
            let target_pos = scene.global_position(drawable.object());
            if !self.touches(position, target_pos, cull_threshold) {
                continue;
            }
            let Some(mesh) = drawable.model().mesh() else {
                continue;
            };

            let model_matrix = scene.global_transform(drawable.object());
            backend.set_instance_attribute_mat4(MODEL_MATRIX_LOCATION, &model_matrix);
            Drawable::submit_mesh(&mesh, backend);
            drew = true;
        }

        backend.unbind_render_target();
        drew
    }

    /// Per-face cubemap view-projection matrices
    ///
    /// Up-vectors per face: the poles (`±Y`) use `±Z` ups to avoid the
    /// degenerate look-at at the poles; all side faces use `-Y`.
    fn cube_face_matrices(position: Vec3, far: f32) -> Vec<Mat4> {
        let proj = perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, far);
        let faces: [(Vec3, Vec3); 6] = [
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
            (Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, -1.0, 0.0)),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, -1.0, 0.0)),
        ];
        faces
            .iter()
            .map(|(dir, up)| proj * look_at(position, position + *dir, *up))
            .collect()
    }
}

/// Per-frame batch of active lights, bucketed by type
///
/// Cleared and refilled every frame; capacity stays at the configured
/// maxima so steady-state frames allocate nothing.
#[derive(Debug)]
pub struct LightContainer {
    max: MaxLights,
    point: Vec<LightKey>,
    directional: Vec<LightKey>,
    spot: Vec<LightKey>,
}

impl LightContainer {
    /// Create an empty container with capacity for the configured maxima
    pub fn new(max: MaxLights) -> Self {
        Self {
            max,
            point: Vec::with_capacity(max.point as usize),
            directional: Vec::with_capacity(max.directional as usize),
            spot: Vec::with_capacity(max.spot as usize),
        }
    }

    /// Empty all buckets, keeping their reserved capacity
    pub fn clear(&mut self) {
        self.point.clear();
        self.directional.clear();
        self.spot.clear();
        self.point.reserve(self.max.point as usize);
        self.directional.reserve(self.max.directional as usize);
        self.spot.reserve(self.max.spot as usize);
    }

    /// Whether no lights are batched
    pub fn empty(&self) -> bool {
        self.point.is_empty() && self.directional.is_empty() && self.spot.is_empty()
    }

    /// Batch a light; silently drops overflow past the per-type maximum
    pub fn push(&mut self, light_type: LightType, key: LightKey) {
        let (bucket, max) = match light_type {
            LightType::Point => (&mut self.point, self.max.point),
            LightType::Directional => (&mut self.directional, self.max.directional),
            LightType::Spot => (&mut self.spot, self.max.spot),
        };
        if (bucket.len() as u32) < max {
            bucket.push(key);
        } else {
            log::trace!("light bucket for {light_type:?} is full, dropping");
        }
    }

    /// Number of batched lights across all buckets
    pub fn len(&self) -> usize {
        self.point.len() + self.directional.len() + self.spot.len()
    }

    /// Whether the container is empty (mirrors `empty`)
    pub fn is_empty(&self) -> bool {
        self.empty()
    }

    /// Upload the batched lights into a program's uniforms
    ///
    /// Early-outs with `u_receive_lights = false` when the drawable opts
    /// out or nothing is batched. Shadow maps bind to pre-assigned units
    /// above the material's reserved range.
    pub fn send_to_shader(
        &self,
        backend: &mut dyn RenderBackend,
        program: ProgramId,
        names: &LightUniformNames,
        receive_lights: bool,
        receive_shadows: bool,
        lights: &SlotMap<LightKey, LightSource>,
        scene: &Scene,
    ) {
        if !receive_lights || self.empty() {
            backend.set_uniform_bool(program, RECEIVE_LIGHTS, false);
            return;
        }
        backend.set_uniform_bool(program, RECEIVE_LIGHTS, true);
        backend.set_uniform_bool(program, RECEIVE_SHADOWS, receive_shadows);

        let mut count = 0;
        for (i, key) in self.point.iter().enumerate() {
            let (Some(light), Some(n)) = (lights.get(*key), names.point.get(i)) else {
                continue;
            };
            let position = scene.global_position(light.object);
            backend.set_uniform_vec3(program, &n.position, position);
            backend.set_uniform_vec3(program, &n.ambient, light.ambient.as_rgb_f32());
            backend.set_uniform_vec3(program, &n.diffuse, light.diffuse.as_rgb_f32());
            backend.set_uniform_vec3(program, &n.specular, light.specular.as_rgb_f32());
            backend.set_uniform_vec3(program, &n.attenuation, Vec3::from(light.attenuation));

            let shadow = light.shadow.as_ref().filter(|_| receive_shadows);
            backend.set_uniform_bool(program, &n.cast_shadow, shadow.is_some());
            if let Some(shadow) = shadow {
                backend.set_uniform_f32(program, &n.far_plane, shadow.far_plane);
                backend.bind_texture(
                    program,
                    &n.shadow_map,
                    shadow.target.texture().id(),
                    MapSlot::UNIT_COUNT + i as u32,
                );
            }
            count += 1;
        }
        backend.set_uniform_i32(program, NUM_POINT_LIGHTS, count);

        let directional_unit_base = MapSlot::UNIT_COUNT + self.max.point;
        count = 0;
        for (i, key) in self.directional.iter().enumerate() {
            let (Some(light), Some(n)) = (lights.get(*key), names.directional.get(i)) else {
                continue;
            };
            backend.set_uniform_vec3(program, &n.direction, scene.global_front(light.object));
            backend.set_uniform_vec3(program, &n.ambient, light.ambient.as_rgb_f32());
            backend.set_uniform_vec3(program, &n.diffuse, light.diffuse.as_rgb_f32());
            backend.set_uniform_vec3(program, &n.specular, light.specular.as_rgb_f32());

            let shadow = light.shadow.as_ref().filter(|_| receive_shadows);
            backend.set_uniform_bool(program, &n.cast_shadow, shadow.is_some());
            if let Some(shadow) = shadow {
                backend.set_uniform_mat4(program, &n.ls_matrix, &shadow.matrices[0]);
                backend.bind_texture(
                    program,
                    &n.shadow_map,
                    shadow.target.texture().id(),
                    directional_unit_base + i as u32,
                );
            }
            count += 1;
        }
        backend.set_uniform_i32(program, NUM_DIRECTIONAL_LIGHTS, count);

        let spot_unit_base = directional_unit_base + self.max.directional;
        count = 0;
        for (i, key) in self.spot.iter().enumerate() {
            let (Some(light), Some(n)) = (lights.get(*key), names.spot.get(i)) else {
                continue;
            };
            let position = scene.global_position(light.object);
            backend.set_uniform_vec3(program, &n.position, position);
            backend.set_uniform_vec3(program, &n.direction, scene.global_front(light.object));
            backend.set_uniform_vec3(program, &n.ambient, light.ambient.as_rgb_f32());
            backend.set_uniform_vec3(program, &n.diffuse, light.diffuse.as_rgb_f32());
            backend.set_uniform_vec3(program, &n.specular, light.specular.as_rgb_f32());
            backend.set_uniform_vec3(program, &n.attenuation, Vec3::from(light.attenuation));
            backend.set_uniform_vec2(
                program,
                &n.cutoff,
                Vec2::new(light.cutoff[0].cos(), light.cutoff[1].cos()),
            );

            let shadow = light.shadow.as_ref().filter(|_| receive_shadows);
            backend.set_uniform_bool(program, &n.cast_shadow, shadow.is_some());
            if let Some(shadow) = shadow {
                backend.set_uniform_mat4(program, &n.ls_matrix, &shadow.matrices[0]);
                backend.bind_texture(
                    program,
                    &n.shadow_map,
                    shadow.target.texture().id(),
                    spot_unit_base + i as u32,
                );
            }
            count += 1;
        }
        backend.set_uniform_i32(program, NUM_SPOT_LIGHTS, count);
    }
}
