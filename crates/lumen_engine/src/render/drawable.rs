//! Drawable components
//!
//! A drawable binds a scene object's transform to a model and a lazily
//! resolved shader permutation. Shader resolution is an explicit state
//! transition: mutating the model or the attribute bits moves the slot
//! to `Dirty`, and the next draw (or an explicit `resolve_shader` call)
//! recomputes the permutation lookup.

use crate::foundation::bounds::Bounds;
use crate::foundation::color::Color;
use crate::render::backend::RenderBackend;
use crate::render::camera::ViewInfo;
use crate::render::layer::LayerKey;
use crate::render::light::{LightContainer, LightKey, LightSource};
use crate::render::light_uniforms::LightUniformNames;
use crate::render::shader_assembler::ShaderAssembler;
use crate::resources::material::MaterialAttributes;
use crate::resources::mesh::Mesh;
use crate::resources::model::Model;
use crate::resources::shader::Shader;
use crate::resources::ResourceManager;
use crate::scene::{ObjectKey, Scene};
use slotmap::{new_key_type, SlotMap};
use std::sync::{Arc, Weak};

new_key_type! {
    /// Generational handle to a drawable in the renderer
    pub struct DrawableKey;
}

/// Highest valid render group
pub const MAX_RENDER_GROUP: u32 = 31;

/// Vertex attribute location of the fallback color channel
const COLOR_ATTRIBUTE_LOCATION: u32 = 3;
/// Base vertex attribute location of the instance model matrix rows
pub(crate) const MODEL_MATRIX_LOCATION: u32 = 4;

bitflags::bitflags! {
    /// Per-drawable behavior flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DrawableFlags: u32 {
        /// Lights affect this drawable
        const RECEIVE_LIGHTS  = 1 << 0;
        /// Shadow maps are sampled for this drawable
        const RECEIVE_SHADOWS = 1 << 1;
        /// This drawable is rendered into shadow maps
        const CAST_SHADOWS    = 1 << 2;
        /// This drawable appears in environment recordings
        const REFLECTED       = 1 << 3;
    }
}

impl Default for DrawableFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Lazy shader resolution state
#[derive(Debug)]
pub enum ShaderSlot {
    /// The permutation must be re-resolved before the next draw
    Dirty,
    /// A previously resolved permutation (may have expired)
    Resolved(Weak<Shader>),
}

/// A mesh-drawing component bound to one scene object
#[derive(Debug)]
pub struct Drawable {
    id: String,
    object: ObjectKey,
    model: Model,
    shader: ShaderSlot,
    render_group: u32,
    flags: DrawableFlags,
    attributes: MaterialAttributes,
    color: Color,
    bound_layers: Vec<LayerKey>,
}

impl Drawable {
    /// Create a drawable attached to a scene object
    pub fn new(object: ObjectKey, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object,
            model: Model::empty(),
            shader: ShaderSlot::Dirty,
            render_group: 0,
            flags: DrawableFlags::default(),
            attributes: MaterialAttributes::empty(),
            color: Color::WHITE,
            bound_layers: Vec::new(),
        }
    }

    /// Component id (unique per use site, not engine-wide)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning scene object
    pub fn object(&self) -> ObjectKey {
        self.object
    }

    /// Replace the model; invalidates the resolved shader
    pub fn set_model(&mut self, model: Model) {
        self.model = model;
        self.shader = ShaderSlot::Dirty;
    }

    /// Read the model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Mutate the model; conservatively invalidates the resolved shader
    pub fn model_mut(&mut self) -> &mut Model {
        self.shader = ShaderSlot::Dirty;
        &mut self.model
    }

    /// Fallback color used when the mesh has no vertex color channel
    pub fn color(&self) -> Color {
        self.color
    }

    /// Set the fallback color
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Render group, always within `[0, MAX_RENDER_GROUP]`
    pub fn render_group(&self) -> u32 {
        self.render_group
    }

    /// Set the render group, clamping at set time
    pub fn set_render_group(&mut self, group: u32) {
        self.render_group = group.min(MAX_RENDER_GROUP);
    }

    /// Behavior flags
    pub fn flags(&self) -> DrawableFlags {
        self.flags
    }

    /// Replace the behavior flags
    pub fn set_flags(&mut self, flags: DrawableFlags) {
        self.flags = flags;
    }

    /// Whether all given flags are set
    pub fn has_flag(&self, flag: DrawableFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Drawable-level shader-variant bits (e.g. skybox)
    pub fn attributes(&self) -> MaterialAttributes {
        self.attributes
    }

    /// Replace the drawable-level variant bits; invalidates the shader
    pub fn set_attributes(&mut self, attributes: MaterialAttributes) {
        self.attributes = attributes;
        self.shader = ShaderSlot::Dirty;
    }

    /// OR in more variant bits; invalidates the shader
    pub fn add_attributes(&mut self, attributes: MaterialAttributes) {
        self.attributes |= attributes;
        self.shader = ShaderSlot::Dirty;
    }

    /// Model-space bounds of the current mesh
    pub fn local_bounds(&self) -> Option<Bounds> {
        self.model.mesh().map(|m| m.bounds())
    }

    /// World-space bounds under the owning object's transform
    pub fn global_bounds(&self, scene: &Scene) -> Option<Bounds> {
        self.local_bounds()
            .map(|b| b.transformed(&scene.global_transform(self.object)))
    }

    /// Layers currently holding this drawable
    pub fn bound_layers(&self) -> &[LayerKey] {
        &self.bound_layers
    }

    pub(crate) fn bind_layer(&mut self, layer: LayerKey) {
        if !self.bound_layers.contains(&layer) {
            self.bound_layers.push(layer);
        }
    }

    pub(crate) fn unbind_layer(&mut self, layer: LayerKey) {
        self.bound_layers.retain(|l| *l != layer);
    }

    /// The currently resolved shader, if one is memoized and live
    pub fn resolved_shader(&self) -> Option<Arc<Shader>> {
        match &self.shader {
            ShaderSlot::Resolved(weak) => weak.upgrade(),
            ShaderSlot::Dirty => None,
        }
    }

    /// Resolve the shader permutation for the current model + attributes
    ///
    /// Memoized until the next invalidating mutation; an invalid model
    /// resolves to the error shader.
    pub fn resolve_shader(
        &mut self,
        backend: &mut dyn RenderBackend,
        assembler: &mut ShaderAssembler,
        resources: &mut ResourceManager,
    ) -> Arc<Shader> {
        if let ShaderSlot::Resolved(weak) = &self.shader {
            if let Some(live) = weak.upgrade() {
                return live;
            }
        }

        let shader = if self.model.is_valid() {
            let bits = self.model.attributes() | self.attributes;
            assembler.get_shader(bits, backend, resources)
        } else {
            Arc::clone(resources.error_shader())
        };

        self.shader = ShaderSlot::Resolved(Arc::downgrade(&shader));
        shader
    }

    /// Draw this drawable; returns whether a draw call was issued
    ///
    /// An invalid model or inactive object is a silent skip, not an
    /// error. In validating mode a failed program validation skips this
    /// one draw and leaves the frame running.
    pub fn draw(
        &mut self,
        scene: &Scene,
        view: &ViewInfo,
        lights: &LightContainer,
        light_store: &SlotMap<LightKey, LightSource>,
        backend: &mut dyn RenderBackend,
        assembler: &mut ShaderAssembler,
        resources: &mut ResourceManager,
        names: &LightUniformNames,
        validate: bool,
    ) -> bool {
        if !self.model.is_valid() || !scene.is_active(self.object) {
            return false;
        }
        let Some(mesh) = self.model.mesh() else {
            return false;
        };

        let shader = self.resolve_shader(backend, assembler, resources);
        let program = shader.program();
        backend.bind_program(program);

        backend.set_uniform_mat4(program, "u_view_projection", &view.view_projection());
        let model_matrix = scene.global_transform(self.object);
        backend.set_instance_attribute_mat4(MODEL_MATRIX_LOCATION, &model_matrix);

        if let Some(material) = self.model.material() {
            if material.is_lit() {
                lights.send_to_shader(
                    backend,
                    program,
                    names,
                    self.has_flag(DrawableFlags::RECEIVE_LIGHTS),
                    self.has_flag(DrawableFlags::RECEIVE_SHADOWS),
                    light_store,
                    scene,
                );
            }
            material.send_to_shader(backend, program, view.camera_position);
        }

        if !mesh.has_vertex_colors() {
            backend.set_constant_vertex_attribute(COLOR_ATTRIBUTE_LOCATION, self.color.as_rgba_f32());
        }

        if validate && !backend.validate_program(program) {
            log::debug!("drawable '{}': program validation failed, skipping draw", self.id);
            return false;
        }

        Self::submit_mesh(&mesh, backend);
        true
    }

    /// Bind a mesh's buffers and issue the draw call
    pub(crate) fn submit_mesh(mesh: &Mesh, backend: &mut dyn RenderBackend) {
        backend.bind_vertex_data(mesh.vertex_bytes(), Mesh::vertex_stride());
        if mesh.index_count() > 0 {
            backend.bind_index_data(mesh.indices());
            backend.draw_indexed(mesh.index_count());
        } else {
            backend.draw_arrays(mesh.vertex_count());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessBackend;
    use crate::render::light::MaxLights;
    use crate::resources::material::Material;

    struct Fixture {
        backend: HeadlessBackend,
        assembler: ShaderAssembler,
        resources: ResourceManager,
        names: LightUniformNames,
        lights: LightContainer,
        light_store: SlotMap<LightKey, LightSource>,
        scene: Scene,
    }

    fn fixture() -> Fixture {
        let mut backend = HeadlessBackend::new();
        let resources = ResourceManager::new(&mut backend).unwrap();
        let max = MaxLights::default();
        Fixture {
            backend,
            assembler: ShaderAssembler::new(max, false),
            resources,
            names: LightUniformNames::new(max.point, max.directional, max.spot),
            lights: LightContainer::new(max),
            light_store: SlotMap::with_key(),
            scene: Scene::new(),
        }
    }

    fn lit_model(resources: &mut ResourceManager) -> Model {
        let mesh = resources.get_mesh("cube", || Ok(Mesh::cube("cube", 1.0)));
        let material = resources.get_material("phong", || Ok(Material::new("phong").with_phong()));
        Model::new(&mesh, material)
    }

    #[test]
    fn test_render_group_clamps_at_set_time() {
        let mut scene = Scene::new();
        let object = scene.create_object("o");
        let mut drawable = Drawable::new(object, "d");

        for group in [0, 15, 31, 32, 1000] {
            drawable.set_render_group(group);
            assert_eq!(drawable.render_group(), group.min(31));
        }
    }

    #[test]
    fn test_invalid_model_draws_nothing() {
        let mut f = fixture();
        let object = f.scene.create_object("o");
        let mut drawable = Drawable::new(object, "d");

        let drew = drawable.draw(
            &f.scene,
            &ViewInfo::for_camera(&crate::render::camera::Camera::default(), &f.scene),
            &f.lights,
            &f.light_store,
            &mut f.backend,
            &mut f.assembler,
            &mut f.resources,
            &f.names,
            false,
        );

        assert!(!drew);
        assert_eq!(f.backend.draw_calls, 0);
    }

    #[test]
    fn test_valid_model_issues_one_draw() {
        let mut f = fixture();
        let object = f.scene.create_object("o");
        let mut drawable = Drawable::new(object, "d");
        drawable.set_model(lit_model(&mut f.resources));

        let view = ViewInfo::for_camera(&crate::render::camera::Camera::default(), &f.scene);
        assert!(drawable.draw(
            &f.scene,
            &view,
            &f.lights,
            &f.light_store,
            &mut f.backend,
            &mut f.assembler,
            &mut f.resources,
            &f.names,
            false,
        ));
        assert_eq!(f.backend.draw_calls, 1);
        // Cube mesh has no vertex colors: fallback color is pushed.
        assert!(f
            .backend
            .constant_attributes
            .contains_key(&COLOR_ATTRIBUTE_LOCATION));
    }

    #[test]
    fn test_attribute_mutation_re_resolves_shader() {
        let mut f = fixture();
        let object = f.scene.create_object("o");
        let mut drawable = Drawable::new(object, "d");
        drawable.set_model(lit_model(&mut f.resources));

        let first = drawable.resolve_shader(&mut f.backend, &mut f.assembler, &mut f.resources);
        let memoized = drawable.resolve_shader(&mut f.backend, &mut f.assembler, &mut f.resources);
        assert!(Arc::ptr_eq(&first, &memoized));

        drawable.add_attributes(MaterialAttributes::SKY_BOX);
        let resolved = drawable.resolve_shader(&mut f.backend, &mut f.assembler, &mut f.resources);
        assert!(!Arc::ptr_eq(&first, &resolved));
    }

    #[test]
    fn test_invalid_model_resolves_to_error_shader() {
        let mut f = fixture();
        let object = f.scene.create_object("o");
        let mut drawable = Drawable::new(object, "d");

        let shader = drawable.resolve_shader(&mut f.backend, &mut f.assembler, &mut f.resources);
        assert!(Arc::ptr_eq(&shader, f.resources.error_shader()));
    }

    #[test]
    fn test_validation_failure_skips_draw_silently() {
        let mut f = fixture();
        f.backend.validate_result = false;
        let object = f.scene.create_object("o");
        let mut drawable = Drawable::new(object, "d");
        drawable.set_model(lit_model(&mut f.resources));

        let view = ViewInfo::for_camera(&crate::render::camera::Camera::default(), &f.scene);
        assert!(!drawable.draw(
            &f.scene,
            &view,
            &f.lights,
            &f.light_store,
            &mut f.backend,
            &mut f.assembler,
            &mut f.resources,
            &f.names,
            true,
        ));
        assert_eq!(f.backend.draw_calls, 0);
    }
}
