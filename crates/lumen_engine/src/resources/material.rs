//! Material resources and the shader-permutation attribute mask
//!
//! A material's attribute bits are the cache key for shader assembly:
//! two materials with equal bits share one compiled program. The bit
//! order here matches the preprocessor-definition order documented in
//! [`crate::render::shader_assembler`]; keep them in sync.

use crate::foundation::color::Color;
use crate::foundation::math::Vec3;
use crate::render::backend::{ProgramId, RenderBackend};
use crate::resources::resource::Resource;
use crate::resources::texture::Texture;
use std::sync::{Arc, Weak};

bitflags::bitflags! {
    /// Shader-variant selection bits
    ///
    /// Bits 0..=9 are material-derived; the high bits (`RECORD_ENV`,
    /// `SKY_BOX`, `SKY_SPHERE`) are drawable-level variants OR-ed in by
    /// the drawable before shader resolution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialAttributes: u32 {
        /// Material block and lighting inputs are present
        const LIGHTING        = 1 << 0;
        /// Diffuse texture map
        const DIFFUSE_MAP     = 1 << 1;
        /// Diffuse map alpha participates in blending
        const DIFFUSE_ALPHA   = 1 << 2;
        /// Specular texture map
        const SPECULAR_MAP    = 1 << 3;
        /// Emission texture map
        const EMISSION_MAP    = 1 << 4;
        /// Environment cubemap
        const ENVIRONMENT_MAP = 1 << 5;
        /// Reflection mask map
        const REFLECTION_MAP  = 1 << 6;
        /// Opacity map
        const OPACITY_MAP     = 1 << 7;
        /// Gloss map
        const GLOSS_MAP       = 1 << 8;
        /// Phong lighting model
        const PHONG           = 1 << 9;
        /// Drawable records the environment instead of sampling it
        const RECORD_ENV      = 1 << 10;
        /// Skybox variant
        const SKY_BOX         = 1 << 11;
        /// Sky-sphere variant
        const SKY_SPHERE      = 1 << 12;
    }
}

/// Texture map slots a material may populate
///
/// The discriminant doubles as the fixed texture unit the map binds to;
/// shadow-map units are assigned starting at [`MapSlot::UNIT_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MapSlot {
    /// Base color
    Diffuse = 0,
    /// Specular intensity
    Specular = 1,
    /// Self-illumination
    Emission = 2,
    /// Environment cubemap
    Environment = 3,
    /// Reflection mask
    Reflection = 4,
    /// Opacity
    Opacity = 5,
    /// Gloss
    Gloss = 6,
}

impl MapSlot {
    /// Number of reserved material texture units
    pub const UNIT_COUNT: u32 = 7;

    /// All slots in binding order
    pub const ALL: [Self; 7] = [
        Self::Diffuse,
        Self::Specular,
        Self::Emission,
        Self::Environment,
        Self::Reflection,
        Self::Opacity,
        Self::Gloss,
    ];

    /// Fixed texture unit for this slot
    pub fn unit(self) -> u32 {
        self as u32
    }

    /// Sampler uniform name for this slot
    pub fn uniform_name(self) -> &'static str {
        match self {
            Self::Diffuse => "u_diffuse_map",
            Self::Specular => "u_specular_map",
            Self::Emission => "u_emission_map",
            Self::Environment => "u_environment_map",
            Self::Reflection => "u_reflection_map",
            Self::Opacity => "u_opacity_map",
            Self::Gloss => "u_gloss_map",
        }
    }

    /// Attribute bit implied by populating this slot
    pub fn attribute(self) -> MaterialAttributes {
        match self {
            Self::Diffuse => MaterialAttributes::DIFFUSE_MAP,
            Self::Specular => MaterialAttributes::SPECULAR_MAP,
            Self::Emission => MaterialAttributes::EMISSION_MAP,
            Self::Environment => MaterialAttributes::ENVIRONMENT_MAP,
            Self::Reflection => MaterialAttributes::REFLECTION_MAP,
            Self::Opacity => MaterialAttributes::OPACITY_MAP,
            Self::Gloss => MaterialAttributes::GLOSS_MAP,
        }
    }
}

/// Surface description combining lighting response and texture maps
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    attributes: MaterialAttributes,

    /// Ambient reflection color
    pub ambient: Color,
    /// Diffuse reflection color
    pub diffuse: Color,
    /// Specular reflection color
    pub specular: Color,
    /// Emission color
    pub emission: Color,
    /// Specular exponent
    pub shininess: f32,
    /// Environment reflectivity in [0, 1]
    pub reflectivity: f32,

    maps: [Option<Weak<Texture>>; 7],
}

impl Material {
    /// Create an unlit material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: MaterialAttributes::empty(),
            ambient: Color::BLACK,
            diffuse: Color::WHITE,
            specular: Color::BLACK,
            emission: Color::BLACK,
            shininess: 1.0,
            reflectivity: 0.0,
            maps: Default::default(),
        }
    }

    /// Enable Phong shading (implies the lighting/material block)
    pub fn with_phong(mut self) -> Self {
        self.attributes |= MaterialAttributes::PHONG | MaterialAttributes::LIGHTING;
        self
    }

    /// Add extra attribute bits (e.g. `DIFFUSE_ALPHA`)
    pub fn with_attributes(mut self, attributes: MaterialAttributes) -> Self {
        self.attributes |= attributes;
        self
    }

    /// Bind a texture to a map slot, setting the matching attribute bit
    pub fn set_map(&mut self, slot: MapSlot, texture: &Arc<Texture>) {
        self.maps[slot.unit() as usize] = Some(Arc::downgrade(texture));
        self.attributes |= slot.attribute();
    }

    /// Remove a map binding and clear its attribute bit
    pub fn clear_map(&mut self, slot: MapSlot) {
        self.maps[slot.unit() as usize] = None;
        self.attributes &= !slot.attribute();
    }

    /// Live texture in a slot, if any
    pub fn map(&self, slot: MapSlot) -> Option<Arc<Texture>> {
        self.maps[slot.unit() as usize]
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Shader-variant bits this material contributes
    pub fn attributes(&self) -> MaterialAttributes {
        self.attributes
    }

    /// Whether this material participates in lighting
    pub fn is_lit(&self) -> bool {
        self.attributes.contains(MaterialAttributes::LIGHTING)
    }

    /// Upload scalar parameters and bind maps to their fixed units
    ///
    /// The camera position is needed for view-dependent terms (specular,
    /// environment reflection).
    pub fn send_to_shader(
        &self,
        backend: &mut dyn RenderBackend,
        program: ProgramId,
        camera_position: Vec3,
    ) {
        if self.is_lit() {
            backend.set_uniform_vec3(program, "u_material.ambient", self.ambient.as_rgb_f32());
            backend.set_uniform_vec3(program, "u_material.diffuse", self.diffuse.as_rgb_f32());
            backend.set_uniform_vec3(program, "u_material.specular", self.specular.as_rgb_f32());
            backend.set_uniform_vec3(program, "u_material.emission", self.emission.as_rgb_f32());
            backend.set_uniform_f32(program, "u_material.shininess", self.shininess);
        }

        if self
            .attributes
            .intersects(MaterialAttributes::ENVIRONMENT_MAP | MaterialAttributes::REFLECTION_MAP)
        {
            backend.set_uniform_f32(program, "u_material.reflectivity", self.reflectivity);
            backend.set_uniform_vec3(program, "u_camera_position", camera_position);
        } else if self.is_lit() {
            backend.set_uniform_vec3(program, "u_camera_position", camera_position);
        }

        for slot in MapSlot::ALL {
            if let Some(texture) = self.map(slot) {
                backend.bind_texture(program, slot.uniform_name(), texture.id(), slot.unit());
            }
        }
    }
}

impl Resource for Material {
    fn name(&self) -> &str {
        &self.name
    }
}
