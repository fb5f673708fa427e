//! Persisted component state
//!
//! Scene files record components as flat JSON objects. The structs here
//! mirror that form exactly: colors as packed RGBA32 integers, float
//! parameters as IEEE floats, light types as stable numeric tags. A
//! capture/apply round trip through JSON must be bit-exact.

use crate::foundation::color::Color;
use crate::render::backend::RenderBackend;
use crate::render::drawable::Drawable;
use crate::render::light::{LightSource, LightType};
use crate::resources::{Resource, ResourceManager};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State persistence errors
#[derive(Debug, Error)]
pub enum StateError {
    /// The persisted light type tag is unknown
    #[error("unknown light type tag {0}")]
    UnknownLightType(u32),

    /// The persisted type tag does not match the live component
    #[error("state is for light type {expected}, component is {actual}")]
    TypeMismatch {
        /// Tag recorded in the state
        expected: u32,
        /// Tag of the live component
        actual: u32,
    },
}

/// Persisted form of a [`LightSource`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSourceState {
    /// Numeric light type tag (0 point, 1 directional, 2 spot)
    #[serde(rename = "type")]
    pub light_type: u32,
    /// Component id
    pub id: String,
    /// Ambient/diffuse/specular as packed RGBA32
    pub intensities: [u32; 3],
    /// Constant/linear/quadratic coefficients
    pub attenuation: [f32; 3],
    /// Inner/outer cone angles in radians
    pub cutoff: [f32; 2],
    /// Render mask
    pub mask: u32,
    /// Whether a shadow map is owned
    pub castshadows: bool,
}

impl LightSourceState {
    /// Capture a live light's persisted fields
    pub fn capture(light: &LightSource) -> Self {
        use crate::render::light::IntensitySlot;
        Self {
            light_type: light.light_type().as_u32(),
            id: light.id().to_owned(),
            intensities: [
                light.intensity(IntensitySlot::Ambient).as_packed(),
                light.intensity(IntensitySlot::Diffuse).as_packed(),
                light.intensity(IntensitySlot::Specular).as_packed(),
            ],
            attenuation: light.attenuation(),
            cutoff: light.cutoff(),
            mask: light.mask(),
            castshadows: light.casts_shadows(),
        }
    }

    /// Apply this state to a live light of the same type
    ///
    /// Shadow casting is toggled through the backend so the target is
    /// allocated or released to match the recorded flag.
    pub fn apply(
        &self,
        light: &mut LightSource,
        backend: &mut dyn RenderBackend,
        shadow_resolution: u32,
    ) -> Result<(), StateError> {
        let recorded = LightType::from_u32(self.light_type)
            .ok_or(StateError::UnknownLightType(self.light_type))?;
        if recorded != light.light_type() {
            return Err(StateError::TypeMismatch {
                expected: self.light_type,
                actual: light.light_type().as_u32(),
            });
        }

        light.set_intensities(
            Color::from_packed(self.intensities[0]),
            Color::from_packed(self.intensities[1]),
            Color::from_packed(self.intensities[2]),
        );
        light.set_attenuation(self.attenuation[0], self.attenuation[1], self.attenuation[2]);
        light.set_cutoff(self.cutoff[0], self.cutoff[1]);
        light.set_mask(self.mask);
        light.set_cast_shadows(self.castshadows, backend, shadow_resolution);
        Ok(())
    }
}

/// Persisted form of a [`Drawable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableState {
    /// Component id
    pub id: String,
    /// Ids of the layers the drawable was bound to
    pub layers: Vec<String>,
    /// Resolved shader name, if it is an authorable (serializable) shader
    pub shader: Option<String>,
    /// Mesh registry name
    pub mesh: Option<String>,
}

impl DrawableState {
    /// Capture a drawable's persisted fields
    ///
    /// `layer_ids` are resolved by the caller (the renderer owns the
    /// key-to-id mapping). Derived shader permutations are not recorded.
    pub fn capture(drawable: &Drawable, layer_ids: Vec<String>) -> Self {
        let shader = drawable
            .resolved_shader()
            .filter(|s| s.should_serialize())
            .map(|s| s.name().to_owned());
        let mesh = drawable.model().mesh().map(|m| m.name().to_owned());
        Self {
            id: drawable.id().to_owned(),
            layers: layer_ids,
            shader,
            mesh,
        }
    }

    /// Re-point the drawable's mesh at the named registry entry
    ///
    /// Layer rebinding is the renderer's job; a missing mesh name is a
    /// warning, not an error.
    pub fn apply(&self, drawable: &mut Drawable, resources: &ResourceManager) {
        if let Some(name) = &self.mesh {
            if let Some(mesh) = resources.meshes.get(name) {
                drawable.model_mut().set_mesh(&mesh);
            } else {
                log::warn!("persisted mesh '{name}' is not loaded, keeping current mesh");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessBackend;
    use crate::render::light::IntensitySlot;
    use crate::scene::Scene;

    fn scenario_light(scene: &mut Scene) -> LightSource {
        let object = scene.create_object("light");
        let mut light = LightSource::new(object, "lamp", LightType::Point);
        light.set_intensities(
            Color::from_packed(0x0000_00FF),
            Color::from_packed(0xFFFF_FFFF),
            Color::from_packed(0xFFFF_FFFF),
        );
        light.set_attenuation(1.0, 4.5, 75.0);
        light.set_cutoff(0.17, 0.17);
        light.set_mask(1);
        light
    }

    #[test]
    fn test_light_state_json_round_trip() {
        let mut backend = HeadlessBackend::new();
        let mut scene = Scene::new();
        let mut light = scenario_light(&mut scene);
        light.set_cast_shadows(true, &mut backend, 512);

        let state = LightSourceState::capture(&light);
        let json = serde_json::to_string(&state).unwrap();
        let parsed: LightSourceState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);

        let mut restored = LightSource::new(light.object(), "lamp", LightType::Point);
        parsed.apply(&mut restored, &mut backend, 512).unwrap();

        assert_eq!(
            restored.intensity(IntensitySlot::Ambient).as_packed(),
            0x0000_00FF
        );
        assert_eq!(
            restored.intensity(IntensitySlot::Diffuse).as_packed(),
            0xFFFF_FFFF
        );
        assert_eq!(restored.attenuation(), [1.0, 4.5, 75.0]);
        assert_eq!(restored.cutoff(), [0.17, 0.17]);
        assert_eq!(restored.mask(), 1);
        assert!(restored.casts_shadows());
    }

    #[test]
    fn test_type_tag_is_checked_on_apply() {
        let mut backend = HeadlessBackend::new();
        let mut scene = Scene::new();
        let light = scenario_light(&mut scene);
        let state = LightSourceState::capture(&light);

        let mut wrong = LightSource::new(light.object(), "lamp", LightType::Spot);
        assert!(state.apply(&mut wrong, &mut backend, 512).is_err());
    }

    #[test]
    fn test_persisted_json_field_names() {
        let mut scene = Scene::new();
        let light = scenario_light(&mut scene);
        let json = serde_json::to_value(LightSourceState::capture(&light)).unwrap();

        assert_eq!(json["type"], 0);
        assert_eq!(json["intensities"][0], 255);
        assert_eq!(json["mask"], 1);
        assert_eq!(json["castshadows"], false);
    }

    #[test]
    fn test_drawable_state_skips_derived_shaders() {
        use crate::render::light::MaxLights;
        use crate::render::shader_assembler::ShaderAssembler;
        use crate::resources::mesh::Mesh;
        use crate::resources::material::Material;
        use crate::resources::model::Model;

        let mut backend = HeadlessBackend::new();
        let mut resources = ResourceManager::new(&mut backend).unwrap();
        let mut assembler = ShaderAssembler::new(MaxLights::default(), false);
        let mut scene = Scene::new();

        let object = scene.create_object("o");
        let mut drawable = Drawable::new(object, "d");
        let mesh = resources.get_mesh("cube", || Ok(Mesh::cube("cube", 1.0)));
        let material = resources.get_material("m", || Ok(Material::new("m")));
        drawable.set_model(Model::new(&mesh, material));
        drawable.resolve_shader(&mut backend, &mut assembler, &mut resources);

        let state = DrawableState::capture(&drawable, vec!["main".into()]);
        assert_eq!(state.mesh.as_deref(), Some("cube"));
        // Assembled permutations carry should_serialize = false.
        assert_eq!(state.shader, None);
        assert_eq!(state.layers, vec!["main".to_owned()]);
    }
}
