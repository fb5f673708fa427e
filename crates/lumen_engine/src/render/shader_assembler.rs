//! On-demand shader permutation assembly
//!
//! One uber-shader source pair is specialized per material attribute
//! bitmask by prepending preprocessor definitions. Compiled permutations
//! are cached weakly per bitmask: requesting the same bits returns the
//! same program without touching the compiler, and unloading the shader
//! resource drops the cache entry on the next request.

use crate::render::backend::RenderBackend;
use crate::render::light::MaxLights;
use crate::resources::material::MaterialAttributes;
use crate::resources::shader::Shader;
use crate::resources::ResourceManager;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

const UBER_VERTEX_SRC: &str = include_str!("shaders/uber.vert");
const UBER_FRAGMENT_SRC: &str = include_str!("shaders/uber.frag");
const DEPTH_VERTEX_SRC: &str = include_str!("shaders/depth.vert");
const DEPTH_FRAGMENT_SRC: &str = include_str!("shaders/depth.frag");
const DEPTH_POINT_VERTEX_SRC: &str = include_str!("shaders/depth_point.vert");
const DEPTH_POINT_GEOMETRY_SRC: &str = include_str!("shaders/depth_point.geom");
const DEPTH_POINT_FRAGMENT_SRC: &str = include_str!("shaders/depth_point.frag");

const VERSION_LINE: &str = "#version 330 core\n";

/// Attribute bit to preprocessor definition, in bit order
const DEFINITIONS: &[(MaterialAttributes, &str)] = &[
    (MaterialAttributes::LIGHTING, "LUMEN_LIGHTING"),
    (MaterialAttributes::DIFFUSE_MAP, "LUMEN_DIFFUSE_MAP"),
    (MaterialAttributes::DIFFUSE_ALPHA, "LUMEN_DIFFUSE_ALPHA"),
    (MaterialAttributes::SPECULAR_MAP, "LUMEN_SPECULAR_MAP"),
    (MaterialAttributes::EMISSION_MAP, "LUMEN_EMISSION_MAP"),
    (MaterialAttributes::ENVIRONMENT_MAP, "LUMEN_ENVIRONMENT_MAP"),
    (MaterialAttributes::REFLECTION_MAP, "LUMEN_REFLECTION_MAP"),
    (MaterialAttributes::OPACITY_MAP, "LUMEN_OPACITY_MAP"),
    (MaterialAttributes::GLOSS_MAP, "LUMEN_GLOSS_MAP"),
    (MaterialAttributes::PHONG, "LUMEN_PHONG"),
    (MaterialAttributes::RECORD_ENV, "LUMEN_RECORD_ENV"),
    (MaterialAttributes::SKY_BOX, "LUMEN_SKY_BOX"),
    (MaterialAttributes::SKY_SPHERE, "LUMEN_SKY_SPHERE"),
];

/// Per-bitmask shader permutation cache
#[derive(Debug)]
pub struct ShaderAssembler {
    max_lights: MaxLights,
    validate: bool,
    cache: HashMap<u32, Weak<Shader>>,
    depth_shader: Option<Arc<Shader>>,
    depth_point_shader: Option<Arc<Shader>>,
    definitions_built: u64,
}

impl ShaderAssembler {
    /// Create an empty assembler
    ///
    /// `validate` requests a backend validation pass after each link,
    /// logging (not failing) on validation warnings.
    pub fn new(max_lights: MaxLights, validate: bool) -> Self {
        Self {
            max_lights,
            validate,
            cache: HashMap::new(),
            depth_shader: None,
            depth_point_shader: None,
            definitions_built: 0,
        }
    }

    /// Registry name for a permutation bitmask
    pub fn shader_name(bits: u32) -> String {
        format!("lumen_shader_{bits}")
    }

    /// Get or build the permutation for an attribute bitmask
    ///
    /// Failed builds return the error shader and are never cached, so a
    /// later request retries the compile.
    pub fn get_shader(
        &mut self,
        attributes: MaterialAttributes,
        backend: &mut dyn RenderBackend,
        resources: &mut ResourceManager,
    ) -> Arc<Shader> {
        let bits = attributes.bits();
        if let Some(live) = self.cache.get(&bits).and_then(Weak::upgrade) {
            return live;
        }

        // Second chance: the permutation may already sit in the shader
        // store (e.g. loaded before this assembler indexed it).
        let name = Self::shader_name(bits);
        if let Some(stored) = resources.shaders.get(&name) {
            self.cache.insert(bits, Arc::downgrade(&stored));
            return stored;
        }

        let preamble = self.build_preamble(attributes);

        let shader = match Shader::compile(
            name.clone(),
            backend,
            &preamble,
            UBER_VERTEX_SRC,
            None,
            UBER_FRAGMENT_SRC,
        ) {
            Ok(mut shader) => {
                shader.set_should_serialize(false);
                resources.shaders.insert(shader)
            }
            Err(e) => {
                log::error!("shader permutation {bits:#x} failed to build: {e}");
                self.cache.remove(&bits);
                return Arc::clone(resources.error_shader());
            }
        };

        if self.validate && !backend.validate_program(shader.program()) {
            log::warn!("shader permutation {bits:#x} failed validation");
        }

        if attributes.contains(MaterialAttributes::LIGHTING) {
            // Cube samplers may not share a unit with 2D samplers even
            // when unused, so park every point shadow sampler on the
            // highest unit until a real map is bound.
            let park_unit = backend.max_texture_units().saturating_sub(1) as i32;
            for i in 0..self.max_lights.point {
                backend.set_uniform_i32(
                    shader.program(),
                    &format!("u_point_shadow_maps[{i}]"),
                    park_unit,
                );
            }
        }

        log::debug!("assembled shader permutation {bits:#x}");
        self.cache.insert(bits, Arc::downgrade(&shader));
        shader
    }

    /// Depth-only program for directional and spot shadow passes
    pub fn depth_shader(
        &mut self,
        backend: &mut dyn RenderBackend,
        resources: &mut ResourceManager,
    ) -> Arc<Shader> {
        if let Some(shader) = &self.depth_shader {
            return Arc::clone(shader);
        }
        let shader = Self::build_recorder(
            "lumen_depth_shader",
            backend,
            resources,
            DEPTH_VERTEX_SRC,
            None,
            DEPTH_FRAGMENT_SRC,
        );
        self.depth_shader = Some(Arc::clone(&shader));
        shader
    }

    /// Layered cubemap depth program for point shadow passes
    pub fn depth_point_shader(
        &mut self,
        backend: &mut dyn RenderBackend,
        resources: &mut ResourceManager,
    ) -> Arc<Shader> {
        if let Some(shader) = &self.depth_point_shader {
            return Arc::clone(shader);
        }
        let shader = Self::build_recorder(
            "lumen_depth_point_shader",
            backend,
            resources,
            DEPTH_POINT_VERTEX_SRC,
            Some(DEPTH_POINT_GEOMETRY_SRC),
            DEPTH_POINT_FRAGMENT_SRC,
        );
        self.depth_point_shader = Some(Arc::clone(&shader));
        shader
    }

    fn build_recorder(
        name: &str,
        backend: &mut dyn RenderBackend,
        resources: &mut ResourceManager,
        vertex: &str,
        geometry: Option<&str>,
        fragment: &str,
    ) -> Arc<Shader> {
        match Shader::compile(name, backend, VERSION_LINE, vertex, geometry, fragment) {
            Ok(mut shader) => {
                shader.set_should_serialize(false);
                resources.shaders.insert(shader)
            }
            Err(e) => {
                log::error!("depth recorder '{name}' failed to build: {e}");
                Arc::clone(resources.error_shader())
            }
        }
    }

    /// Total preamble builds; stable when requests hit the cache
    pub fn definitions_built(&self) -> u64 {
        self.definitions_built
    }

    /// Number of live cache entries
    pub fn cached_count(&self) -> usize {
        self.cache
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn build_preamble(&mut self, attributes: MaterialAttributes) -> String {
        self.definitions_built += 1;

        let mut preamble = String::from(VERSION_LINE);
        preamble.push_str(&format!(
            "#define LUMEN_MAX_POINT_LIGHTS {}\n",
            self.max_lights.point
        ));
        preamble.push_str(&format!(
            "#define LUMEN_MAX_DIRECTIONAL_LIGHTS {}\n",
            self.max_lights.directional
        ));
        preamble.push_str(&format!(
            "#define LUMEN_MAX_SPOT_LIGHTS {}\n",
            self.max_lights.spot
        ));
        for (bit, define) in DEFINITIONS {
            if attributes.contains(*bit) {
                preamble.push_str(&format!("#define {define}\n"));
            }
        }
        preamble
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessBackend;

    fn setup() -> (ShaderAssembler, HeadlessBackend, ResourceManager) {
        let mut backend = HeadlessBackend::new();
        let resources = ResourceManager::new(&mut backend).unwrap();
        let assembler = ShaderAssembler::new(MaxLights::default(), false);
        (assembler, backend, resources)
    }

    #[test]
    fn test_same_bitmask_shares_one_program() {
        let (mut assembler, mut backend, mut resources) = setup();
        let attrs = MaterialAttributes::LIGHTING | MaterialAttributes::PHONG;

        let compiled_before = backend.programs_compiled;
        let first = assembler.get_shader(attrs, &mut backend, &mut resources);
        let second = assembler.get_shader(attrs, &mut backend, &mut resources);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(backend.programs_compiled, compiled_before + 1);
    }

    #[test]
    fn test_empty_bitmask_is_a_valid_cached_permutation() {
        let (mut assembler, mut backend, mut resources) = setup();

        let first =
            assembler.get_shader(MaterialAttributes::empty(), &mut backend, &mut resources);
        assert_eq!(assembler.definitions_built(), 1);

        let second =
            assembler.get_shader(MaterialAttributes::empty(), &mut backend, &mut resources);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(assembler.definitions_built(), 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let (mut assembler, mut backend, mut resources) = setup();
        backend.fail_next_compile = true;

        let fallback =
            assembler.get_shader(MaterialAttributes::LIGHTING, &mut backend, &mut resources);
        assert!(Arc::ptr_eq(&fallback, resources.error_shader()));

        // A later request retries and succeeds.
        let retried =
            assembler.get_shader(MaterialAttributes::LIGHTING, &mut backend, &mut resources);
        assert!(!Arc::ptr_eq(&retried, resources.error_shader()));
    }

    #[test]
    fn test_unloaded_permutation_is_rebuilt_on_demand() {
        let (mut assembler, mut backend, mut resources) = setup();
        let attrs = MaterialAttributes::DIFFUSE_MAP;

        let first = assembler.get_shader(attrs, &mut backend, &mut resources);
        let name = ShaderAssembler::shader_name(attrs.bits());
        drop(first);
        assert!(resources.unload(&name));
        assert_eq!(assembler.cached_count(), 0);

        let rebuilt = assembler.get_shader(attrs, &mut backend, &mut resources);
        assert!(!Arc::ptr_eq(&rebuilt, resources.error_shader()));
        assert_eq!(assembler.definitions_built(), 2);
    }

    #[test]
    fn test_lighting_permutation_parks_point_shadow_samplers() {
        let (mut assembler, mut backend, mut resources) = setup();
        let shader =
            assembler.get_shader(MaterialAttributes::LIGHTING, &mut backend, &mut resources);

        let park_unit = (backend.max_texture_units() - 1) as i32;
        for i in 0..MaxLights::default().point {
            let name = format!("u_point_shadow_maps[{i}]");
            assert_eq!(
                backend.uniform(shader.program(), &name),
                Some(&crate::render::headless::UniformValue::I32(park_unit))
            );
        }
    }

    #[test]
    fn test_depth_recorders_are_built_once() {
        let (mut assembler, mut backend, mut resources) = setup();

        let first = assembler.depth_shader(&mut backend, &mut resources);
        let compiled_after_first = backend.programs_compiled;
        let second = assembler.depth_shader(&mut backend, &mut resources);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(backend.programs_compiled, compiled_after_first);

        let point = assembler.depth_point_shader(&mut backend, &mut resources);
        assert!(!Arc::ptr_eq(&point, &first));
    }
}
