//! Named resource registry
//!
//! One typed store per resource kind, create-on-miss semantics, and a
//! designated default/error resource per kind. Lookups never return an
//! absent value: when construction fails the caller receives the error
//! sentinel and can detect it by identity (`Arc::ptr_eq`), never by a
//! null check.

use crate::foundation::color::Color;
use crate::render::backend::{RenderBackend, RenderError};
use crate::resources::material::Material;
use crate::resources::mesh::Mesh;
use crate::resources::resource::Resource;
use crate::resources::shader::Shader;
use crate::resources::texture::Texture;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Resource registry errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A resource constructor failed
    #[error("failed to build resource '{name}': {reason}")]
    Build {
        /// Requested registry name
        name: String,
        /// Constructor-reported reason
        reason: String,
    },

    /// The backend rejected a required built-in resource at startup
    #[error("failed to build required built-in resource: {0}")]
    Builtin(#[from] RenderError),
}

/// Registry name of the designated error shader
pub const ERROR_SHADER_NAME: &str = "lumen_error_shader";
/// Registry name of the default mesh
pub const DEFAULT_MESH_NAME: &str = "lumen_default_mesh";
/// Registry name of the default material
pub const DEFAULT_MATERIAL_NAME: &str = "lumen_default_material";

const ERROR_VERTEX_SRC: &str = include_str!("../render/shaders/error.vert");
const ERROR_FRAGMENT_SRC: &str = include_str!("../render/shaders/error.frag");

/// Typed name-keyed store of shared resources
#[derive(Debug)]
pub struct ResourceStore<T> {
    entries: HashMap<String, Arc<T>>,
}

impl<T: Resource> ResourceStore<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a resource by name
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).cloned()
    }

    /// Pure existence check
    pub fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Register a resource under its own name, returning the shared handle
    ///
    /// Replaces any prior entry with that name; weak holders of the old
    /// entry expire once the last strong reference drops.
    pub fn insert(&mut self, resource: T) -> Arc<T> {
        let shared = Arc::new(resource);
        self.entries
            .insert(shared.name().to_owned(), Arc::clone(&shared));
        shared
    }

    /// Remove an entry; outstanding weak holders become expired
    pub fn unload(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Number of stored resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Process-wide named registry for meshes, materials, textures, and shaders
///
/// Explicitly constructed and passed by reference — tests build isolated
/// managers instead of sharing a global.
#[derive(Debug)]
pub struct ResourceManager {
    /// Mesh store
    pub meshes: ResourceStore<Mesh>,
    /// Material store
    pub materials: ResourceStore<Material>,
    /// Texture store
    pub textures: ResourceStore<Texture>,
    /// Shader store
    pub shaders: ResourceStore<Shader>,

    default_mesh: Arc<Mesh>,
    default_material: Arc<Material>,
    error_shader: Arc<Shader>,
}

impl ResourceManager {
    /// Create a manager and its built-in default/error resources
    ///
    /// The error shader is a required startup resource: if the backend
    /// cannot build it, engine startup fails.
    pub fn new(backend: &mut dyn RenderBackend) -> Result<Self, ResourceError> {
        let mut meshes = ResourceStore::new();
        let mut materials = ResourceStore::new();
        let mut shaders = ResourceStore::new();

        let default_mesh = meshes.insert(Mesh::cube(DEFAULT_MESH_NAME, 1.0));

        let mut default_material = Material::new(DEFAULT_MATERIAL_NAME);
        default_material.diffuse = Color::new(255, 0, 255, 255);
        let default_material = materials.insert(default_material);

        let mut error_shader = Shader::compile(
            ERROR_SHADER_NAME,
            backend,
            "#version 330 core\n",
            ERROR_VERTEX_SRC,
            None,
            ERROR_FRAGMENT_SRC,
        )?;
        error_shader.set_should_serialize(false);
        let error_shader = shaders.insert(error_shader);

        log::info!("resource manager initialized with built-in defaults");

        Ok(Self {
            meshes,
            materials,
            textures: ResourceStore::new(),
            shaders,
            default_mesh,
            default_material,
            error_shader,
        })
    }

    /// The designated default mesh sentinel
    pub fn default_mesh(&self) -> &Arc<Mesh> {
        &self.default_mesh
    }

    /// The designated default material sentinel
    pub fn default_material(&self) -> &Arc<Material> {
        &self.default_material
    }

    /// The designated error shader sentinel
    pub fn error_shader(&self) -> &Arc<Shader> {
        &self.error_shader
    }

    /// Get a mesh, constructing it on miss
    ///
    /// On construction failure the default mesh is returned; distinguish
    /// it by identity, not by absence.
    pub fn get_mesh(
        &mut self,
        name: &str,
        build: impl FnOnce() -> Result<Mesh, ResourceError>,
    ) -> Arc<Mesh> {
        if let Some(existing) = self.meshes.get(name) {
            return existing;
        }
        match build() {
            Ok(mesh) => self.meshes.insert(mesh),
            Err(e) => {
                log::error!("mesh '{name}' failed to load, substituting default: {e}");
                Arc::clone(&self.default_mesh)
            }
        }
    }

    /// Get a material, constructing it on miss
    pub fn get_material(
        &mut self,
        name: &str,
        build: impl FnOnce() -> Result<Material, ResourceError>,
    ) -> Arc<Material> {
        if let Some(existing) = self.materials.get(name) {
            return existing;
        }
        match build() {
            Ok(material) => self.materials.insert(material),
            Err(e) => {
                log::error!("material '{name}' failed to load, substituting default: {e}");
                Arc::clone(&self.default_material)
            }
        }
    }

    /// Get a shader, constructing it on miss
    ///
    /// On construction failure the error shader is returned.
    pub fn get_shader(
        &mut self,
        name: &str,
        build: impl FnOnce() -> Result<Shader, RenderError>,
    ) -> Arc<Shader> {
        if let Some(existing) = self.shaders.get(name) {
            return existing;
        }
        match build() {
            Ok(shader) => self.shaders.insert(shader),
            Err(e) => {
                log::error!("shader '{name}' failed to build, substituting error shader: {e}");
                Arc::clone(&self.error_shader)
            }
        }
    }

    /// Existence check across every store
    pub fn exists(&self, name: &str) -> bool {
        self.meshes.exists(name)
            || self.materials.exists(name)
            || self.textures.exists(name)
            || self.shaders.exists(name)
    }

    /// Remove a name from whichever store holds it
    pub fn unload(&mut self, name: &str) -> bool {
        self.meshes.unload(name)
            || self.materials.unload(name)
            || self.textures.unload(name)
            || self.shaders.unload(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessBackend;

    fn manager() -> (ResourceManager, HeadlessBackend) {
        let mut backend = HeadlessBackend::new();
        let manager = ResourceManager::new(&mut backend).unwrap();
        (manager, backend)
    }

    #[test]
    fn test_create_on_miss_then_reuse() {
        let (mut manager, _) = manager();
        let first = manager.get_mesh("quad", || Ok(Mesh::quad("quad", 1.0)));
        let second = manager.get_mesh("quad", || panic!("must not rebuild"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_build_returns_default_sentinel() {
        let (mut manager, _) = manager();
        let mesh = manager.get_mesh("missing", || {
            Err(ResourceError::Build {
                name: "missing".into(),
                reason: "file not found".into(),
            })
        });
        assert!(Arc::ptr_eq(&mesh, manager.default_mesh()));
        // The failure is not cached under the real key
        assert!(!manager.meshes.exists("missing"));
    }

    #[test]
    fn test_unload_expires_weak_holders() {
        let (mut manager, _) = manager();
        let mesh = manager.get_mesh("quad", || Ok(Mesh::quad("quad", 1.0)));
        let weak = Arc::downgrade(&mesh);
        drop(mesh);

        assert!(manager.unload("quad"));
        assert!(weak.upgrade().is_none());
        assert!(!manager.exists("quad"));
    }

    #[test]
    fn test_failed_shader_returns_error_sentinel() {
        let (mut manager, _) = manager();
        let shader = manager.get_shader("broken", || {
            Err(RenderError::ProgramBuild {
                name: "broken".into(),
                reason: "injected failure".into(),
            })
        });
        assert!(Arc::ptr_eq(&shader, manager.error_shader()));
        assert!(!manager.shaders.exists("broken"));
    }
}
