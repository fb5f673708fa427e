//! Mesh + material aggregate
//!
//! A model observes its mesh weakly and owns its material by value (a
//! shared handle). The attribute bitmask that drives shader selection is
//! derived on query — it is never stored, so it can't go stale when the
//! material changes.

use crate::resources::material::{Material, MaterialAttributes};
use crate::resources::mesh::Mesh;
use std::sync::{Arc, Weak};

/// A drawable's mesh/material pairing
#[derive(Debug, Clone)]
pub struct Model {
    mesh: Weak<Mesh>,
    material: Option<Arc<Material>>,
}

impl Model {
    /// Create a model referencing a mesh and owning a material handle
    pub fn new(mesh: &Arc<Mesh>, material: Arc<Material>) -> Self {
        Self {
            mesh: Arc::downgrade(mesh),
            material: Some(material),
        }
    }

    /// An empty model; invalid until a mesh and material are set
    pub fn empty() -> Self {
        Self {
            mesh: Weak::new(),
            material: None,
        }
    }

    /// Live mesh, if the reference hasn't expired
    pub fn mesh(&self) -> Option<Arc<Mesh>> {
        self.mesh.upgrade()
    }

    /// Replace the observed mesh
    pub fn set_mesh(&mut self, mesh: &Arc<Mesh>) {
        self.mesh = Arc::downgrade(mesh);
    }

    /// Material handle, if set
    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    /// Replace the material
    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = Some(material);
    }

    /// A model is valid iff both the mesh and the material are live
    pub fn is_valid(&self) -> bool {
        self.mesh.strong_count() > 0 && self.material.is_some()
    }

    /// Shader-variant bits derived from the current material
    pub fn attributes(&self) -> MaterialAttributes {
        self.material
            .as_ref()
            .map_or_else(MaterialAttributes::empty, |m| m.attributes())
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_model_is_invalid() {
        assert!(!Model::empty().is_valid());
    }

    #[test]
    fn test_model_valid_with_live_refs() {
        let mesh = Arc::new(Mesh::cube("cube", 1.0));
        let material = Arc::new(Material::new("m").with_phong());
        let model = Model::new(&mesh, material);
        assert!(model.is_valid());
        assert!(model.attributes().contains(MaterialAttributes::PHONG));
    }

    #[test]
    fn test_dropping_mesh_invalidates_model() {
        let mesh = Arc::new(Mesh::cube("cube", 1.0));
        let model = Model::new(&mesh, Arc::new(Material::new("m")));
        drop(mesh);
        assert!(!model.is_valid());
        assert!(model.mesh().is_none());
    }

    #[test]
    fn test_attributes_follow_material_swap() {
        let mesh = Arc::new(Mesh::cube("cube", 1.0));
        let mut model = Model::new(&mesh, Arc::new(Material::new("unlit")));
        assert!(model.attributes().is_empty());

        model.set_material(Arc::new(Material::new("lit").with_phong()));
        assert!(model.attributes().contains(MaterialAttributes::LIGHTING));
    }
}
