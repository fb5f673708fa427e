//! The transform hierarchy
//!
//! The renderer consumes the scene through a narrow surface: world
//! transform, world position, facing direction, and the active flag.
//! Stale keys answer conservatively (identity transform, inactive).

use crate::foundation::math::{Mat4, Transform, Vec3, Vec4};
use crate::scene::object::{Object, ObjectKey};
use slotmap::SlotMap;

/// Arena-backed scene graph
#[derive(Debug, Default)]
pub struct Scene {
    objects: SlotMap<ObjectKey, Object>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root-level object
    pub fn create_object(&mut self, id: impl Into<String>) -> ObjectKey {
        self.objects.insert(Object::new(id, None))
    }

    /// Create a child of an existing object
    ///
    /// Falls back to a root object when the parent key is stale.
    pub fn create_child(&mut self, parent: ObjectKey, id: impl Into<String>) -> ObjectKey {
        if !self.objects.contains_key(parent) {
            log::warn!("stale parent key, creating root object instead");
            return self.create_object(id);
        }
        let key = self.objects.insert(Object::new(id, Some(parent)));
        if let Some(parent_obj) = self.objects.get_mut(parent) {
            parent_obj.children.push(key);
        }
        key
    }

    /// Remove an object and its whole subtree
    pub fn remove_object(&mut self, key: ObjectKey) {
        let Some(object) = self.objects.remove(key) else {
            return;
        };
        if let Some(parent) = object.parent.and_then(|p| self.objects.get_mut(p)) {
            parent.children.retain(|c| *c != key);
        }
        for child in object.children {
            self.remove_subtree(child);
        }
    }

    fn remove_subtree(&mut self, key: ObjectKey) {
        if let Some(object) = self.objects.remove(key) {
            for child in object.children {
                self.remove_subtree(child);
            }
        }
    }

    /// Whether a key still refers to a live object
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    /// Borrow an object
    pub fn get(&self, key: ObjectKey) -> Option<&Object> {
        self.objects.get(key)
    }

    /// Mutably borrow an object
    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut Object> {
        self.objects.get_mut(key)
    }

    /// Mutably borrow an object's local transform
    pub fn transform_mut(&mut self, key: ObjectKey) -> Option<&mut Transform> {
        self.objects.get_mut(key).map(|o| &mut o.transform)
    }

    /// Find the first object with a given string id
    pub fn find_by_id(&self, id: &str) -> Option<ObjectKey> {
        self.objects
            .iter()
            .find(|(_, object)| object.id == id)
            .map(|(key, _)| key)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// World transform by walking the parent chain; identity when stale
    pub fn global_transform(&self, key: ObjectKey) -> Mat4 {
        let Some(object) = self.objects.get(key) else {
            return Mat4::identity();
        };
        let local = object.transform.to_matrix();
        match object.parent {
            Some(parent) => self.global_transform(parent) * local,
            None => local,
        }
    }

    /// World-space position; origin when stale
    pub fn global_position(&self, key: ObjectKey) -> Vec3 {
        let m = self.global_transform(key);
        (m * Vec4::new(0.0, 0.0, 0.0, 1.0)).xyz()
    }

    /// World-space facing direction (-Z through the rotation chain)
    pub fn global_front(&self, key: ObjectKey) -> Vec3 {
        let m = self.global_transform(key);
        (m * Vec4::new(0.0, 0.0, -1.0, 0.0)).xyz().normalize()
    }

    /// Active iff the object and every ancestor are active; stale keys are inactive
    pub fn is_active(&self, key: ObjectKey) -> bool {
        let Some(object) = self.objects.get(key) else {
            return false;
        };
        if !object.active {
            return false;
        }
        object.parent.map_or(true, |parent| self.is_active(parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_global_transform_composes_parent_chain() {
        let mut scene = Scene::new();
        let parent = scene.create_object("parent");
        let child = scene.create_child(parent, "child");

        scene.transform_mut(parent).unwrap().position = Vec3::new(1.0, 0.0, 0.0);
        scene.transform_mut(child).unwrap().position = Vec3::new(0.0, 2.0, 0.0);

        assert_relative_eq!(
            scene.global_position(child),
            Vec3::new(1.0, 2.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_stale_key_answers_conservatively() {
        let mut scene = Scene::new();
        let key = scene.create_object("o");
        scene.remove_object(key);

        assert!(!scene.is_active(key));
        assert_relative_eq!(scene.global_transform(key), Mat4::identity());
    }

    #[test]
    fn test_inactive_parent_deactivates_subtree() {
        let mut scene = Scene::new();
        let parent = scene.create_object("parent");
        let child = scene.create_child(parent, "child");

        assert!(scene.is_active(child));
        scene.get_mut(parent).unwrap().active = false;
        assert!(!scene.is_active(child));
    }

    #[test]
    fn test_remove_object_takes_subtree() {
        let mut scene = Scene::new();
        let parent = scene.create_object("parent");
        let child = scene.create_child(parent, "child");
        let grandchild = scene.create_child(child, "grandchild");

        scene.remove_object(child);
        assert!(scene.contains(parent));
        assert!(!scene.contains(child));
        assert!(!scene.contains(grandchild));
        assert!(scene.get(parent).unwrap().children().is_empty());
    }

    #[test]
    fn test_find_by_id() {
        let mut scene = Scene::new();
        let key = scene.create_object("camera_rig");
        assert_eq!(scene.find_by_id("camera_rig"), Some(key));
        assert_eq!(scene.find_by_id("missing"), None);
    }
}
