//! Scene graph nodes

use crate::foundation::math::Transform;
use slotmap::new_key_type;

new_key_type! {
    /// Generational handle to a scene object
    pub struct ObjectKey;
}

/// A node in the transform hierarchy
///
/// Components never hold an `&Object`; they hold the [`ObjectKey`] and
/// resolve it per query, so a destroyed node is detectable in O(1).
#[derive(Debug)]
pub struct Object {
    /// Stable string id for lookups and serialization
    pub id: String,
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Active flag; inactive nodes (and their subtrees) are skipped
    pub active: bool,

    pub(crate) parent: Option<ObjectKey>,
    pub(crate) children: Vec<ObjectKey>,
}

impl Object {
    pub(crate) fn new(id: impl Into<String>, parent: Option<ObjectKey>) -> Self {
        Self {
            id: id.into(),
            transform: Transform::identity(),
            active: true,
            parent,
            children: Vec::new(),
        }
    }

    /// Parent node, if any
    pub fn parent(&self) -> Option<ObjectKey> {
        self.parent
    }

    /// Child nodes in creation order
    pub fn children(&self) -> &[ObjectKey] {
        &self.children
    }
}
