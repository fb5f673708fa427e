//! Render-pass layers
//!
//! A layer aggregates a draw list, an optional camera, an optional
//! off-screen target, and bindings to other layers whose content it also
//! draws. The traversal itself runs in the renderer (it needs the
//! drawable and layer arenas); the layer owns the pass state and the
//! deferred sweep bookkeeping.

use crate::render::camera::CameraKey;
use crate::render::drawable::DrawableKey;
use crate::render::sweep::SweepList;
use crate::render::target::RenderTarget;
use slotmap::new_key_type;

new_key_type! {
    /// Generational handle to a layer in the renderer
    pub struct LayerKey;
}

/// One render pass: a draw list plus camera/target bindings
#[derive(Debug)]
pub struct Layer {
    id: String,
    active: bool,
    camera: Option<CameraKey>,
    target: Option<RenderTarget>,
    draw_list: SweepList<DrawableKey>,
    bound_layers: SweepList<LayerKey>,
}

impl Layer {
    /// Create an active, empty layer
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            active: true,
            camera: None,
            target: None,
            draw_list: SweepList::new(),
            bound_layers: SweepList::new(),
        }
    }

    /// Layer id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this layer draws at all
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable the layer
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Bound camera, if any
    pub fn camera(&self) -> Option<CameraKey> {
        self.camera
    }

    /// Bind a camera; the default camera is adopted on draw when unset
    pub fn set_camera(&mut self, camera: CameraKey) {
        self.camera = Some(camera);
    }

    pub(crate) fn adopt_camera(&mut self, camera: CameraKey) {
        if self.camera.is_none() {
            log::debug!("layer '{}': adopting default camera", self.id);
            self.camera = Some(camera);
        }
    }

    /// Off-screen target, if any
    pub fn target(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    /// Attach an off-screen target, returning any previous one
    pub fn set_target(&mut self, target: RenderTarget) -> Option<RenderTarget> {
        self.target.replace(target)
    }

    /// Detach the off-screen target
    pub fn take_target(&mut self) -> Option<RenderTarget> {
        self.target.take()
    }

    /// The layer's own draw list
    pub fn draw_list(&self) -> &SweepList<DrawableKey> {
        &self.draw_list
    }

    /// Mutable draw list (renderer traversal marks stale entries here)
    pub(crate) fn draw_list_mut(&mut self) -> &mut SweepList<DrawableKey> {
        &mut self.draw_list
    }

    /// Layers whose draw lists this layer also renders
    pub fn bound_layers(&self) -> &SweepList<LayerKey> {
        &self.bound_layers
    }

    pub(crate) fn bound_layers_mut(&mut self) -> &mut SweepList<LayerKey> {
        &mut self.bound_layers
    }

    pub(crate) fn add_drawable(&mut self, drawable: DrawableKey) {
        if !self.draw_list.contains(drawable) {
            self.draw_list.push(drawable);
        }
    }

    pub(crate) fn remove_drawable(&mut self, drawable: DrawableKey) -> bool {
        self.draw_list.remove(drawable)
    }

    /// Draw another layer's content in this layer's pass
    pub fn bind_layer(&mut self, layer: LayerKey) {
        if !self.bound_layers.contains(layer) {
            self.bound_layers.push(layer);
        }
    }

    /// Stop drawing another layer's content
    pub fn unbind_layer(&mut self, layer: LayerKey) -> bool {
        self.bound_layers.remove(layer)
    }

    /// Compact both lists if a traversal marked stale entries
    pub fn sweep_removed(
        &mut self,
        drawable_live: impl Fn(DrawableKey) -> bool,
        layer_live: impl Fn(LayerKey) -> bool,
    ) {
        self.draw_list.sweep(drawable_live);
        self.bound_layers.sweep(layer_live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_add_is_idempotent_and_ordered() {
        let mut drawables: SlotMap<DrawableKey, ()> = SlotMap::with_key();
        let a = drawables.insert(());
        let b = drawables.insert(());

        let mut layer = Layer::new("main");
        layer.add_drawable(a);
        layer.add_drawable(b);
        layer.add_drawable(a);

        assert_eq!(layer.draw_list().iter().collect::<Vec<_>>(), vec![a, b]);
        assert!(layer.remove_drawable(a));
        assert!(!layer.remove_drawable(a));
    }

    #[test]
    fn test_sweep_only_after_mark() {
        let mut drawables: SlotMap<DrawableKey, ()> = SlotMap::with_key();
        let a = drawables.insert(());
        let b = drawables.insert(());

        let mut layer = Layer::new("main");
        layer.add_drawable(a);
        layer.add_drawable(b);

        drawables.remove(a);
        layer.sweep_removed(|k| drawables.contains_key(k), |_| true);
        assert_eq!(layer.draw_list().len(), 2);

        layer.draw_list_mut().mark();
        layer.sweep_removed(|k| drawables.contains_key(k), |_| true);
        assert_eq!(layer.draw_list().iter().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_adopt_camera_only_when_unset() {
        let mut cameras: SlotMap<CameraKey, ()> = SlotMap::with_key();
        let explicit = cameras.insert(());
        let fallback = cameras.insert(());

        let mut layer = Layer::new("main");
        layer.adopt_camera(fallback);
        assert_eq!(layer.camera(), Some(fallback));

        let mut bound = Layer::new("bound");
        bound.set_camera(explicit);
        bound.adopt_camera(fallback);
        assert_eq!(bound.camera(), Some(explicit));
    }
}
