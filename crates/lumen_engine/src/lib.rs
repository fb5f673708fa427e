//! Lumen: a component-based real-time 3D engine core
//!
//! The crate centers on the scene-graph/renderer binding: drawables,
//! lights, cameras, and layers are organized into render passes, matched
//! to shader permutations by material attribute fingerprint, and drawn
//! per frame with lighting, shadow mapping, and range-based light
//! culling.
//!
//! # Architecture
//!
//! - [`foundation`] — math aliases, packed colors, AABBs, frame timing
//! - [`settings`] — flat key-value tunables with TOML loading
//! - [`resources`] — `Arc`-shared named resources and their registry
//! - [`render`] — the backend seam, shader assembly, and the frame path
//! - [`scene`] — the transform hierarchy components attach to
//! - [`engine`] — the fixed-update/update/draw frame loop
//!
//! All render state lives in an explicitly owned [`render::RenderContext`]
//! passed by `&mut`; there are no global registries. Cross-references use
//! either `Weak` handles (resources) or slotmap generational keys
//! (components), so stale references are detectable in O(1).
//!
//! # Example
//!
//! ```
//! use lumen_engine::prelude::*;
//!
//! let mut engine = Engine::headless().unwrap();
//! let layer = engine.renderer.create_layer("main");
//!
//! let object = engine.scene.create_object("cube");
//! let mesh = engine
//!     .context
//!     .resources
//!     .get_mesh("cube", || Ok(Mesh::cube("cube", 1.0)));
//! let material = engine
//!     .context
//!     .resources
//!     .get_material("phong", || Ok(Material::new("phong").with_phong()));
//!
//! let mut drawable = Drawable::new(object, "cube");
//! drawable.set_model(Model::new(&mesh, material));
//! let key = engine.renderer.add_drawable(drawable);
//! engine.renderer.add_drawable_to_layer(layer, key);
//!
//! let stats = engine.run_frames(1);
//! assert_eq!(stats.draw_calls, 1);
//! ```

pub mod engine;
pub mod foundation;
pub mod render;
pub mod resources;
pub mod scene;
pub mod settings;

/// Commonly used types, re-exported for application code
pub mod prelude {
    pub use crate::engine::{Engine, EngineConfig, EngineError};
    pub use crate::foundation::bounds::Bounds;
    pub use crate::foundation::color::Color;
    pub use crate::foundation::math::{Mat4, Quat, Transform, Vec2, Vec3, Vec4};
    pub use crate::render::{
        AttenuationSlot, Camera, Drawable, DrawableFlags, FrameStats, IntensitySlot, Layer,
        LightContainer, LightSource, LightType, MaxLights, RenderBackend, RenderContext, Renderer,
        ViewInfo,
    };
    pub use crate::resources::{
        MapSlot, Material, MaterialAttributes, Mesh, Model, ResourceManager, Vertex,
    };
    pub use crate::scene::{Object, ObjectKey, Scene};
    pub use crate::settings::{SettingValue, Settings};
}
