//! The render core: backend seam, shader assembly, and the frame path
//!
//! Control flow per frame: the renderer records every casting light's
//! shadow map, then runs each layer's pass. A layer resolves its camera
//! and target, traverses bound layers' draw lists and then its own, and
//! every live drawable resolves its shader permutation, pushes lights
//! and material state, and issues one draw call.

pub mod backend;
pub mod camera;
pub mod context;
pub mod drawable;
pub mod headless;
pub mod layer;
pub mod light;
pub mod light_uniforms;
pub mod renderer;
pub mod shader_assembler;
pub mod state;
pub mod sweep;
pub mod target;

pub use backend::{BackendResult, ProgramId, RenderBackend, RenderError, TargetId, TextureId};
pub use camera::{Camera, CameraKey, Projection, ViewInfo};
pub use context::RenderContext;
pub use drawable::{Drawable, DrawableFlags, DrawableKey, ShaderSlot};
pub use headless::HeadlessBackend;
pub use layer::{Layer, LayerKey};
pub use light::{
    AttenuationSlot, IntensitySlot, LightContainer, LightKey, LightSource, LightType, MaxLights,
};
pub use light_uniforms::LightUniformNames;
pub use renderer::{FrameStats, Renderer};
pub use shader_assembler::ShaderAssembler;
pub use state::{DrawableState, LightSourceState, StateError};
pub use sweep::SweepList;
pub use target::RenderTarget;
