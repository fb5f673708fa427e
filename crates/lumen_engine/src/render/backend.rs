//! Backend abstraction for the render core
//!
//! The engine core never talks to a graphics API directly. Everything it
//! needs — program compilation, uniform upload, render targets, draw
//! submission — goes through this trait, so the whole scene/layer/light
//! machinery can run against the headless backend in tests. Submission is
//! fire-and-forget; driver synchronization is the backend's problem.

use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::resources::texture::TextureFormat;
use thiserror::Error;

/// Handle to a compiled, linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Handle to a backend texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Handle to an off-screen render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

/// Rendering backend errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// Shader program compilation or linking failed
    #[error("shader program '{name}' failed to build: {reason}")]
    ProgramBuild {
        /// Resource name of the failing program
        name: String,
        /// Backend-reported reason
        reason: String,
    },

    /// Render target allocation failed
    #[error("render target allocation failed ({width}x{height}, {format:?}): {reason}")]
    TargetAllocation {
        /// Requested width in texels
        width: u32,
        /// Requested height in texels
        height: u32,
        /// Requested attachment format
        format: TextureFormat,
        /// Backend-reported reason
        reason: String,
    },

    /// A handle referred to a destroyed or foreign object
    #[error("invalid backend handle: {0}")]
    InvalidHandle(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Rendering backend trait
///
/// Uniform setters take the owning program so backends that need explicit
/// binding can defer it; `bind_program` still marks the active program for
/// subsequent draws.
pub trait RenderBackend {
    /// Compile and link a program from preprocessed GLSL sources
    fn compile_program(
        &mut self,
        name: &str,
        vertex: &str,
        geometry: Option<&str>,
        fragment: &str,
    ) -> BackendResult<ProgramId>;

    /// Validate a program against current pipeline state (debug aid)
    fn validate_program(&mut self, program: ProgramId) -> bool;

    /// Make a program active for subsequent draws
    fn bind_program(&mut self, program: ProgramId);

    /// Upload a float uniform
    fn set_uniform_f32(&mut self, program: ProgramId, name: &str, value: f32);

    /// Upload an integer uniform
    fn set_uniform_i32(&mut self, program: ProgramId, name: &str, value: i32);

    /// Upload a boolean uniform
    fn set_uniform_bool(&mut self, program: ProgramId, name: &str, value: bool);

    /// Upload a vec2 uniform
    fn set_uniform_vec2(&mut self, program: ProgramId, name: &str, value: Vec2);

    /// Upload a vec3 uniform
    fn set_uniform_vec3(&mut self, program: ProgramId, name: &str, value: Vec3);

    /// Upload a mat4 uniform
    fn set_uniform_mat4(&mut self, program: ProgramId, name: &str, value: &Mat4);

    /// Upload an array of mat4 uniforms
    fn set_uniform_mat4_array(&mut self, program: ProgramId, name: &str, values: &[Mat4]);

    /// Bind a texture to a sampler uniform at an explicit texture unit
    fn bind_texture(&mut self, program: ProgramId, name: &str, texture: TextureId, unit: u32);

    /// Create a texture without target attachment
    fn create_texture(&mut self, size: (u32, u32), format: TextureFormat)
        -> BackendResult<TextureId>;

    /// Destroy a texture
    fn destroy_texture(&mut self, texture: TextureId);

    /// Create an off-screen render target and its backing texture
    fn create_render_target(
        &mut self,
        size: (u32, u32),
        format: TextureFormat,
    ) -> BackendResult<(TargetId, TextureId)>;

    /// Destroy a render target and its backing texture
    fn destroy_render_target(&mut self, target: TargetId);

    /// Bind an off-screen target; returns false if the handle is stale
    fn bind_render_target(&mut self, target: TargetId) -> bool;

    /// Restore the default framebuffer
    fn unbind_render_target(&mut self);

    /// Clear the depth buffer of the bound target
    fn clear_depth(&mut self);

    /// Enable or disable depth testing (process-wide state)
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable or disable back-face culling (process-wide state)
    fn set_face_cull(&mut self, enabled: bool);

    /// Bind raw vertex data for the next draw
    fn bind_vertex_data(&mut self, bytes: &[u8], stride: u32);

    /// Bind index data for the next draw
    fn bind_index_data(&mut self, indices: &[u32]);

    /// Upload a mat4 as four per-instance vec4 attribute rows
    fn set_instance_attribute_mat4(&mut self, base_location: u32, value: &Mat4);

    /// Set a constant (non-array) vertex attribute value
    fn set_constant_vertex_attribute(&mut self, location: u32, value: [f32; 4]);

    /// Issue an indexed draw with the bound buffers
    fn draw_indexed(&mut self, index_count: u32);

    /// Issue a non-indexed draw with the bound vertex buffer
    fn draw_arrays(&mut self, vertex_count: u32);

    /// Number of texture units the backend exposes
    fn max_texture_units(&self) -> u32;
}
