//! Headless recording backend
//!
//! Implements [`RenderBackend`] without a GPU: every call is recorded so
//! tests and headless drivers can assert on compiled-program counts, draw
//! calls, uniform values, and target bindings. Failure injection knobs
//! cover the recoverable error paths (compile failure, target allocation
//! failure).

use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::render::backend::{
    BackendResult, ProgramId, RenderBackend, RenderError, TargetId, TextureId,
};
use crate::resources::texture::TextureFormat;
use std::collections::{HashMap, HashSet};

/// A recorded uniform value
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Float uniform
    F32(f32),
    /// Integer uniform
    I32(i32),
    /// Boolean uniform
    Bool(bool),
    /// vec2 uniform
    Vec2([f32; 2]),
    /// vec3 uniform
    Vec3([f32; 3]),
    /// mat4 uniform
    Mat4(Box<Mat4>),
    /// mat4 array uniform
    Mat4Array(Vec<Mat4>),
    /// Sampler binding: (texture, unit)
    Sampler(TextureId, u32),
}

/// GPU-free backend recording every call for inspection
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u32,

    programs: HashSet<ProgramId>,
    textures: HashSet<TextureId>,
    targets: HashMap<TargetId, TextureId>,

    /// Per-program uniform log, keyed by uniform name
    pub uniforms: HashMap<(ProgramId, String), UniformValue>,

    /// Number of programs compiled so far
    pub programs_compiled: u32,
    /// Number of draw calls issued so far
    pub draw_calls: u32,
    /// Currently bound program, if any
    pub bound_program: Option<ProgramId>,
    /// Currently bound off-screen target, if any
    pub bound_target: Option<TargetId>,
    /// Depth test state
    pub depth_test: bool,
    /// Face culling state
    pub face_cull: bool,
    /// Depth clears issued so far
    pub depth_clears: u32,
    /// Constant vertex attributes by location
    pub constant_attributes: HashMap<u32, [f32; 4]>,
    /// Instance matrices by base location
    pub instance_matrices: HashMap<u32, Mat4>,

    /// Fail the next `compile_program` call
    pub fail_next_compile: bool,
    /// Fail the next `create_render_target` call
    pub fail_next_target: bool,
    /// Result `validate_program` reports
    pub validate_result: bool,
}

impl HeadlessBackend {
    /// Create a fresh backend
    pub fn new() -> Self {
        Self {
            validate_result: true,
            ..Self::default()
        }
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Look up a recorded uniform on a program
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(&(program, name.to_owned()))
    }

    /// Whether the target handle is still alive
    pub fn target_exists(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    /// Whether the texture handle is still alive
    pub fn texture_exists(&self, texture: TextureId) -> bool {
        self.textures.contains(&texture)
    }
}

impl RenderBackend for HeadlessBackend {
    fn compile_program(
        &mut self,
        name: &str,
        _vertex: &str,
        _geometry: Option<&str>,
        _fragment: &str,
    ) -> BackendResult<ProgramId> {
        if self.fail_next_compile {
            self.fail_next_compile = false;
            return Err(RenderError::ProgramBuild {
                name: name.to_owned(),
                reason: "injected compile failure".into(),
            });
        }

        let id = ProgramId(self.next());
        self.programs.insert(id);
        self.programs_compiled += 1;
        Ok(id)
    }

    fn validate_program(&mut self, program: ProgramId) -> bool {
        self.programs.contains(&program) && self.validate_result
    }

    fn bind_program(&mut self, program: ProgramId) {
        self.bound_program = Some(program);
    }

    fn set_uniform_f32(&mut self, program: ProgramId, name: &str, value: f32) {
        self.uniforms
            .insert((program, name.to_owned()), UniformValue::F32(value));
    }

    fn set_uniform_i32(&mut self, program: ProgramId, name: &str, value: i32) {
        self.uniforms
            .insert((program, name.to_owned()), UniformValue::I32(value));
    }

    fn set_uniform_bool(&mut self, program: ProgramId, name: &str, value: bool) {
        self.uniforms
            .insert((program, name.to_owned()), UniformValue::Bool(value));
    }

    fn set_uniform_vec2(&mut self, program: ProgramId, name: &str, value: Vec2) {
        self.uniforms
            .insert((program, name.to_owned()), UniformValue::Vec2([value.x, value.y]));
    }

    fn set_uniform_vec3(&mut self, program: ProgramId, name: &str, value: Vec3) {
        self.uniforms.insert(
            (program, name.to_owned()),
            UniformValue::Vec3([value.x, value.y, value.z]),
        );
    }

    fn set_uniform_mat4(&mut self, program: ProgramId, name: &str, value: &Mat4) {
        self.uniforms
            .insert((program, name.to_owned()), UniformValue::Mat4(Box::new(*value)));
    }

    fn set_uniform_mat4_array(&mut self, program: ProgramId, name: &str, values: &[Mat4]) {
        self.uniforms.insert(
            (program, name.to_owned()),
            UniformValue::Mat4Array(values.to_vec()),
        );
    }

    fn bind_texture(&mut self, program: ProgramId, name: &str, texture: TextureId, unit: u32) {
        self.uniforms.insert(
            (program, name.to_owned()),
            UniformValue::Sampler(texture, unit),
        );
    }

    fn create_texture(
        &mut self,
        _size: (u32, u32),
        _format: TextureFormat,
    ) -> BackendResult<TextureId> {
        let id = TextureId(self.next());
        self.textures.insert(id);
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn create_render_target(
        &mut self,
        size: (u32, u32),
        format: TextureFormat,
    ) -> BackendResult<(TargetId, TextureId)> {
        if self.fail_next_target {
            self.fail_next_target = false;
            return Err(RenderError::TargetAllocation {
                width: size.0,
                height: size.1,
                format,
                reason: "injected allocation failure".into(),
            });
        }

        let texture = TextureId(self.next());
        self.textures.insert(texture);
        let target = TargetId(self.next());
        self.targets.insert(target, texture);
        Ok((target, texture))
    }

    fn destroy_render_target(&mut self, target: TargetId) {
        if let Some(texture) = self.targets.remove(&target) {
            self.textures.remove(&texture);
        }
        if self.bound_target == Some(target) {
            self.bound_target = None;
        }
    }

    fn bind_render_target(&mut self, target: TargetId) -> bool {
        if self.targets.contains_key(&target) {
            self.bound_target = Some(target);
            true
        } else {
            false
        }
    }

    fn unbind_render_target(&mut self) {
        self.bound_target = None;
    }

    fn clear_depth(&mut self) {
        self.depth_clears += 1;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_face_cull(&mut self, enabled: bool) {
        self.face_cull = enabled;
    }

    fn bind_vertex_data(&mut self, _bytes: &[u8], _stride: u32) {}

    fn bind_index_data(&mut self, _indices: &[u32]) {}

    fn set_instance_attribute_mat4(&mut self, base_location: u32, value: &Mat4) {
        self.instance_matrices.insert(base_location, *value);
    }

    fn set_constant_vertex_attribute(&mut self, location: u32, value: [f32; 4]) {
        self.constant_attributes.insert(location, value);
    }

    fn draw_indexed(&mut self, _index_count: u32) {
        self.draw_calls += 1;
    }

    fn draw_arrays(&mut self, _vertex_count: u32) {
        self.draw_calls += 1;
    }

    fn max_texture_units(&self) -> u32 {
        32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_and_draw_counters() {
        let mut backend = HeadlessBackend::new();
        let program = backend
            .compile_program("test", "void main(){}", None, "void main(){}")
            .unwrap();
        backend.bind_program(program);
        backend.draw_indexed(36);
        assert_eq!(backend.programs_compiled, 1);
        assert_eq!(backend.draw_calls, 1);
        assert_eq!(backend.bound_program, Some(program));
    }

    #[test]
    fn test_injected_compile_failure() {
        let mut backend = HeadlessBackend::new();
        backend.fail_next_compile = true;
        assert!(backend
            .compile_program("bad", "", None, "")
            .is_err());
        // Failure is one-shot
        assert!(backend.compile_program("good", "", None, "").is_ok());
    }

    #[test]
    fn test_target_lifecycle() {
        let mut backend = HeadlessBackend::new();
        let (target, texture) = backend
            .create_render_target((512, 512), TextureFormat::Depth16)
            .unwrap();
        assert!(backend.bind_render_target(target));
        backend.destroy_render_target(target);
        assert!(!backend.bind_render_target(target));
        assert!(!backend.texture_exists(texture));
        assert_eq!(backend.bound_target, None);
    }
}
