//! Mesh geometry resources
//!
//! Meshes are plain CPU-side vertex/index data; the backend receives them
//! as byte slices at draw time. A mesh may optionally carry a per-vertex
//! color channel — when it doesn't, the drawable's fallback color is
//! pushed as a constant attribute instead.

use crate::foundation::bounds::Bounds;
use crate::foundation::math::Vec3;
use crate::resources::resource::Resource;

/// 3D vertex layout shared by every mesh
///
/// `#[repr(C)]` keeps the layout stable for byte-slice upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    /// Optional per-vertex RGBA color channel
    colors: Option<Vec<[f32; 4]>>,
    indices: Vec<u32>,
    bounds: Bounds,
}

impl Mesh {
    /// Create a mesh from vertex and index data
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let positions: Vec<Vec3> = vertices.iter().map(|v| Vec3::from(v.position)).collect();
        let bounds = Bounds::from_points(&positions);
        Self {
            name: name.into(),
            vertices,
            colors: None,
            indices,
            bounds,
        }
    }

    /// Attach a per-vertex color channel
    ///
    /// The channel length must match the vertex count; a mismatched
    /// channel is dropped with a warning.
    pub fn with_colors(mut self, colors: Vec<[f32; 4]>) -> Self {
        if colors.len() == self.vertices.len() {
            self.colors = Some(colors);
        } else {
            log::warn!(
                "mesh '{}': color channel length {} does not match vertex count {}, dropping",
                self.name,
                colors.len(),
                self.vertices.len()
            );
        }
        self
    }

    /// Axis-aligned unit-origin cube with the given edge length
    pub fn cube(name: impl Into<String>, size: f32) -> Self {
        let h = size * 0.5;
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
            ([0.0, 0.0, -1.0], [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
            ([1.0, 0.0, 0.0], [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]),
            ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
            ([0.0, 1.0, 0.0], [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]),
            ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in &faces {
            let base = vertices.len() as u32;
            let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
            for (corner, uv) in corners.iter().zip(uvs) {
                vertices.push(Vertex::new(*corner, *normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(name, vertices, indices)
    }

    /// Unit quad in the XY plane facing +Z
    pub fn quad(name: impl Into<String>, size: f32) -> Self {
        let h = size * 0.5;
        let vertices = vec![
            Vertex::new([-h, -h, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([h, -h, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([h, h, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([-h, h, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ];
        Self::new(name, vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Vertex list
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Raw vertex bytes for backend upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Vertex stride in bytes
    pub fn vertex_stride() -> u32 {
        std::mem::size_of::<Vertex>() as u32
    }

    /// Index list; empty for non-indexed meshes
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Number of indices
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Whether this mesh carries a per-vertex color channel
    pub fn has_vertex_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Model-space bounding box
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Resource for Mesh {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_geometry() {
        let cube = Mesh::cube("cube", 2.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_relative_eq!(cube.bounds().min, Vec3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(cube.bounds().max, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_color_channel_length_must_match() {
        let quad = Mesh::quad("quad", 1.0).with_colors(vec![[1.0, 0.0, 0.0, 1.0]; 4]);
        assert!(quad.has_vertex_colors());

        let mismatched = Mesh::quad("quad2", 1.0).with_colors(vec![[1.0, 0.0, 0.0, 1.0]; 3]);
        assert!(!mismatched.has_vertex_colors());
    }

    #[test]
    fn test_vertex_bytes_size() {
        let quad = Mesh::quad("quad", 1.0);
        assert_eq!(
            quad.vertex_bytes().len(),
            quad.vertices().len() * Mesh::vertex_stride() as usize
        );
    }
}
