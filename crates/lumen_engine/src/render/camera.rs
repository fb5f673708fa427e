//! Cameras and the per-draw view bundle

use crate::foundation::math::{orthographic, perspective, Mat4, Vec3};
use crate::scene::{ObjectKey, Scene};
use slotmap::new_key_type;

new_key_type! {
    /// Generational handle to a camera in the renderer
    pub struct CameraKey;
}

/// Projection model
#[derive(Debug, Clone, Copy)]
pub enum Projection {
    /// Perspective projection; `fov_y` in radians
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Width / height
        aspect: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
    /// Orthographic projection over a symmetric box
    Orthographic {
        /// Half extent along X
        half_width: f32,
        /// Half extent along Y
        half_height: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
}

/// A camera: projection plus an optional scene object for the view
#[derive(Debug)]
pub struct Camera {
    /// Scene object whose inverse world transform is the view matrix
    pub object: Option<ObjectKey>,
    /// Projection model
    pub projection: Projection,
}

impl Camera {
    /// Standard perspective camera, unattached
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            object: None,
            projection: Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            },
        }
    }

    /// Attach the camera to a scene object
    pub fn with_object(mut self, object: ObjectKey) -> Self {
        self.object = Some(object);
        self
    }

    /// Projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => perspective(fov_y, aspect, near, far),
            Projection::Orthographic {
                half_width,
                half_height,
                near,
                far,
            } => orthographic(
                -half_width,
                half_width,
                -half_height,
                half_height,
                near,
                far,
            ),
        }
    }

    /// View matrix: inverse of the attached object's world transform
    ///
    /// Identity when unattached or the object is gone (origin, facing -Z).
    pub fn view_matrix(&self, scene: &Scene) -> Mat4 {
        self.object
            .map(|key| scene.global_transform(key))
            .and_then(|m| m.try_inverse())
            .unwrap_or_else(Mat4::identity)
    }

    /// World-space camera position
    pub fn position(&self, scene: &Scene) -> Vec3 {
        self.object
            .map_or_else(Vec3::zeros, |key| scene.global_position(key))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 1000.0)
    }
}

/// View bundle handed down the draw path
#[derive(Debug, Clone, Copy)]
pub struct ViewInfo {
    /// View matrix
    pub view: Mat4,
    /// Projection matrix
    pub projection: Mat4,
    /// Camera world position for view-dependent shading
    pub camera_position: Vec3,
}

impl ViewInfo {
    /// Build the bundle for a camera against a scene
    pub fn for_camera(camera: &Camera, scene: &Scene) -> Self {
        Self {
            view: camera.view_matrix(scene),
            projection: camera.projection_matrix(),
            camera_position: camera.position(scene),
        }
    }

    /// Combined projection * view matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unattached_camera_views_from_origin() {
        let scene = Scene::new();
        let camera = Camera::default();
        assert_relative_eq!(camera.view_matrix(&scene), Mat4::identity());
        assert_relative_eq!(camera.position(&scene), Vec3::zeros());
    }

    #[test]
    fn test_view_matrix_inverts_object_transform() {
        let mut scene = Scene::new();
        let rig = scene.create_object("rig");
        scene.transform_mut(rig).unwrap().position = Vec3::new(0.0, 0.0, 5.0);

        let camera = Camera::default().with_object(rig);
        let view = camera.view_matrix(&scene);
        let eye = view * crate::foundation::math::Vec4::new(0.0, 0.0, 5.0, 1.0);
        assert_relative_eq!(eye.xyz(), Vec3::zeros(), epsilon = 1e-5);
    }
}
