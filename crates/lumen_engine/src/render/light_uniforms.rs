//! Pre-built light uniform name tables
//!
//! Pushing lights is a hot path: every drawable that receives lights
//! uploads position/intensity/attenuation uniforms per light per frame.
//! The indexed uniform names are built once here, at context
//! construction, so the frame loop never formats a string.

/// Uniform names for one point-light slot
#[derive(Debug, Clone)]
pub struct PointLightNames {
    /// World position
    pub position: String,
    /// Ambient intensity
    pub ambient: String,
    /// Diffuse intensity
    pub diffuse: String,
    /// Specular intensity
    pub specular: String,
    /// Constant/linear/quadratic attenuation triple
    pub attenuation: String,
    /// Shadow flag
    pub cast_shadow: String,
    /// Shadow depth normalization distance
    pub far_plane: String,
    /// Cubemap shadow sampler
    pub shadow_map: String,
}

/// Uniform names for one directional-light slot
#[derive(Debug, Clone)]
pub struct DirectionalLightNames {
    /// World direction
    pub direction: String,
    /// Ambient intensity
    pub ambient: String,
    /// Diffuse intensity
    pub diffuse: String,
    /// Specular intensity
    pub specular: String,
    /// Shadow flag
    pub cast_shadow: String,
    /// Light-space matrix
    pub ls_matrix: String,
    /// Shadow sampler
    pub shadow_map: String,
}

/// Uniform names for one spot-light slot
#[derive(Debug, Clone)]
pub struct SpotLightNames {
    /// World position
    pub position: String,
    /// World direction
    pub direction: String,
    /// Ambient intensity
    pub ambient: String,
    /// Diffuse intensity
    pub diffuse: String,
    /// Specular intensity
    pub specular: String,
    /// Constant/linear/quadratic attenuation triple
    pub attenuation: String,
    /// Inner/outer cutoff cosines
    pub cutoff: String,
    /// Shadow flag
    pub cast_shadow: String,
    /// Light-space matrix
    pub ls_matrix: String,
    /// Shadow sampler
    pub shadow_map: String,
}

/// Count uniform for active point lights
pub const NUM_POINT_LIGHTS: &str = "u_num_point_lights";
/// Count uniform for active directional lights
pub const NUM_DIRECTIONAL_LIGHTS: &str = "u_num_directional_lights";
/// Count uniform for active spot lights
pub const NUM_SPOT_LIGHTS: &str = "u_num_spot_lights";
/// Per-drawable receive-lights flag
pub const RECEIVE_LIGHTS: &str = "u_receive_lights";
/// Per-drawable receive-shadows flag
pub const RECEIVE_SHADOWS: &str = "u_receive_shadows";

/// Indexed uniform names for every configured light slot
#[derive(Debug)]
pub struct LightUniformNames {
    /// Per-slot point light names
    pub point: Vec<PointLightNames>,
    /// Per-slot directional light names
    pub directional: Vec<DirectionalLightNames>,
    /// Per-slot spot light names
    pub spot: Vec<SpotLightNames>,
}

impl LightUniformNames {
    /// Build the table for the configured per-type maxima
    pub fn new(max_point: u32, max_directional: u32, max_spot: u32) -> Self {
        let point = (0..max_point)
            .map(|i| PointLightNames {
                position: format!("u_point_lights[{i}].position"),
                ambient: format!("u_point_lights[{i}].ambient"),
                diffuse: format!("u_point_lights[{i}].diffuse"),
                specular: format!("u_point_lights[{i}].specular"),
                attenuation: format!("u_point_lights[{i}].attenuation"),
                cast_shadow: format!("u_point_lights[{i}].cast_shadow"),
                far_plane: format!("u_point_lights[{i}].far_plane"),
                shadow_map: format!("u_point_shadow_maps[{i}]"),
            })
            .collect();

        let directional = (0..max_directional)
            .map(|i| DirectionalLightNames {
                direction: format!("u_directional_lights[{i}].direction"),
                ambient: format!("u_directional_lights[{i}].ambient"),
                diffuse: format!("u_directional_lights[{i}].diffuse"),
                specular: format!("u_directional_lights[{i}].specular"),
                cast_shadow: format!("u_directional_lights[{i}].cast_shadow"),
                ls_matrix: format!("u_directional_lights[{i}].ls_matrix"),
                shadow_map: format!("u_directional_shadow_maps[{i}]"),
            })
            .collect();

        let spot = (0..max_spot)
            .map(|i| SpotLightNames {
                position: format!("u_spot_lights[{i}].position"),
                direction: format!("u_spot_lights[{i}].direction"),
                ambient: format!("u_spot_lights[{i}].ambient"),
                diffuse: format!("u_spot_lights[{i}].diffuse"),
                specular: format!("u_spot_lights[{i}].specular"),
                attenuation: format!("u_spot_lights[{i}].attenuation"),
                cutoff: format!("u_spot_lights[{i}].cutoff"),
                cast_shadow: format!("u_spot_lights[{i}].cast_shadow"),
                ls_matrix: format!("u_spot_lights[{i}].ls_matrix"),
                shadow_map: format!("u_spot_shadow_maps[{i}]"),
            })
            .collect();

        Self {
            point,
            directional,
            spot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes_match_maxima() {
        let names = LightUniformNames::new(8, 2, 2);
        assert_eq!(names.point.len(), 8);
        assert_eq!(names.directional.len(), 2);
        assert_eq!(names.spot.len(), 2);
    }

    #[test]
    fn test_indexed_names() {
        let names = LightUniformNames::new(2, 1, 1);
        assert_eq!(names.point[1].position, "u_point_lights[1].position");
        assert_eq!(names.point[0].shadow_map, "u_point_shadow_maps[0]");
        assert_eq!(names.spot[0].cutoff, "u_spot_lights[0].cutoff");
        assert_eq!(
            names.directional[0].ls_matrix,
            "u_directional_lights[0].ls_matrix"
        );
    }
}
