//! CPU reference of the depth reprojection performed by `depth_points.wgsl`.
//!
//! The GPU does this per vertex every frame; these functions exist so the
//! math can be pinned down in tests and reused by tooling. The viewer's
//! `test_shader_uses_cpu_reprojection` fails when the shader's expressions
//! drift from these.

use crate::material::{ClipPolicy, PointUniforms};
use glam::{Vec2, Vec3};

/// Normalized texture coordinate sampled for grid cell `(column, row)`.
#[inline]
pub fn texcoord(column: f32, row: f32, u: &PointUniforms) -> Vec2 {
    Vec2::new(
        column / u.width as f32 * u.uv_repeat[0],
        row / u.height as f32 * u.uv_repeat[1],
    )
}

/// Collapses an RGB depth sample to a single value in `[0, 1]`.
#[inline]
pub fn depth_sample(rgb: [f32; 3]) -> f32 {
    (rgb[0] + rgb[1] + rgb[2]) / 3.0
}

/// Linear remap of a depth sample into `[near_clipping, far_clipping]`.
/// Bright samples are close: 1.0 lands on the near plane, 0.0 on the far plane.
#[inline]
pub fn depth_from_sample(sample: f32, u: &PointUniforms) -> f32 {
    (1.0 - sample) * (u.far_clipping - u.near_clipping) + u.near_clipping
}

/// Whether the sample maps strictly between the clipping planes.
#[inline]
pub fn sample_in_range(sample: f32, u: &PointUniforms) -> bool {
    sample > u.clip_epsilon && sample < 1.0 - u.clip_epsilon
}

/// Back-projects one grid cell into camera space.
///
/// Returns `None` when the clip policy discards the point.
pub fn reproject(column: f32, row: f32, sample: f32, u: &PointUniforms) -> Option<Vec3> {
    if u.clip_policy == ClipPolicy::Discard && !sample_in_range(sample, u) {
        return None;
    }

    let z = depth_from_sample(sample, u);
    let s = Vec2::new(column / u.width as f32, row / u.height as f32);

    Some(Vec3::new(
        (s.x - 0.5) * z * u.x_to_z,
        // Row 0 is the top of the frame.
        (0.5 - s.y) * z * u.y_to_z,
        -z + u.z_offset,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;

    fn uniforms() -> PointUniforms {
        ViewConfig {
            near_clipping: 50.0,
            far_clipping: 1500.0,
            z_offset: 1000.0,
            ..ViewConfig::default()
        }
        .uniforms_for(640, 480)
    }

    #[test]
    fn test_depth_remap_is_linear() {
        let u = uniforms();
        assert_eq!(depth_from_sample(1.0, &u), 50.0);
        assert_eq!(depth_from_sample(0.0, &u), 1500.0);
        assert!((depth_from_sample(0.5, &u) - 775.0).abs() < 1e-3);
    }

    #[test]
    fn test_center_pixel_lies_on_axis() {
        let u = uniforms();
        let p = reproject(320.0, 240.0, 0.5, &u).unwrap();
        assert!(p.x.abs() < 1e-4);
        assert!(p.y.abs() < 1e-4);
        assert!((p.z - (1000.0 - 775.0)).abs() < 1e-3);
    }

    #[test]
    fn test_top_left_is_up_and_left() {
        let u = uniforms();
        let p = reproject(0.0, 0.0, 0.5, &u).unwrap();
        assert!(p.x < 0.0);
        assert!(p.y > 0.0);
    }

    #[test]
    fn test_clip_policy() {
        let mut u = uniforms();
        assert!(reproject(10.0, 10.0, 0.0, &u).is_some());
        assert!(reproject(10.0, 10.0, 1.0, &u).is_some());

        u.clip_policy = ClipPolicy::Discard;
        assert!(reproject(10.0, 10.0, 0.0, &u).is_none());
        assert!(reproject(10.0, 10.0, 1.0, &u).is_none());
        assert!(reproject(10.0, 10.0, 0.5, &u).is_some());
    }

    #[test]
    fn test_texcoord_honours_repeat() {
        let mut u = uniforms();
        u.uv_repeat = [1.0, 0.5];
        let uv = texcoord(320.0, 480.0, &u);
        assert_eq!(uv, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_depth_sample_mean() {
        assert!((depth_sample([0.3, 0.6, 0.9]) - 0.6).abs() < 1e-6);
    }
}
