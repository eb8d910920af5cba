//! Shader uniform set, the texture-bound material and the point cloud mesh.

use crate::error::{Error, Result};
use crate::geometry::GridGeometry;

/// What happens to points whose depth sample lies at or beyond a clipping plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipPolicy {
    /// Render every point, background pixels included.
    #[default]
    Keep,
    /// Drop points whose depth is at or beyond either clipping plane.
    Discard,
}

/// Configuration bag handed to the reprojection shader pair.
///
/// `width`/`height` must equal the grid the geometry was built for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointUniforms {
    pub width: u32,
    pub height: u32,
    pub near_clipping: f32,
    pub far_clipping: f32,
    /// Screen-space point size in pixels.
    pub point_size: f32,
    pub opacity: f32,
    /// Constant added along the depth axis after reprojection.
    pub z_offset: f32,
    /// Fraction of the source frame sampled along u and v.
    pub uv_repeat: [f32; 2],
    pub x_to_z: f32,
    pub y_to_z: f32,
    pub clip_policy: ClipPolicy,
    /// Distance from the sample range extremes that still counts as "at the plane".
    pub clip_epsilon: f32,
    pub depth_test: bool,
}

impl PointUniforms {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::InvalidConfig(msg));

        if !(self.near_clipping.is_finite() && self.far_clipping.is_finite()) {
            return fail("clipping planes must be finite".into());
        }
        if self.near_clipping >= self.far_clipping {
            return fail(format!(
                "near clipping ({}) must be below far clipping ({})",
                self.near_clipping, self.far_clipping
            ));
        }
        if !(self.point_size > 0.0) {
            return fail(format!("point size must be positive, got {}", self.point_size));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return fail(format!("opacity must lie in [0, 1], got {}", self.opacity));
        }
        if !(0.0..0.5).contains(&self.clip_epsilon) {
            return fail(format!(
                "clip epsilon must lie in [0, 0.5), got {}",
                self.clip_epsilon
            ));
        }
        if self.uv_repeat.iter().any(|r| !(*r > 0.0 && *r <= 1.0)) {
            return fail(format!("uv repeat must lie in (0, 1], got {:?}", self.uv_repeat));
        }
        Ok(())
    }
}

/// The shader pair bound to its textures and uniform set.
///
/// `T` is whatever handle the render backend uses for the color/depth
/// textures. The material borrows their content for each draw; it does not
/// manage the frames themselves.
#[derive(Debug)]
pub struct PointMaterial<T> {
    pub textures: T,
    pub uniforms: PointUniforms,
}

pub fn build_material<T>(textures: T, uniforms: PointUniforms) -> Result<PointMaterial<T>> {
    uniforms.validate()?;
    Ok(PointMaterial { textures, uniforms })
}

/// A renderable point cloud. Uniform edits go through [`PointCloud::material_mut`]
/// and never rebuild the geometry.
#[derive(Debug)]
pub struct PointCloud<T> {
    geometry: GridGeometry,
    material: PointMaterial<T>,
}

pub fn build_mesh<T>(geometry: GridGeometry, material: PointMaterial<T>) -> Result<PointCloud<T>> {
    let u = &material.uniforms;
    if u.width != geometry.width() || u.height != geometry.height() {
        return Err(Error::ConfigurationMismatch {
            geometry_width: geometry.width(),
            geometry_height: geometry.height(),
            uniform_width: u.width,
            uniform_height: u.height,
        });
    }
    Ok(PointCloud { geometry, material })
}

impl<T> PointCloud<T> {
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn material(&self) -> &PointMaterial<T> {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut PointMaterial<T> {
        &mut self.material
    }

    pub fn point_count(&self) -> usize {
        self.geometry.vertex_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::geometry::build_geometry;

    #[test]
    fn test_mesh_matching_grid() {
        let geometry = build_geometry(16, 8).unwrap();
        let material = build_material((), ViewConfig::default().uniforms_for(16, 8)).unwrap();
        let mesh = build_mesh(geometry, material).unwrap();
        assert_eq!(mesh.point_count(), 128);
    }

    #[test]
    fn test_mesh_mismatch_fails_fast() {
        let geometry = build_geometry(16, 8).unwrap();
        let material = build_material((), ViewConfig::default().uniforms_for(8, 16)).unwrap();
        let err = build_mesh(geometry, material).unwrap_err();
        assert_eq!(
            err,
            Error::ConfigurationMismatch {
                geometry_width: 16,
                geometry_height: 8,
                uniform_width: 8,
                uniform_height: 16,
            }
        );
    }

    #[test]
    fn test_material_rejects_invalid_uniforms() {
        let mut uniforms = ViewConfig::default().uniforms_for(4, 4);
        uniforms.opacity = 1.5;
        assert!(build_material((), uniforms).is_err());

        let mut uniforms = ViewConfig::default().uniforms_for(4, 4);
        uniforms.point_size = 0.0;
        assert!(build_material((), uniforms).is_err());
    }

    #[test]
    fn test_uniform_edit_in_place() {
        let geometry = build_geometry(4, 4).unwrap();
        let material = build_material((), ViewConfig::default().uniforms_for(4, 4)).unwrap();
        let mut mesh = build_mesh(geometry, material).unwrap();

        mesh.material_mut().uniforms.near_clipping = 10.0;
        mesh.material_mut().uniforms.clip_policy = ClipPolicy::Discard;

        assert_eq!(mesh.material().uniforms.near_clipping, 10.0);
        assert_eq!(mesh.material().uniforms.clip_policy, ClipPolicy::Discard);
        assert_eq!(mesh.point_count(), 16);
    }
}
