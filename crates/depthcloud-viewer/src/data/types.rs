//! GPU-side data layouts. Each struct mirrors a WGSL struct byte for byte.

use depthcloud::{ClipPolicy, PerspectiveCamera, PointUniforms};

/// Uniform block of `depth_points.wgsl`, std140 layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointUniformStd140 {
    pub view_proj: [[f32; 4]; 4], // 64
    /// Viewport in physical pixels.
    pub viewport_size: [f32; 2], // +8
    /// Source grid width/height.
    pub grid_size: [f32; 2], // +8
    pub uv_repeat: [f32; 2], // +8 -> 88
    pub near_clipping: f32,
    pub far_clipping: f32,
    pub point_size_px: f32,
    pub opacity: f32,
    pub z_offset: f32,
    pub x_to_z: f32,
    pub y_to_z: f32,
    pub clip_epsilon: f32, // -> 120
    /// 1 discards points at or beyond the clipping planes.
    pub discard_out_of_range: u32,
    pub _pad0: f32, // -> 128
}

const _: [(); 128] = [(); core::mem::size_of::<PointUniformStd140>()];

impl PointUniformStd140 {
    pub fn new(u: &PointUniforms, camera: &PerspectiveCamera, viewport_size: [f32; 2]) -> Self {
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            viewport_size,
            grid_size: [u.width as f32, u.height as f32],
            uv_repeat: u.uv_repeat,
            near_clipping: u.near_clipping,
            far_clipping: u.far_clipping,
            point_size_px: u.point_size,
            opacity: u.opacity,
            z_offset: u.z_offset,
            x_to_z: u.x_to_z,
            y_to_z: u.y_to_z,
            clip_epsilon: u.clip_epsilon,
            discard_out_of_range: (u.clip_policy == ClipPolicy::Discard) as u32,
            _pad0: 0.0,
        }
    }
}

/// Uniform block of the frustum helper shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HelperUniforms {
    pub view_proj: [[f32; 4]; 4], // 64
    pub color: [f32; 4],          // +16 -> 80
}

const _: [(); 80] = [(); core::mem::size_of::<HelperUniforms>()];

#[cfg(test)]
mod tests {
    use super::*;
    use depthcloud::ViewConfig;

    #[test]
    fn test_uniform_packing() {
        let mut u = ViewConfig::default().uniforms_for(640, 480);
        u.clip_policy = ClipPolicy::Discard;
        let camera = PerspectiveCamera::new(50.0, 1.5, 1.0, 10_000.0);

        let ubo = PointUniformStd140::new(&u, &camera, [1280.0, 720.0]);
        assert_eq!(ubo.grid_size, [640.0, 480.0]);
        assert_eq!(ubo.discard_out_of_range, 1);

        let bytes = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), 128);
        // near_clipping sits right after the three vec2 slots.
        let near = f32::from_ne_bytes([bytes[88], bytes[89], bytes[90], bytes[91]]);
        assert_eq!(near, u.near_clipping);
    }
}
