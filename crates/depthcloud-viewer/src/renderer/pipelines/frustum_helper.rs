// Outlines the inside camera's view frustum when looking from outside.

use crate::data::types::HelperUniforms;
use depthcloud::PerspectiveCamera;

/// 4 near edges, 4 far edges, 4 sides, 4 rays from the eye.
pub const EDGE_COUNT: usize = 16;
const VERTEX_COUNT: usize = EDGE_COUNT * 2;

const FRUSTUM_COLOR: [f32; 4] = [1.0, 0.667, 0.0, 1.0];

/// Line-list vertices for `camera`'s frustum in world space.
pub fn frustum_lines(camera: &PerspectiveCamera) -> [[f32; 3]; VERTEX_COUNT] {
    let corners = camera.frustum_corners();
    let eye = camera.position;

    let mut lines = [[0.0f32; 3]; VERTEX_COUNT];
    let mut n = 0;
    let mut push = |a: glam::Vec3, b: glam::Vec3| {
        lines[n] = a.to_array();
        lines[n + 1] = b.to_array();
        n += 2;
    };

    for i in 0..4 {
        let next = (i + 1) % 4;
        push(corners[i], corners[next]);
        push(corners[i + 4], corners[next + 4]);
        push(corners[i], corners[i + 4]);
        push(eye, corners[i]);
    }

    lines
}

pub struct FrustumHelperPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
}

impl FrustumHelperPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frustum Helper Uniform Buffer"),
            size: std::mem::size_of::<HelperUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frustum Helper VB"),
            size: std::mem::size_of::<[[f32; 3]; VERTEX_COUNT]>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frustum Helper BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frustum Helper Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Frustum Helper WGSL"),
            source: wgpu::ShaderSource::Wgsl(FRUSTUM_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Frustum Helper Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Frustum Helper Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_fmt,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            vertex_buffer,
        }
    }

    /// Draws `subject`'s frustum as seen through `viewer`.
    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        queue: &wgpu::Queue,
        subject: &PerspectiveCamera,
        viewer: &PerspectiveCamera,
    ) {
        let uniforms = HelperUniforms {
            view_proj: viewer.view_proj().to_cols_array_2d(),
            color: FRUSTUM_COLOR,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&frustum_lines(subject)),
        );

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.draw(0..VERTEX_COUNT as u32, 0..1);
    }
}

pub const FRUSTUM_WGSL: &str = r#"
struct HelperUniforms {
    view_proj: mat4x4<f32>,
    color: vec4<f32>,
};
@group(0) @binding(0) var<uniform> U: HelperUniforms;

@vertex
fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return U.view_proj * vec4<f32>(pos, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return U.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_lines_cover_frustum() {
        let mut camera = PerspectiveCamera::new(80.0, 1.0, 1.0, 1500.0);
        camera.look_at(Vec3::new(20.0, 0.0, 20.0));
        let corners = camera.frustum_corners();
        let lines = frustum_lines(&camera);

        // Every corner is an endpoint of exactly three box edges plus one eye
        // ray for the near plane.
        for (i, corner) in corners.iter().enumerate() {
            let hits = lines.iter().filter(|v| **v == corner.to_array()).count();
            let expected = if i < 4 { 4 } else { 3 };
            assert_eq!(hits, expected, "corner {}", i);
        }

        let eye_hits = lines
            .iter()
            .filter(|v| **v == camera.position.to_array())
            .count();
        assert_eq!(eye_hits, 4);
    }
}
