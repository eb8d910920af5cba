use crate::data::types::PointUniformStd140;
use crate::renderer::textures::FrameTextures;
use depthcloud::{PerspectiveCamera, PointCloud};
use wgpu::util::DeviceExt;

/// Point reprojection shader. The math mirrors `depthcloud::reproject`.
pub const DEPTH_POINTS_WGSL: &str = include_str!("../../../shaders/depth_points.wgsl");

/// Per-cloud GPU state: grid instances plus the bind group tying the
/// uniform block to this cloud's textures.
struct PointMesh {
    instances: wgpu::Buffer,
    instances_len: u32,
    bind: wgpu::BindGroup,
}

pub struct DepthPointsPipeline {
    depth_tested: wgpu::RenderPipeline,
    overlay: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    ubo: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    mesh: Option<PointMesh>,
}

impl DepthPointsPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Depth Points BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<PointUniformStd140>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Depth Points UBO"),
            size: std::mem::size_of::<PointUniformStd140>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/depth_points.wgsl"),
            source: wgpu::ShaderSource::Wgsl(DEPTH_POINTS_WGSL.into()),
        });

        // One screen-aligned quad, instanced per grid cell.
        let quad_corners: [[f32; 2]; 6] = [
            [-1.0, -1.0],
            [1.0, -1.0],
            [1.0, 1.0],
            [-1.0, -1.0],
            [1.0, 1.0],
            [-1.0, 1.0],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Depth Points Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
            // Grid cell (column, row, 0)
            wgpu::VertexBufferLayout {
                array_stride: (depthcloud::geometry::COMPONENTS * std::mem::size_of::<f32>())
                    as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x3,
                }],
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Points PipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let build = |label: &str, depth_test: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &vbuf_layouts,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_fmt,
                    depth_write_enabled: depth_test,
                    depth_compare: if depth_test {
                        wgpu::CompareFunction::LessEqual
                    } else {
                        wgpu::CompareFunction::Always
                    },
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
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
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };

        Self {
            depth_tested: build("Depth Points Pipeline", true),
            overlay: build("Depth Points Pipeline (no depth test)", false),
            layout,
            ubo,
            quad_vb,
            mesh: None,
        }
    }

    /// Uploads the grid of a freshly built cloud and binds its textures.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        cloud: &PointCloud<FrameTextures>,
    ) -> depthcloud::Result<()> {
        let geometry = cloud.geometry();
        let textures = &cloud.material().textures;
        let instances_len = u32::try_from(geometry.vertex_count()).map_err(|_| {
            depthcloud::Error::InvalidConfig(format!(
                "{} points exceed the instance count limit",
                geometry.vertex_count()
            ))
        })?;

        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Depth Points Grid Instances"),
            contents: geometry.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Depth Points Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures.color),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&textures.depth),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&textures.sampler),
                },
            ],
        });

        self.mesh = Some(PointMesh {
            instances,
            instances_len,
            bind,
        });
        Ok(())
    }

    /// Refreshes the uniform block from the cloud's current material.
    pub fn write_uniforms(
        &self,
        queue: &wgpu::Queue,
        cloud: &PointCloud<FrameTextures>,
        camera: &PerspectiveCamera,
        viewport_size: [f32; 2],
    ) {
        let ubo = PointUniformStd140::new(&cloud.material().uniforms, camera, viewport_size);
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(&ubo));
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, depth_test: bool) {
        let Some(mesh) = self.mesh.as_ref() else {
            return;
        };

        rpass.set_pipeline(if depth_test {
            &self.depth_tested
        } else {
            &self.overlay
        });
        rpass.set_bind_group(0, &mesh.bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, mesh.instances.slice(..));
        rpass.draw(0..6, 0..mesh.instances_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::HelperUniforms;
    use crate::renderer::pipelines::frustum_helper::FRUSTUM_WGSL;

    fn validated(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).expect("shader parses");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .expect("shader validates");
        module
    }

    fn struct_size(module: &naga::Module, name: &str) -> u32 {
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some(name))
            .expect("struct declared");
        ty.inner.size(module.to_ctx())
    }

    #[test]
    fn test_uniform_blocks_match_host_layout() {
        let points = validated(DEPTH_POINTS_WGSL);
        assert_eq!(
            struct_size(&points, "PointUniforms") as usize,
            std::mem::size_of::<PointUniformStd140>()
        );

        let helper = validated(FRUSTUM_WGSL);
        assert_eq!(
            struct_size(&helper, "HelperUniforms") as usize,
            std::mem::size_of::<HelperUniforms>()
        );
    }

    #[test]
    fn test_shader_uses_cpu_reprojection() {
        // Same expressions as depthcloud::reproject.
        for expr in [
            "(rgb.r + rgb.g + rgb.b) / 3.0",
            "(1.0 - depth_sample) * (U.far_clipping - U.near_clipping) + U.near_clipping",
            "(s.x - 0.5) * z * U.x_to_z",
            "(0.5 - s.y) * z * U.y_to_z",
            "-z + U.z_offset",
            "depth_sample > U.clip_epsilon && depth_sample < 1.0 - U.clip_epsilon",
        ] {
            assert!(DEPTH_POINTS_WGSL.contains(expr), "missing `{expr}`");
        }
    }
}
