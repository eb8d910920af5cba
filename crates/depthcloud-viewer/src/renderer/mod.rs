//! The rendering orchestrator. Owns the GPU context, render targets and the
//! pipelines, and exposes them to the view as a [`RenderBackend`].

pub mod context;
pub mod pipelines;
pub mod targets;
pub mod textures;

use self::{
    context::GfxContext,
    pipelines::{depth_points::DepthPointsPipeline, frustum_helper::FrustumHelperPipeline},
    targets::Targets,
    textures::FrameTextures,
};
use depthcloud::{
    geometry::COMPONENTS, Error, PerspectiveCamera, PointCloud, RenderBackend, Scene,
    SourceMetadata,
};
use std::convert::Infallible;
use std::sync::Arc;
use winit::window::Window;

/// Scene background, 0x424242.
pub const BACKGROUND_SRGB: [u8; 3] = [0x42, 0x42, 0x42];

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Clear color for `format`; sRGB surfaces expect linear values.
pub fn background_color(format: wgpu::TextureFormat) -> wgpu::Color {
    let channel = |c: u8| {
        if format.is_srgb() {
            srgb_to_linear(c)
        } else {
            c as f64 / 255.0
        }
    };
    wgpu::Color {
        r: channel(BACKGROUND_SRGB[0]),
        g: channel(BACKGROUND_SRGB[1]),
        b: channel(BACKGROUND_SRGB[2]),
        a: 1.0,
    }
}

/// Rejects grids whose instance buffer `limits` cannot hold.
pub fn check_grid_limits(limits: &wgpu::Limits, width: u32, height: u32) -> depthcloud::Result<()> {
    let points = width as u64 * height as u64;
    let bytes = points * (COMPONENTS * std::mem::size_of::<f32>()) as u64;
    if points > u32::MAX as u64 || bytes > limits.max_buffer_size {
        return Err(Error::InvalidConfig(format!(
            "{}x{} grid needs {} bytes of instances; device allows {}",
            width, height, bytes, limits.max_buffer_size
        )));
    }
    Ok(())
}

/// Rejects frames larger than the device's 2D textures.
pub fn check_texture_limits(
    limits: &wgpu::Limits,
    metadata: &SourceMetadata,
) -> depthcloud::Result<()> {
    let max = limits.max_texture_dimension_2d;
    if metadata.width > max || metadata.height > max {
        return Err(Error::InvalidConfig(format!(
            "{}x{} frames exceed the device's {} texel texture limit",
            metadata.width, metadata.height, max
        )));
    }
    Ok(())
}

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub points: DepthPointsPipeline,
    pub helper: FrustumHelperPipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let targets = Targets::new(&gfx.device, gfx.size);
        let points = DepthPointsPipeline::new(&gfx.device, gfx.config.format, targets.depth_fmt);
        let helper = FrustumHelperPipeline::new(&gfx.device, gfx.config.format, targets.depth_fmt);
        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            targets,
            points,
            helper,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
        }
    }

    /// Binds this renderer to one acquired swap chain image.
    pub fn frame<'a>(&'a mut self, target: &'a wgpu::TextureView) -> FrameContext<'a> {
        FrameContext {
            renderer: self,
            target,
        }
    }

    /// Fills `target` with the background. Used while no cloud exists yet.
    pub fn clear(&self, target: &wgpu::TextureView) {
        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(background_color(self.gfx.config.format)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_scene(
        &mut self,
        target: &wgpu::TextureView,
        scene: &Scene<'_, FrameTextures>,
        camera: &PerspectiveCamera,
    ) {
        self.points.write_uniforms(
            &self.gfx.queue,
            scene.cloud,
            camera,
            self.gfx.viewport_size(),
        );
        let depth_test = scene.cloud.material().uniforms.depth_test;

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Cloud Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(background_color(self.gfx.config.format)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.points.draw(&mut pass, depth_test);

            if let Some(subject) = scene.helper {
                self.helper.draw(&mut pass, &self.gfx.queue, subject, camera);
            }
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// The renderer for the duration of one swap chain image.
pub struct FrameContext<'a> {
    pub renderer: &'a mut Renderer,
    pub target: &'a wgpu::TextureView,
}

impl RenderBackend for FrameContext<'_> {
    type Textures = FrameTextures;
    type Error = Infallible;

    fn check_grid(&self, width: u32, height: u32) -> depthcloud::Result<()> {
        check_grid_limits(&self.renderer.gfx.device.limits(), width, height)
    }

    fn create_textures(&mut self, metadata: &SourceMetadata) -> depthcloud::Result<FrameTextures> {
        check_texture_limits(&self.renderer.gfx.device.limits(), metadata)?;
        log::debug!(
            "Allocating {}x{} frame textures",
            metadata.width,
            metadata.height
        );
        Ok(FrameTextures::new(&self.renderer.gfx.device, metadata))
    }

    fn prepare_mesh(&mut self, cloud: &PointCloud<FrameTextures>) -> depthcloud::Result<()> {
        self.renderer.points.prepare(&self.renderer.gfx.device, cloud)
    }

    fn render(
        &mut self,
        scene: &Scene<'_, FrameTextures>,
        camera: &PerspectiveCamera,
    ) -> Result<(), Infallible> {
        self.renderer.draw_scene(self.target, scene, camera);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_matches_hex() {
        let plain = background_color(wgpu::TextureFormat::Bgra8Unorm);
        assert!((plain.r - 66.0 / 255.0).abs() < 1e-9);

        let linear = background_color(wgpu::TextureFormat::Bgra8UnormSrgb);
        assert!((linear.g - 0.0545).abs() < 1e-3);
        assert_eq!(linear.a, 1.0);
    }

    #[test]
    fn test_grid_limits() {
        let limits = wgpu::Limits::default();
        assert!(check_grid_limits(&limits, 2560, 860).is_ok());
        assert!(matches!(
            check_grid_limits(&limits, 10_000, 10_000),
            Err(Error::InvalidConfig(_))
        ));
        assert!(check_grid_limits(&limits, u32::MAX, 2).is_err());
    }

    #[test]
    fn test_texture_limits() {
        let limits = wgpu::Limits::default();
        let frames = |width, height| SourceMetadata {
            width,
            height,
            frame_count: 1,
        };
        assert!(check_texture_limits(&limits, &frames(2560, 1720)).is_ok());
        assert!(check_texture_limits(&limits, &frames(limits.max_texture_dimension_2d + 1, 16)).is_err());
    }
}
