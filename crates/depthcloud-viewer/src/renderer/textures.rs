//! GPU textures fed by the frame source, one pair per point cloud.

use depthcloud::{FramePair, SourceMetadata};

const BYTES_PER_TEXEL: u32 = 4;

/// Color and depth maps sampled by the point shader.
pub struct FrameTextures {
    color_tex: wgpu::Texture,
    depth_tex: wgpu::Texture,
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    width: u32,
    height: u32,
}

impl FrameTextures {
    pub fn new(device: &wgpu::Device, metadata: &SourceMetadata) -> Self {
        let size = wgpu::Extent3d {
            width: metadata.width,
            height: metadata.height,
            depth_or_array_layers: 1,
        };

        let create_tex = |label: &str, format| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        };

        // Color is display-referred; depth values are raw and must not be decoded.
        let color_tex = create_tex("Frame Color Map", wgpu::TextureFormat::Rgba8UnormSrgb);
        let depth_tex = create_tex("Frame Depth Map", wgpu::TextureFormat::Rgba8Unorm);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Frame Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            color_tex,
            depth_tex,
            sampler,
            width: metadata.width,
            height: metadata.height,
        }
    }

    /// Copies a decoded frame pair into both maps. Frames of another size are
    /// skipped.
    pub fn upload(&self, queue: &wgpu::Queue, frame: &FramePair<'_>) {
        if frame.width != self.width || frame.height != self.height {
            log::warn!(
                "Skipping frame {}: {}x{} does not match textures {}x{}",
                frame.index,
                frame.width,
                frame.height,
                self.width,
                self.height
            );
            return;
        }

        let expected = (self.width * self.height * BYTES_PER_TEXEL) as usize;
        if frame.color.len() != expected || frame.depth.len() != expected {
            log::warn!("Skipping frame {}: unexpected buffer length", frame.index);
            return;
        }

        for (texture, data) in [(&self.color_tex, frame.color), (&self.depth_tex, frame.depth)] {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.width * BYTES_PER_TEXEL),
                    rows_per_image: Some(self.height),
                },
                wgpu::Extent3d {
                    width: self.width,
                    height: self.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        log::trace!("Uploaded frame {}", frame.index);
    }
}
