use crate::{
    config::Config,
    data::ImageSequenceSource,
    renderer::{textures::FrameTextures, Renderer},
    ui::{self, FrameStats, PanelAction},
};
use anyhow::{Context, Result};
use depthcloud::{DepthCloudView, EventBus, FrameSource, InputEvent};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    window::Window,
};

/// Pixel wheel deltas (touchpads) are converted to lines at this rate.
const PIXELS_PER_LINE: f32 = 40.0;

/// Converts a cursor position to logical pixels so drag sensitivity does not
/// depend on the display's scale factor.
fn logical_pointer(position: PhysicalPosition<f64>, scale_factor: f64) -> (f32, f32) {
    let logical = position.to_logical::<f64>(scale_factor);
    (logical.x as f32, logical.y as f32)
}

pub struct App {
    pub renderer: Renderer,
    pub view: DepthCloudView<FrameTextures>,
    source: Box<dyn FrameSource>,
    bus: EventBus,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    stats: FrameStats,
    cursor: (f32, f32),
    last_frame: Instant,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let view_config = config.view_config().context("invalid view configuration")?;
        let source_dir = config.source_dir();
        let source = ImageSequenceSource::open(&source_dir, config.fps)
            .with_context(|| format!("opening frame source '{}'", source_dir.display()))?;

        let renderer = Renderer::new(window.clone()).await?;
        let size = renderer.gfx.size;

        let mut bus = EventBus::new();
        let view = DepthCloudView::mount(view_config, &mut bus, size.width, size.height)?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            view,
            source: Box::new(source),
            bus,
            egui_ctx,
            egui_state,
            stats: FrameStats::default(),
            cursor: (0.0, 0.0),
            last_frame: Instant::now(),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.publish(InputEvent::Resize {
                width: new_size.width,
                height: new_size.height,
            });
        }
    }

    fn publish(&mut self, event: InputEvent) {
        self.bus.publish(event);
        self.view.pump_events();
    }

    /// Returns true when the event was consumed by the UI.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);

        // Releases and resizes always reach the view so a drag cannot get stuck.
        let must_forward = matches!(
            event,
            WindowEvent::Resized(_)
                | WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: MouseButton::Left,
                    ..
                }
        );
        if response.consumed && !must_forward {
            return true;
        }

        match event {
            WindowEvent::Resized(size) => self.resize(*size),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = logical_pointer(*position, window.scale_factor());
                self.publish(InputEvent::PointerMove {
                    x: self.cursor.0,
                    y: self.cursor.1,
                });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let input = match state {
                    ElementState::Pressed => InputEvent::PointerDown {
                        x: self.cursor.0,
                        y: self.cursor.1,
                    },
                    ElementState::Released => InputEvent::PointerUp,
                };
                self.publish(input);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => {
                        (p.y / window.scale_factor()) as f32 / PIXELS_PER_LINE
                    }
                };
                self.publish(InputEvent::Scroll { lines });
            }
            _ => {}
        }

        response.consumed
    }

    pub fn render(&mut self, window: &Window) -> Result<()> {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;
        self.stats.record(dt);
        let dt_secs = dt.as_secs_f32();

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let rendered = {
            let mut backend = self.renderer.frame(&swap_view);
            self.view.poll_source(self.source.as_mut(), &mut backend)?;

            if let (Some(pair), Some(cloud)) = (self.source.advance(dt_secs), self.view.cloud()) {
                cloud
                    .material()
                    .textures
                    .upload(&backend.renderer.gfx.queue, &pair);
            }

            self.view
                .tick(dt_secs, &mut backend)
                .unwrap_or_else(|never| match never {})
        };
        if !rendered {
            self.renderer.clear(&swap_view);
        }

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        let point_count = self.view.cloud().map(|c| c.point_count());
        ui::draw_hud(&self.egui_ctx, &self.stats, self.view.navigation(), point_count);

        let selected = self.view.navigation().selected;
        let uniforms = self
            .view
            .cloud_mut()
            .map(|c| &mut c.material_mut().uniforms);
        let actions = ui::draw_debug_panel(&self.egui_ctx, uniforms, selected);

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        for action in actions {
            match action {
                PanelAction::ResetMedia => self.source.sync(),
                PanelAction::SelectCamera(selected) => self.view.select_camera(selected),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_is_scaled_to_logical_pixels() {
        let position = PhysicalPosition::new(300.0, 120.0);
        assert_eq!(logical_pointer(position, 1.0), (300.0, 120.0));
        assert_eq!(logical_pointer(position, 2.0), (150.0, 60.0));
    }
}
