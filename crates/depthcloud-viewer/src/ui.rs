//! Overlay UI: the performance HUD and the debug control panel.

use depthcloud::{CameraSelection, ClipPolicy, NavigationState, PointUniforms};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Weight of the newest sample in the smoothed frame time.
const SMOOTHING: f32 = 0.1;

/// Clipping plane slider bounds, in depth units.
const CLIP_MIN: f32 = 1.0;
const CLIP_MAX: f32 = 2000.0;
/// Smallest distance kept between the near and far planes.
const CLIP_GAP: f32 = 1.0;

/// Near plane range; stays below `far`.
fn near_range(far: f32) -> RangeInclusive<f32> {
    CLIP_MIN..=(far - CLIP_GAP).clamp(CLIP_MIN, CLIP_MAX)
}

/// Far plane range; stays above `near`.
fn far_range(near: f32) -> RangeInclusive<f32> {
    (near + CLIP_GAP).clamp(CLIP_MIN, CLIP_MAX)..=CLIP_MAX
}

/// Frame timing for the HUD, exponentially smoothed.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frame_ms: f32,
    frames: u64,
}

impl FrameStats {
    pub fn record(&mut self, dt: Duration) {
        let ms = dt.as_secs_f32() * 1000.0;
        self.frame_ms = if self.frames == 0 {
            ms
        } else {
            self.frame_ms + (ms - self.frame_ms) * SMOOTHING
        };
        self.frames += 1;
    }

    pub fn frame_ms(&self) -> f32 {
        self.frame_ms
    }

    pub fn fps(&self) -> f32 {
        if self.frame_ms > 0.0 {
            1000.0 / self.frame_ms
        } else {
            0.0
        }
    }
}

/// Requests from the debug panel that the app carries out after the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    ResetMedia,
    SelectCamera(CameraSelection),
}

pub fn draw_hud(
    ctx: &egui::Context,
    stats: &FrameStats,
    nav: &NavigationState,
    point_count: Option<usize>,
) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(format!("{:.0} fps ({:.1} ms)", stats.fps(), stats.frame_ms()));
            match point_count {
                Some(n) => ui.label(format!("{} points", n)),
                None => ui.label("waiting for source…"),
            };
            ui.label(format!("{} camera", nav.selected.name()));
            if nav.selected == CameraSelection::Inside {
                ui.label(format!(
                    "lon {:.1}°  lat {:.1}°",
                    nav.longitude, nav.latitude
                ));
            }
        });
}

/// Sliders edit `uniforms` in place; they are absent until the cloud exists.
pub fn draw_debug_panel(
    ctx: &egui::Context,
    uniforms: Option<&mut PointUniforms>,
    selected: CameraSelection,
) -> Vec<PanelAction> {
    let mut actions = Vec::new();

    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            if let Some(u) = uniforms {
                let near = near_range(u.far_clipping);
                ui.add(egui::Slider::new(&mut u.near_clipping, near).text("near clipping"));
                let far = far_range(u.near_clipping);
                ui.add(egui::Slider::new(&mut u.far_clipping, far).text("far clipping"));
                ui.add(egui::Slider::new(&mut u.point_size, 1.0..=25.0).text("point size"));
                ui.add(egui::Slider::new(&mut u.opacity, 0.0..=1.0).text("opacity"));
                ui.add(egui::Slider::new(&mut u.z_offset, 0.0..=4000.0).text("z offset"));

                let mut discard = u.clip_policy == ClipPolicy::Discard;
                if ui.checkbox(&mut discard, "discard clipped points").changed() {
                    u.clip_policy = if discard {
                        ClipPolicy::Discard
                    } else {
                        ClipPolicy::Keep
                    };
                }
                ui.checkbox(&mut u.depth_test, "depth test");
                ui.separator();
            }

            if ui.button("Reset media").clicked() {
                actions.push(PanelAction::ResetMedia);
            }
            ui.horizontal(|ui| {
                for camera in [CameraSelection::Inside, CameraSelection::Outside] {
                    let label = match camera {
                        CameraSelection::Inside => "Inside camera",
                        CameraSelection::Outside => "Outside camera",
                    };
                    if ui
                        .add_enabled(camera != selected, egui::Button::new(label))
                        .clicked()
                    {
                        actions.push(PanelAction::SelectCamera(camera));
                    }
                }
            });
        });

    actions
}
