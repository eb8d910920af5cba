//! Dual-camera rig: an outside orbit camera and an inside first-person camera.

use crate::camera::{OrbitControls, OrbitInteraction, PerspectiveCamera};
use crate::navigation::{CameraSelection, LookAroundController, NavigationState};
use glam::Vec3;

pub const OUTSIDE_FOV_DEG: f32 = 50.0;
pub const OUTSIDE_NEAR: f32 = 1.0;
pub const OUTSIDE_FAR: f32 = 10_000.0;
pub const OUTSIDE_POSITION: Vec3 = Vec3::new(-1000.0, 0.0, 0.0);

pub const INSIDE_FOV_DEG: f32 = 80.0;
pub const INSIDE_NEAR: f32 = 1.0;
pub const INSIDE_FAR: f32 = 1500.0;

pub struct CameraRig<O = OrbitControls> {
    outside: PerspectiveCamera,
    inside: PerspectiveCamera,
    orbit: O,
    helper_visible: bool,
}

impl CameraRig<OrbitControls> {
    /// Builds both cameras for a viewport of the given aspect ratio, with the
    /// orbit controls circling the world origin.
    pub fn new(aspect: f32, look_radius: f32, selected: CameraSelection) -> Self {
        let mut outside = PerspectiveCamera::new(OUTSIDE_FOV_DEG, aspect, OUTSIDE_NEAR, OUTSIDE_FAR);
        outside.position = OUTSIDE_POSITION;
        outside.look_at(Vec3::new(0.0, 0.0, -1.0));

        let orbit = OrbitControls::new(&outside, Vec3::ZERO);
        Self::with_orbit(aspect, look_radius, selected, outside, orbit)
    }
}

impl<O: OrbitInteraction> CameraRig<O> {
    pub fn with_orbit(
        aspect: f32,
        look_radius: f32,
        selected: CameraSelection,
        outside: PerspectiveCamera,
        orbit: O,
    ) -> Self {
        let mut inside = PerspectiveCamera::new(INSIDE_FOV_DEG, aspect, INSIDE_NEAR, INSIDE_FAR);
        inside.position = Vec3::ZERO;
        inside.look_at(Vec3::new(look_radius, 0.0, look_radius));

        let mut rig = Self {
            outside,
            inside,
            orbit,
            helper_visible: true,
        };
        rig.transition(selected);
        rig
    }

    /// Applies the side effects of entering `to`.
    ///
    /// Inside: orbit interaction off, frustum helper hidden. Outside: both back on.
    /// Navigation angles are untouched.
    pub fn transition(&mut self, to: CameraSelection) {
        let outside = to == CameraSelection::Outside;
        self.orbit.set_enabled(outside);
        self.helper_visible = outside;
    }

    /// Refreshes aspect and projection on both cameras, whichever is active.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let aspect = width as f32 / height as f32;
        self.outside.set_aspect(aspect);
        self.inside.set_aspect(aspect);
    }

    /// Per-frame camera update ahead of the render call.
    pub fn update(&mut self, dt: f32, nav: &NavigationState, look: &LookAroundController) {
        self.orbit.update(dt, &mut self.outside);

        if nav.selected == CameraSelection::Inside {
            let target = look.target(nav);
            self.inside.look_at(target);
        }
    }

    pub fn active(&self, selected: CameraSelection) -> &PerspectiveCamera {
        match selected {
            CameraSelection::Outside => &self.outside,
            CameraSelection::Inside => &self.inside,
        }
    }

    pub fn outside(&self) -> &PerspectiveCamera {
        &self.outside
    }

    pub fn inside(&self) -> &PerspectiveCamera {
        &self.inside
    }

    pub fn orbit(&self) -> &O {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut O {
        &mut self.orbit
    }

    /// Whether the inside camera's frustum helper belongs in the scene.
    pub fn helper_visible(&self) -> bool {
        self.helper_visible
    }
}
