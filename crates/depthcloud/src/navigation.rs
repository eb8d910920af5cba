//! Navigation state and the look-around controller for the inside camera.

use glam::Vec3;

/// Latitude limit in degrees; keeps the look vector away from the poles.
pub const MAX_LATITUDE_DEG: f32 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraSelection {
    /// Orbit camera looking at the cloud from outside.
    #[default]
    Outside,
    /// First-person camera looking around from within the cloud.
    Inside,
}

impl CameraSelection {
    pub fn name(self) -> &'static str {
        match self {
            CameraSelection::Outside => "outside",
            CameraSelection::Inside => "inside",
        }
    }
}

/// Pointer position and orientation captured when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub x: f32,
    pub y: f32,
    pub longitude: f32,
    pub latitude: f32,
}

/// Owned by the view; mutated by pointer handling, read by the render loop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigationState {
    pub selected: CameraSelection,
    pub dragging: bool,
    pub anchor: Option<DragAnchor>,
    /// Degrees.
    pub longitude: f32,
    /// Degrees, always within `[-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG]`.
    pub latitude: f32,
}

impl NavigationState {
    pub fn new(selected: CameraSelection) -> Self {
        Self {
            selected,
            ..Self::default()
        }
    }
}

#[inline]
pub fn clamp_latitude(latitude: f32) -> f32 {
    latitude.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG)
}

/// Spherical-to-Cartesian look target around the origin, Y up.
pub fn look_target(radius: f32, longitude_deg: f32, latitude_deg: f32) -> Vec3 {
    let phi = (90.0 - clamp_latitude(latitude_deg)).to_radians();
    let theta = longitude_deg.to_radians();
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Turns drag gestures into longitude/latitude ("grab and pull": dragging
/// right turns the view left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAroundController {
    /// Degrees per pixel of pointer travel.
    pub sensitivity: f32,
    /// Distance of the look target from the inside camera.
    pub radius: f32,
}

impl LookAroundController {
    pub fn new(sensitivity: f32, radius: f32) -> Self {
        Self { sensitivity, radius }
    }

    pub fn press(&self, nav: &mut NavigationState, x: f32, y: f32) {
        nav.dragging = true;
        if nav.selected == CameraSelection::Inside {
            nav.anchor = Some(DragAnchor {
                x,
                y,
                longitude: nav.longitude,
                latitude: nav.latitude,
            });
        }
    }

    pub fn drag_to(&self, nav: &mut NavigationState, x: f32, y: f32) {
        if !nav.dragging || nav.selected != CameraSelection::Inside {
            return;
        }
        // A drag that began outside has no anchor to measure from.
        let Some(anchor) = nav.anchor else {
            return;
        };

        nav.longitude = (anchor.x - x) * self.sensitivity + anchor.longitude;
        nav.latitude = clamp_latitude((y - anchor.y) * self.sensitivity + anchor.latitude);
    }

    pub fn release(&self, nav: &mut NavigationState) {
        nav.dragging = false;
        nav.anchor = None;
    }

    /// Current look target for the inside camera.
    pub fn target(&self, nav: &NavigationState) -> Vec3 {
        look_target(self.radius, nav.longitude, nav.latitude)
    }
}
