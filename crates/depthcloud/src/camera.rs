use glam::{Mat4, Vec3};

/// Perspective camera with an explicit look-at target.
///
/// The projection matrix is cached; call [`PerspectiveCamera::update_projection`]
/// after changing `fov_y_deg`, `aspect`, `near` or `far`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    proj: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_y_deg,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            proj: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    /// Recomputes the cached projection (wgpu clip space, depth in [0, 1]).
    pub fn update_projection(&mut self) {
        self.proj = Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(f32::EPSILON),
            self.near,
            self.far,
        );
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection();
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    #[inline]
    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view()
    }

    /// World-space corners of the view frustum: near plane first, then far,
    /// each in the order bottom-left, bottom-right, top-right, top-left.
    pub fn frustum_corners(&self) -> [Vec3; 8] {
        let inv = self.view_proj().inverse();
        let ndc = [
            (-1.0, -1.0, 0.0),
            (1.0, -1.0, 0.0),
            (1.0, 1.0, 0.0),
            (-1.0, 1.0, 0.0),
            (-1.0, -1.0, 1.0),
            (1.0, -1.0, 1.0),
            (1.0, 1.0, 1.0),
            (-1.0, 1.0, 1.0),
        ];
        ndc.map(|(x, y, z)| inv.project_point3(Vec3::new(x, y, z)))
    }
}

/// Orbit-style interaction driving a camera around a fixed target.
pub trait OrbitInteraction {
    fn enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);

    fn pointer_down(&mut self, x: f32, y: f32);
    fn pointer_move(&mut self, x: f32, y: f32);
    fn pointer_up(&mut self);
    fn scroll(&mut self, lines: f32);

    /// Applies pending input to `camera`. Called once per frame.
    fn update(&mut self, dt: f32, camera: &mut PerspectiveCamera);
}

/// Drag rotates, scroll zooms, around `target`.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub radius: f32,
    /// Rotation around the world up axis (radians).
    pub azimuth: f32,
    /// Angle above the horizontal plane (radians).
    pub elevation: f32,
    pub rotate_speed: f32,
    pub zoom_step: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Exponential smoothing rate for pending input; 0 applies it immediately.
    pub damping: f32,

    enabled: bool,
    mouse_down: bool,
    last_mouse: Option<(f32, f32)>,
    pending_azimuth: f32,
    pending_elevation: f32,
    pending_zoom: f32,
}

const MAX_ELEVATION: f32 = 89.0 * std::f32::consts::PI / 180.0;

impl OrbitControls {
    /// Starts orbiting `target` from the camera's current position.
    pub fn new(camera: &PerspectiveCamera, target: Vec3) -> Self {
        let offset = camera.position - target;
        let radius = offset.length().max(1e-3);
        Self {
            target,
            radius,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / radius).clamp(-1.0, 1.0).asin(),
            rotate_speed: 0.005,
            zoom_step: 1.1,
            min_radius: 1.0,
            max_radius: 10_000.0,
            damping: 0.0,
            enabled: true,
            mouse_down: false,
            last_mouse: None,
            pending_azimuth: 0.0,
            pending_elevation: 0.0,
            pending_zoom: 1.0,
        }
    }

    /// Camera position implied by the current orbit parameters.
    pub fn eye(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.target + self.radius * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }
}

impl OrbitInteraction for OrbitControls {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            // A drag in progress must not resume when re-enabled.
            self.mouse_down = false;
            self.pending_azimuth = 0.0;
            self.pending_elevation = 0.0;
            self.pending_zoom = 1.0;
        }
    }

    fn pointer_down(&mut self, x: f32, y: f32) {
        if self.enabled {
            self.mouse_down = true;
            self.last_mouse = Some((x, y));
        }
    }

    fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some((lx, ly)) = self.last_mouse {
            if self.enabled && self.mouse_down {
                self.pending_azimuth -= (x - lx) * self.rotate_speed;
                self.pending_elevation += (y - ly) * self.rotate_speed;
            }
        }
        self.last_mouse = Some((x, y));
    }

    fn pointer_up(&mut self) {
        self.mouse_down = false;
    }

    fn scroll(&mut self, lines: f32) {
        if self.enabled {
            // Positive = scroll up = zoom in = smaller radius.
            self.pending_zoom *= self.zoom_step.powf(-lines);
        }
    }

    fn update(&mut self, dt: f32, camera: &mut PerspectiveCamera) {
        let k = if self.damping > 0.0 {
            1.0 - (-self.damping * dt.max(0.0)).exp()
        } else {
            1.0
        };

        self.azimuth += self.pending_azimuth * k;
        self.elevation =
            (self.elevation + self.pending_elevation * k).clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.radius =
            (self.radius * self.pending_zoom.powf(k)).clamp(self.min_radius, self.max_radius);

        self.pending_azimuth *= 1.0 - k;
        self.pending_elevation *= 1.0 - k;
        self.pending_zoom = self.pending_zoom.powf(1.0 - k);

        camera.position = self.eye();
        camera.look_at(self.target);
    }
}
