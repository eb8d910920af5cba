//! Configuration surface consumed by the view, plus the two named source presets.

use crate::error::{Error, Result};
use crate::material::{ClipPolicy, PointUniforms};
use crate::navigation::CameraSelection;

/// Horizontal field-of-view factor of the Kinect depth sensor, `tan(fov_x / 2) * 2`.
pub const KINECT_X_TO_Z: f32 = 1.11146;
/// Vertical field-of-view factor of the Kinect depth sensor, `tan(fov_y / 2) * 2`.
pub const KINECT_Y_TO_Z: f32 = 0.83359;

/// Everything the core needs to build and drive a view.
///
/// Grid dimensions are optional: when absent they are taken from the frame
/// source once it reports its metadata. They cannot be changed after the
/// geometry is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub grid_width: Option<u32>,
    pub grid_height: Option<u32>,

    pub near_clipping: f32,
    pub far_clipping: f32,
    pub point_size: f32,
    pub opacity: f32,
    pub z_offset: f32,
    pub uv_repeat: [f32; 2],
    pub x_to_z: f32,
    pub y_to_z: f32,
    pub clip_policy: ClipPolicy,
    pub clip_epsilon: f32,
    pub depth_test: bool,

    pub look_sensitivity: f32,
    pub look_radius: f32,
    pub initial_camera: CameraSelection,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            grid_width: None,
            grid_height: None,
            near_clipping: 50.0,
            far_clipping: 1500.0,
            point_size: 2.0,
            opacity: 1.0,
            z_offset: 1000.0,
            uv_repeat: [1.0, 1.0],
            x_to_z: KINECT_X_TO_Z,
            y_to_z: KINECT_Y_TO_Z,
            clip_policy: ClipPolicy::Keep,
            clip_epsilon: 1.0 / 255.0,
            depth_test: true,
            look_sensitivity: 0.1,
            look_radius: 20.0,
            initial_camera: CameraSelection::Outside,
        }
    }
}

impl ViewConfig {
    /// Rejects values the shader or the controller cannot work with.
    pub fn validate(&self) -> Result<()> {
        if let (Some(w), Some(h)) = (self.grid_width, self.grid_height) {
            if w == 0 || h == 0 {
                return Err(Error::InvalidGrid { width: w, height: h });
            }
        }
        if self.grid_width.is_some() != self.grid_height.is_some() {
            return Err(Error::InvalidConfig(
                "grid width and height must be given together".into(),
            ));
        }
        if !self.look_sensitivity.is_finite() || self.look_sensitivity <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "look sensitivity must be positive, got {}",
                self.look_sensitivity
            )));
        }
        if !self.look_radius.is_finite() || self.look_radius <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "look radius must be positive, got {}",
                self.look_radius
            )));
        }

        // Shading values are checked against the same rules the material applies.
        self.uniforms_for(1, 1).validate()
    }

    /// Resolves the grid for a source of the given size, honouring the override.
    pub fn grid_for(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match (self.grid_width, self.grid_height) {
            (Some(w), Some(h)) => (w, h),
            _ => (source_width, source_height),
        }
    }

    /// The uniform set for a grid of the given size.
    pub fn uniforms_for(&self, width: u32, height: u32) -> PointUniforms {
        PointUniforms {
            width,
            height,
            near_clipping: self.near_clipping,
            far_clipping: self.far_clipping,
            point_size: self.point_size,
            opacity: self.opacity,
            z_offset: self.z_offset,
            uv_repeat: self.uv_repeat,
            x_to_z: self.x_to_z,
            y_to_z: self.y_to_z,
            clip_policy: self.clip_policy,
            clip_epsilon: self.clip_epsilon,
            depth_test: self.depth_test,
        }
    }
}

/// Named source presets, exposed by the host as alternate entry routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// A single 640x480 Kinect capture with separate color and depth clips.
    Kinect,
    /// A wide 2560x1720 capture of which only the top half holds the frame.
    Panorama,
}

impl Preset {
    pub fn name(self) -> &'static str {
        match self {
            Preset::Kinect => "kinect",
            Preset::Panorama => "panorama",
        }
    }

    /// Default directory holding the `color/` and `depth/` frame sequences.
    pub fn default_source(self) -> &'static str {
        match self {
            Preset::Kinect => "media/kinect",
            Preset::Panorama => "media/panorama",
        }
    }

    pub fn config(self) -> ViewConfig {
        match self {
            Preset::Kinect => ViewConfig::default(),
            Preset::Panorama => ViewConfig {
                grid_width: Some(2560),
                grid_height: Some(860),
                point_size: 3.0,
                uv_repeat: [1.0, 0.5],
                depth_test: false,
                ..ViewConfig::default()
            },
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ViewConfig::default().validate().is_ok());
        assert!(Preset::Kinect.config().validate().is_ok());
        assert!(Preset::Panorama.config().validate().is_ok());
    }

    #[test]
    fn test_grid_override() {
        let cfg = Preset::Panorama.config();
        assert_eq!(cfg.grid_for(640, 480), (2560, 860));
        assert_eq!(ViewConfig::default().grid_for(640, 480), (640, 480));
    }

    #[test]
    fn test_rejects_bad_values() {
        let cfg = ViewConfig {
            grid_width: Some(0),
            grid_height: Some(10),
            ..ViewConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(Error::InvalidGrid { width: 0, height: 10 })
        );

        let cfg = ViewConfig {
            grid_width: Some(10),
            ..ViewConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let cfg = ViewConfig {
            near_clipping: 2000.0,
            far_clipping: 100.0,
            ..ViewConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let cfg = ViewConfig {
            look_sensitivity: 0.0,
            ..ViewConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }
}
