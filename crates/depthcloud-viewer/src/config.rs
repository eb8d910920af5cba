use anyhow::Result;
use clap::{Parser, ValueEnum};
use depthcloud::{CameraSelection, ClipPolicy, Preset, ViewConfig};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    /// 640x480 Kinect capture.
    Kinect,
    /// Wide stacked capture; only the top half of each frame is sampled.
    Panorama,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Kinect => Preset::Kinect,
            PresetArg::Panorama => Preset::Panorama,
        }
    }
}

impl std::fmt::Display for PresetArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Preset::from(*self).name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CameraArg {
    /// Orbit camera looking at the cloud from outside.
    Outside,
    /// First-person camera at the capture origin.
    Inside,
}

impl From<CameraArg> for CameraSelection {
    fn from(arg: CameraArg) -> Self {
        match arg {
            CameraArg::Outside => CameraSelection::Outside,
            CameraArg::Inside => CameraSelection::Inside,
        }
    }
}

impl std::fmt::Display for CameraArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(CameraSelection::from(*self).name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClipArg {
    /// Draw points at the clipping planes.
    Keep,
    /// Drop points whose depth sample sits at either extreme.
    Discard,
}

impl From<ClipArg> for ClipPolicy {
    fn from(arg: ClipArg) -> Self {
        match arg {
            ClipArg::Keep => ClipPolicy::Keep,
            ClipArg::Discard => ClipPolicy::Discard,
        }
    }
}

impl std::fmt::Display for ClipArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClipArg::Keep => "keep",
            ClipArg::Discard => "discard",
        };
        f.write_str(s)
    }
}

/// `depthcloud` - plays a paired color/depth recording back as a live point cloud.
///
/// The source directory must contain `color/` and `depth/` image sequences.
/// Every option left unset falls back to the chosen preset.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Capture preset providing defaults for every other option.
    #[arg(long, value_enum, default_value_t = PresetArg::Kinect, env = "DEPTHCLOUD_PRESET")]
    pub preset: PresetArg,

    /// Directory with `color/` and `depth/` frame sequences. Defaults to the
    /// preset's media directory.
    #[arg(long, env = "DEPTHCLOUD_SOURCE")]
    pub source: Option<PathBuf>,

    /// Playback rate of the frame sequences.
    #[arg(long, default_value_t = 30.0, env = "DEPTHCLOUD_FPS")]
    pub fps: f32,

    /// Point grid columns; defaults to the source width.
    #[arg(long)]
    pub grid_width: Option<u32>,

    /// Point grid rows; defaults to the source height.
    #[arg(long)]
    pub grid_height: Option<u32>,

    /// Depth mapped from the brightest sample.
    #[arg(long)]
    pub near: Option<f32>,

    /// Depth mapped from the darkest sample.
    #[arg(long)]
    pub far: Option<f32>,

    /// Point size in pixels.
    #[arg(long)]
    pub point_size: Option<f32>,

    #[arg(long)]
    pub opacity: Option<f32>,

    #[arg(long)]
    pub z_offset: Option<f32>,

    /// Degrees of look-around per pixel dragged.
    #[arg(long)]
    pub look_sensitivity: Option<f32>,

    /// Camera active at startup.
    #[arg(long, value_enum)]
    pub camera: Option<CameraArg>,

    /// What to do with points at the clipping planes.
    #[arg(long, value_enum)]
    pub clip: Option<ClipArg>,

    /// Enable or disable depth testing between points.
    #[arg(long)]
    pub depth_test: Option<bool>,
}

impl Config {
    /// Preset defaults with command-line overrides applied, validated.
    pub fn view_config(&self) -> Result<ViewConfig> {
        let mut config = Preset::from(self.preset).config();

        if self.grid_width.is_some() {
            config.grid_width = self.grid_width;
        }
        if self.grid_height.is_some() {
            config.grid_height = self.grid_height;
        }
        if let Some(v) = self.near {
            config.near_clipping = v;
        }
        if let Some(v) = self.far {
            config.far_clipping = v;
        }
        if let Some(v) = self.point_size {
            config.point_size = v;
        }
        if let Some(v) = self.opacity {
            config.opacity = v;
        }
        if let Some(v) = self.z_offset {
            config.z_offset = v;
        }
        if let Some(v) = self.look_sensitivity {
            config.look_sensitivity = v;
        }
        if let Some(v) = self.camera {
            config.initial_camera = v.into();
        }
        if let Some(v) = self.clip {
            config.clip_policy = v.into();
        }
        if let Some(v) = self.depth_test {
            config.depth_test = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.source
            .clone()
            .unwrap_or_else(|| PathBuf::from(Preset::from(self.preset).default_source()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_preset() {
        let config = Config::try_parse_from(["depthcloud", "--preset", "panorama"]).unwrap();
        let view = config.view_config().unwrap();

        assert_eq!(view, Preset::Panorama.config());
        assert_eq!(config.source_dir(), PathBuf::from("media/panorama"));
    }

    #[test]
    fn test_overrides_apply() {
        let config = Config::try_parse_from([
            "depthcloud",
            "--source",
            "/tmp/capture",
            "--near",
            "10",
            "--far",
            "900",
            "--camera",
            "inside",
            "--clip",
            "discard",
            "--depth-test",
            "false",
            "--grid-width",
            "320",
            "--grid-height",
            "240",
        ])
        .unwrap();
        let view = config.view_config().unwrap();

        assert_eq!(view.near_clipping, 10.0);
        assert_eq!(view.far_clipping, 900.0);
        assert_eq!(view.initial_camera, CameraSelection::Inside);
        assert_eq!(view.clip_policy, ClipPolicy::Discard);
        assert!(!view.depth_test);
        assert_eq!(view.grid_width, Some(320));
        assert_eq!(view.grid_height, Some(240));
        assert_eq!(config.source_dir(), PathBuf::from("/tmp/capture"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let config = Config::try_parse_from(["depthcloud", "--opacity", "2"]).unwrap();
        assert!(config.view_config().is_err());
        assert!(Config::try_parse_from(["depthcloud", "--camera", "sideways"]).is_err());
    }
}
