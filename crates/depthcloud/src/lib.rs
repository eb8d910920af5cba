//! Core of the depth-video point cloud viewer.
//!
//! Turns a paired color/depth frame stream into a point cloud description the
//! GPU can reproject every frame, and drives the two cameras used to look at
//! it: an orbit camera outside the cloud and a first-person camera inside it.
//! Nothing in here talks to a GPU; rendering goes through [`RenderBackend`].

pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod material;
pub mod navigation;
pub mod render;
pub mod reproject;
pub mod rig;
pub mod source;
pub mod view;

pub use camera::{OrbitControls, OrbitInteraction, PerspectiveCamera};
pub use config::{Preset, ViewConfig};
pub use error::{Error, Result};
pub use events::{EventBus, InputEvent, Subscription};
pub use geometry::{build_geometry, GridGeometry};
pub use material::{build_material, build_mesh, ClipPolicy, PointCloud, PointMaterial, PointUniforms};
pub use navigation::{CameraSelection, LookAroundController, NavigationState};
pub use render::{RenderBackend, Scene};
pub use rig::CameraRig;
pub use source::{FramePair, FrameSource, SourceMetadata};
pub use view::DepthCloudView;
