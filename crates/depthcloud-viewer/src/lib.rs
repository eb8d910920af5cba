//! Desktop viewer for depth-video point clouds.
//!
//! Hosts a [`depthcloud::DepthCloudView`] in a winit window, renders it with
//! wgpu and feeds it frames decoded from color/depth image sequences.

pub mod app;
pub mod config;
pub mod data;
pub mod renderer;
pub mod ui;
