//! Data handling for the viewer.
//!
//! - Decoding color/depth frame sequences off the render thread.
//! - GPU buffer layouts shared with the WGSL shaders.

pub mod frames;
pub mod types;

pub use self::frames::ImageSequenceSource;
pub use self::types::{HelperUniforms, PointUniformStd140};
