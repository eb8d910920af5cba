//! Error taxonomy for building and driving a depth cloud view.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The grid the geometry was built for and the grid the material expects differ.
    /// Rendering would sample the textures at misaligned pixel indices.
    #[error(
        "configuration mismatch: geometry grid is {geometry_width}x{geometry_height}, \
         material uniforms expect {uniform_width}x{uniform_height}"
    )]
    ConfigurationMismatch {
        geometry_width: u32,
        geometry_height: u32,
        uniform_width: u32,
        uniform_height: u32,
    },

    /// Geometry, material or mesh requested before the frame source reported its dimensions.
    #[error("frame source has not reported its metadata yet")]
    SourceNotReady,

    /// No output surface to render into at mount time.
    #[error("render target is missing: {0}")]
    MissingRenderTarget(String),

    #[error("invalid grid dimensions {width}x{height}")]
    InvalidGrid { width: u32, height: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
