//! Rendering capability consumed by the view.

use crate::camera::PerspectiveCamera;
use crate::error::Result;
use crate::material::PointCloud;
use crate::source::SourceMetadata;

/// Everything drawn in one frame.
pub struct Scene<'a, T> {
    pub cloud: &'a PointCloud<T>,
    /// Inside camera whose frustum should be outlined, when visible.
    pub helper: Option<&'a PerspectiveCamera>,
}

/// A renderer able to host one point cloud.
pub trait RenderBackend {
    /// Handle to the color/depth textures the material samples.
    type Textures;
    type Error;

    /// Rejects a point grid the backend cannot hold. Called before the
    /// geometry is allocated.
    fn check_grid(&self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    /// Allocates textures for frames of the source's size.
    fn create_textures(&mut self, metadata: &SourceMetadata) -> Result<Self::Textures>;

    /// Uploads the geometry of a freshly built point cloud.
    fn prepare_mesh(&mut self, cloud: &PointCloud<Self::Textures>) -> Result<()>;

    /// Draws `scene` as seen from `camera`.
    fn render(
        &mut self,
        scene: &Scene<'_, Self::Textures>,
        camera: &PerspectiveCamera,
    ) -> std::result::Result<(), Self::Error>;
}
