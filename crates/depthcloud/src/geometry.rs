//! Flat vertex index geometry: one vertex per source pixel.

use crate::error::{Error, Result};

/// Components stored per vertex.
pub const COMPONENTS: usize = 3;

/// Position buffer addressing every pixel of a `width x height` grid.
///
/// Vertex `j` stores `(j % width, j / width, 0)`. Depth is not known on the
/// CPU; the vertex shader derives it from the depth texture every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    width: u32,
    height: u32,
    positions: Vec<f32>,
}

/// Allocates and fills the position buffer for a grid.
pub fn build_geometry(width: u32, height: u32) -> Result<GridGeometry> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidGrid { width, height });
    }

    let count = width as usize * height as usize;
    let mut positions = vec![0.0f32; count * COMPONENTS];
    for (j, vertex) in positions.chunks_exact_mut(COMPONENTS).enumerate() {
        vertex[0] = (j % width as usize) as f32;
        vertex[1] = (j / width as usize) as f32;
    }

    log::debug!("Built {}x{} grid geometry ({} vertices)", width, height, count);

    Ok(GridGeometry {
        width,
        height,
        positions,
    })
}

impl GridGeometry {
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of vertices (pixels).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / COMPONENTS
    }

    /// The flat `[x, y, z, x, y, z, ...]` buffer.
    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn vertex(&self, j: usize) -> Option<[f32; 3]> {
        let start = j.checked_mul(COMPONENTS)?;
        self.positions
            .get(start..start + COMPONENTS)
            .map(|v| [v[0], v[1], v[2]])
    }

    /// Raw bytes for a vertex buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_length_and_layout() {
        for &(w, h) in &[(1u32, 1u32), (3, 2), (7, 5), (64, 1), (1, 64)] {
            let g = build_geometry(w, h).unwrap();
            assert_eq!(g.positions().len(), (w * h * 3) as usize);
            assert_eq!(g.vertex_count(), (w * h) as usize);

            for j in 0..(w * h) as usize {
                let v = g.vertex(j).unwrap();
                assert_eq!(v[0], (j % w as usize) as f32);
                assert_eq!(v[1], (j / w as usize) as f32);
                assert_eq!(v[2], 0.0);
            }
        }
    }

    #[test]
    fn test_large_grid_last_vertex() {
        let g = build_geometry(800, 600).unwrap();
        assert_eq!(g.positions().len(), 800 * 600 * 3);
        assert_eq!(g.vertex(800 * 600 - 1), Some([799.0, 599.0, 0.0]));
        assert_eq!(g.vertex(800 * 600), None);
        assert_eq!(g.as_bytes().len(), 800 * 600 * 3 * 4);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(build_geometry(13, 9).unwrap(), build_geometry(13, 9).unwrap());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(
            build_geometry(0, 10),
            Err(Error::InvalidGrid { width: 0, height: 10 })
        );
        assert!(build_geometry(10, 0).is_err());
    }
}
