//! Type definitions for the BEV voxel volume.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::LutError;
use crate::tensor::Tensor;

/// Geometry of a regular voxel volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelGridConfig {
    /// Voxel counts along x, y, z.
    pub n_voxels: [usize; 3],
    /// Physical voxel dimensions along x, y, z.
    pub voxel_size: [f32; 3],
    /// World-space origin of the volume.
    pub origin: [f32; 3],
}

impl Default for VoxelGridConfig {
    fn default() -> Self {
        Self {
            n_voxels: [200, 200, 4],
            voxel_size: [0.5, 0.5, 1.5],
            origin: [0.0, 0.0, -1.0],
        }
    }
}

impl VoxelGridConfig {
    pub fn new(n_voxels: [usize; 3], voxel_size: [f32; 3], origin: [f32; 3]) -> Self {
        Self {
            n_voxels,
            voxel_size,
            origin,
        }
    }

    /// Build from voxel counts plus 3-element size and origin tensors.
    pub fn from_tensors(
        n_voxels: [usize; 3],
        voxel_size: &Tensor,
        origin: &Tensor,
    ) -> Result<Self, LutError> {
        let config = Self {
            n_voxels,
            voxel_size: voxel_size.to_vec3("voxel_size")?,
            origin: origin.to_vec3("origin")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject empty volumes and non-finite geometry.
    pub fn validate(&self) -> Result<(), LutError> {
        for (axis, &n) in ["x", "y", "z"].iter().zip(&self.n_voxels) {
            if n == 0 {
                return Err(LutError::argument(
                    "n_voxels",
                    format!("voxel count along {axis} must be positive"),
                ));
            }
        }
        if self.checked_total().is_none() {
            return Err(LutError::argument("n_voxels", "voxel count overflows usize"));
        }
        if self.voxel_size.iter().any(|v| !v.is_finite()) {
            return Err(LutError::argument("voxel_size", "must be finite"));
        }
        if self.origin.iter().any(|v| !v.is_finite()) {
            return Err(LutError::argument("origin", "must be finite"));
        }
        Ok(())
    }

    fn checked_total(&self) -> Option<usize> {
        self.n_voxels[0]
            .checked_mul(self.n_voxels[1])?
            .checked_mul(self.n_voxels[2])
    }

    /// Total number of voxels.
    pub fn total_voxels(&self) -> usize {
        self.n_voxels[0] * self.n_voxels[1] * self.n_voxels[2]
    }

    /// World-space center of a voxel.
    ///
    /// `(idx - n / 2) * size + origin` per axis. For odd counts the grid is
    /// biased by half a voxel; consumers of existing tables rely on it.
    #[inline]
    pub fn center(&self, index: VoxelIndex) -> Vector3<f32> {
        let axis = |i: usize, idx: usize| {
            (idx as f32 - self.n_voxels[i] as f32 / 2.0) * self.voxel_size[i] + self.origin[i]
        };
        Vector3::new(axis(0, index.x), axis(1, index.y), axis(2, index.z))
    }

    /// Flat row-major offset: `z * n_y * n_x + y * n_x + x`.
    #[inline]
    pub fn offset(&self, index: VoxelIndex) -> usize {
        let [n_x, n_y, _] = self.n_voxels;
        (index.z * n_y + index.y) * n_x + index.x
    }

    /// Inverse of [`offset`](Self::offset).
    #[inline]
    pub fn index_of(&self, offset: usize) -> VoxelIndex {
        let [n_x, n_y, _] = self.n_voxels;
        let plane = n_x * n_y;
        let z = offset / plane;
        let remainder = offset % plane;
        VoxelIndex::new(remainder % n_x, remainder / n_x, z)
    }

    /// Iterate voxel indices in flat offset order (z outer, x inner).
    pub fn indices(&self) -> impl Iterator<Item = VoxelIndex> + '_ {
        (0..self.total_voxels()).map(move |offset| self.index_of(offset))
    }
}

/// Integer voxel index within the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoxelIndex {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl VoxelIndex {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_grid(n: usize) -> VoxelGridConfig {
        VoxelGridConfig::new([n, n, n], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0])
    }

    #[test]
    fn test_center_even_grid() {
        let grid = unit_grid(2);

        let c = grid.center(VoxelIndex::new(0, 0, 0));
        assert_relative_eq!(c, Vector3::new(-1.0, -1.0, -1.0));

        let c = grid.center(VoxelIndex::new(1, 1, 1));
        assert_relative_eq!(c, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_center_odd_grid_keeps_half_voxel_bias() {
        let grid = unit_grid(3);

        // 1 - 3/2 = -0.5, not 0.0
        let c = grid.center(VoxelIndex::new(1, 1, 1));
        assert_relative_eq!(c, Vector3::new(-0.5, -0.5, -0.5));
    }

    #[test]
    fn test_center_size_and_origin() {
        let grid = VoxelGridConfig::new([4, 2, 1], [0.5, 2.0, 3.0], [10.0, -5.0, 1.0]);

        let c = grid.center(VoxelIndex::new(3, 0, 0));
        assert_relative_eq!(c.x, (3.0 - 2.0) * 0.5 + 10.0);
        assert_relative_eq!(c.y, (0.0 - 1.0) * 2.0 - 5.0);
        assert_relative_eq!(c.z, (0.0 - 0.5) * 3.0 + 1.0);
    }

    #[test]
    fn test_offset_index_roundtrip() {
        let grid = VoxelGridConfig::new([5, 3, 4], [1.0; 3], [0.0; 3]);

        let mut expected = 0;
        for z in 0..4 {
            for y in 0..3 {
                for x in 0..5 {
                    let index = VoxelIndex::new(x, y, z);
                    assert_eq!(grid.offset(index), expected);
                    assert_eq!(grid.index_of(expected), index);
                    expected += 1;
                }
            }
        }
        assert_eq!(expected, grid.total_voxels());
    }

    #[test]
    fn test_indices_order() {
        let grid = VoxelGridConfig::new([2, 2, 2], [1.0; 3], [0.0; 3]);
        let indices: Vec<_> = grid.indices().collect();

        assert_eq!(indices.len(), 8);
        assert_eq!(indices[0], VoxelIndex::new(0, 0, 0));
        assert_eq!(indices[1], VoxelIndex::new(1, 0, 0));
        assert_eq!(indices[2], VoxelIndex::new(0, 1, 0));
        assert_eq!(indices[4], VoxelIndex::new(0, 0, 1));
    }

    #[test]
    fn test_validate() {
        assert!(unit_grid(2).validate().is_ok());
        assert!(VoxelGridConfig::default().validate().is_ok());

        let grid = VoxelGridConfig::new([2, 0, 2], [1.0; 3], [0.0; 3]);
        assert!(matches!(
            grid.validate(),
            Err(LutError::InvalidArgument { name: "n_voxels", .. })
        ));

        let grid = VoxelGridConfig::new([2, 2, 2], [1.0, f32::NAN, 1.0], [0.0; 3]);
        assert!(grid.validate().is_err());

        let grid = VoxelGridConfig::new([usize::MAX, 2, 2], [1.0; 3], [0.0; 3]);
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_from_tensors() {
        let size = Tensor::from_slice(&[1.0, 1.0, 1.0]).unwrap();
        let origin = Tensor::from_slice(&[0.0, 0.0, 0.0]).unwrap();
        let grid = VoxelGridConfig::from_tensors([2, 2, 2], &size, &origin).unwrap();
        assert_eq!(grid, unit_grid(2));

        let bad_origin = Tensor::new(vec![2, 2], vec![0.0; 4]).unwrap();
        let err = VoxelGridConfig::from_tensors([2, 2, 2], &size, &bad_origin).unwrap_err();
        assert_eq!(err, LutError::shape("origin", 3, 4));
    }
}
