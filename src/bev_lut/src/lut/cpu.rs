//! CPU kernels for lookup table construction.
//!
//! Both kernels assume validated inputs: `lut.len() == 2 * total_voxels` and
//! `valid.len() == total_voxels`. The parallel kernel produces output
//! identical to the sequential one.

use rayon::prelude::*;

use crate::camera::{CameraSet, ImagePlane, PixelRounding};
use crate::voxel_grid::{VoxelGridConfig, VoxelIndex};

/// Camera index stored for voxels no camera observes.
pub const NO_CAMERA: i32 = -1;

/// Find the first camera, in index order, that sees the voxel center.
///
/// Returns `(camera, pixel_index)`. Nearer cameras later in the order never
/// override an earlier match.
#[inline]
pub fn resolve_voxel(
    grid: &VoxelGridConfig,
    cameras: &CameraSet,
    image: &ImagePlane,
    rounding: PixelRounding,
    index: VoxelIndex,
) -> Option<(u32, u32)> {
    let center = grid.center(index);
    (0..cameras.len()).find_map(|camera| {
        cameras
            .project(camera, &center)
            .pixel(image, rounding)
            .map(|pixel| (camera as u32, pixel))
    })
}

/// Write one voxel's entry. The flag is always written, so stale buffers
/// are fully overwritten.
#[inline]
fn write_entry(pair: &mut [i32], flag: &mut i32, hit: Option<(u32, u32)>) {
    match hit {
        Some((camera, pixel)) => {
            pair[0] = camera as i32;
            pair[1] = pixel as i32;
            *flag = 1;
        }
        None => {
            pair[0] = NO_CAMERA;
            pair[1] = 0;
            *flag = 0;
        }
    }
}

/// Single-threaded reference kernel. Voxels are visited z-major, x-minor.
pub(crate) fn build_lut_sequential(
    grid: &VoxelGridConfig,
    cameras: &CameraSet,
    image: &ImagePlane,
    rounding: PixelRounding,
    lut: &mut [i32],
    valid: &mut [i32],
) {
    debug_assert_eq!(lut.len(), grid.total_voxels() * 2);
    debug_assert_eq!(valid.len(), grid.total_voxels());

    for (offset, (pair, flag)) in lut.chunks_exact_mut(2).zip(valid.iter_mut()).enumerate() {
        let hit = resolve_voxel(grid, cameras, image, rounding, grid.index_of(offset));
        write_entry(pair, flag, hit);
    }
}

/// Data-parallel kernel. Each worker derives its voxel index from the
/// output offset, so there is no shared counter.
pub(crate) fn build_lut_parallel(
    grid: &VoxelGridConfig,
    cameras: &CameraSet,
    image: &ImagePlane,
    rounding: PixelRounding,
    lut: &mut [i32],
    valid: &mut [i32],
) {
    debug_assert_eq!(lut.len(), grid.total_voxels() * 2);
    debug_assert_eq!(valid.len(), grid.total_voxels());

    lut.par_chunks_exact_mut(2)
        .zip(valid.par_iter_mut())
        .enumerate()
        .for_each(|(offset, (pair, flag))| {
            let hit = resolve_voxel(grid, cameras, image, rounding, grid.index_of(offset));
            write_entry(pair, flag, hit);
        });
}
