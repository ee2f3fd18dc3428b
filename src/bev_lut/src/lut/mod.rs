//! Voxel-to-image lookup table construction.
//!
//! For every voxel of the BEV volume the table records the first camera, in
//! index order, whose image contains the projected voxel center, and the
//! linear pixel index `y * width + x` in that camera's feature map.
//!
//! # Layout
//!
//! All buffers are indexed by the voxel's flat offset
//! `z * n_y * n_x + y * n_x + x`:
//! - `lut[2 * offset]` - camera index, or `-1` if unobserved
//! - `lut[2 * offset + 1]` - pixel index, `0` if unobserved
//! - `valid[offset]` - `1` if observed, else `0`
//! - `volume[offset]` - reserved for the gather stage, never written here
//!
//! # Example
//!
//! ```ignore
//! use bev_lut::{CameraSet, ImagePlane, LutBuilder, VoxelGridConfig};
//!
//! let grid = VoxelGridConfig::new([200, 200, 4], [0.5, 0.5, 1.5], [0.0, 0.0, -1.0]);
//! let cameras = CameraSet::new(6, projection)?;
//! let image = ImagePlane::new(64, 176, 64);
//!
//! let table = LutBuilder::new(grid, cameras, image).build()?;
//! println!("observed {} voxels", table.stats().valid_voxels);
//! ```

pub mod cpu;

pub use cpu::{resolve_voxel, NO_CAMERA};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::camera::{CameraSet, ImagePlane, PixelRounding};
use crate::error::{check_len, LutError};
use crate::time_phase;
use crate::timing::{BuildTiming, TimingCollector};
use crate::voxel_grid::VoxelGridConfig;

use cpu::{build_lut_parallel, build_lut_sequential};

/// Configuration for lookup table construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LutConfig {
    /// Rounding applied to projected pixel coordinates.
    pub rounding: PixelRounding,

    /// Whether to split the voxel loop across the rayon thread pool.
    /// The result is identical either way.
    pub parallel: bool,

    /// Grids with fewer voxels than this are always built sequentially.
    pub min_parallel_voxels: usize,
}

impl Default for LutConfig {
    fn default() -> Self {
        Self {
            rounding: PixelRounding::HalfAwayFromZero,
            parallel: true,
            min_parallel_voxels: 4096,
        }
    }
}

impl LutConfig {
    fn use_parallel(&self, total_voxels: usize) -> bool {
        self.parallel && total_voxels >= self.min_parallel_voxels
    }
}

/// Decoded lookup table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LutEntry {
    /// Observing camera, `None` if no camera sees the voxel.
    pub camera: Option<u32>,
    /// Linear pixel index in the camera's feature map. Meaningless when
    /// `camera` is `None`.
    pub pixel: u32,
}

impl LutEntry {
    pub fn from_pair(camera: i32, pixel: i32) -> Self {
        Self {
            camera: u32::try_from(camera).ok(),
            pixel: pixel.max(0) as u32,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.camera.is_some()
    }
}

/// Summary of a finished table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LutStats {
    pub total_voxels: usize,
    /// Voxels observed by any camera.
    pub valid_voxels: usize,
    /// Observed voxels per camera.
    pub per_camera: Vec<usize>,
}

impl LutStats {
    /// Fraction of voxels observed by any camera.
    pub fn coverage(&self) -> f64 {
        if self.total_voxels == 0 {
            return 0.0;
        }
        self.valid_voxels as f64 / self.total_voxels as f64
    }
}

/// Owned lookup table buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    lut: Vec<i32>,
    valid: Vec<i32>,
    volume: Vec<f32>,
    n_images: usize,
    timing: BuildTiming,
}

impl LookupTable {
    /// Allocate buffers for `total_voxels` voxels, every entry unobserved.
    pub fn allocate(total_voxels: usize) -> Self {
        let mut lut = vec![0; total_voxels * 2];
        for pair in lut.chunks_exact_mut(2) {
            pair[0] = NO_CAMERA;
        }
        Self {
            lut,
            valid: vec![0; total_voxels],
            volume: vec![0.0; total_voxels],
            n_images: 0,
            timing: BuildTiming::default(),
        }
    }

    pub fn total_voxels(&self) -> usize {
        self.valid.len()
    }

    /// Interleaved `(camera, pixel)` pairs, `2 * total_voxels` elements.
    pub fn lut(&self) -> &[i32] {
        &self.lut
    }

    pub fn valid(&self) -> &[i32] {
        &self.valid
    }

    pub fn volume(&self) -> &[f32] {
        &self.volume
    }

    /// Mutable access for the gather stage that fills the volume.
    pub fn volume_mut(&mut self) -> &mut [f32] {
        &mut self.volume
    }

    /// Timings of the last build. All zero without the `profiling` feature.
    pub fn timing(&self) -> &BuildTiming {
        &self.timing
    }

    pub fn into_parts(self) -> (Vec<i32>, Vec<i32>, Vec<f32>) {
        (self.lut, self.valid, self.volume)
    }

    pub fn entry(&self, offset: usize) -> Option<LutEntry> {
        let pair = self.lut.get(offset * 2..offset * 2 + 2)?;
        Some(LutEntry::from_pair(pair[0], pair[1]))
    }

    pub fn is_valid(&self, offset: usize) -> bool {
        self.valid.get(offset).is_some_and(|&v| v == 1)
    }

    /// Entries in offset order.
    pub fn entries(&self) -> impl Iterator<Item = LutEntry> + '_ {
        self.lut
            .chunks_exact(2)
            .map(|pair| LutEntry::from_pair(pair[0], pair[1]))
    }

    pub fn stats(&self) -> LutStats {
        compute_stats(&self.lut, &self.valid, self.n_images)
    }
}

fn compute_stats(lut: &[i32], valid: &[i32], n_images: usize) -> LutStats {
    let mut per_camera = vec![0usize; n_images];
    let mut valid_voxels = 0;
    for (pair, &flag) in lut.chunks_exact(2).zip(valid) {
        if flag != 1 {
            continue;
        }
        valid_voxels += 1;
        if let Some(count) = usize::try_from(pair[0])
            .ok()
            .and_then(|c| per_camera.get_mut(c))
        {
            *count += 1;
        }
    }
    LutStats {
        total_voxels: valid.len(),
        valid_voxels,
        per_camera,
    }
}

/// Builds lookup tables for a fixed grid, camera set and image plane.
#[derive(Debug, Clone)]
pub struct LutBuilder {
    grid: VoxelGridConfig,
    cameras: CameraSet,
    image: ImagePlane,
    config: LutConfig,
}

impl LutBuilder {
    pub fn new(grid: VoxelGridConfig, cameras: CameraSet, image: ImagePlane) -> Self {
        Self {
            grid,
            cameras,
            image,
            config: LutConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: LutConfig) -> Self {
        self.config = config;
        self
    }

    /// Set pixel rounding mode.
    pub fn rounding(mut self, rounding: PixelRounding) -> Self {
        self.config.rounding = rounding;
        self
    }

    /// Enable or disable the parallel kernel.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Set the voxel count below which builds stay sequential.
    pub fn min_parallel_voxels(mut self, min_parallel_voxels: usize) -> Self {
        self.config.min_parallel_voxels = min_parallel_voxels;
        self
    }

    pub fn grid(&self) -> &VoxelGridConfig {
        &self.grid
    }

    pub fn cameras(&self) -> &CameraSet {
        &self.cameras
    }

    pub fn image(&self) -> &ImagePlane {
        &self.image
    }

    /// Check grid and image parameters.
    pub fn validate(&self) -> Result<(), LutError> {
        self.grid.validate()?;
        self.image.validate()
    }

    /// Build a new table.
    pub fn build(&self) -> Result<LookupTable, LutError> {
        self.validate()?;
        let mut table = LookupTable::allocate(self.grid.total_voxels());
        self.build_into(&mut table)?;
        Ok(table)
    }

    /// Rebuild into an existing table, reusing its buffers.
    pub fn build_into(&self, table: &mut LookupTable) -> Result<(), LutError> {
        let mut collector = TimingCollector::new();
        collector.start();

        self.fill(
            &mut collector,
            &mut table.lut,
            &mut table.valid,
            &table.volume,
        )?;
        table.n_images = self.cameras.len();

        let stats = time_phase!(collector, "stats", table.stats());
        log_stats(&stats);

        table.timing = collector.finish();
        Ok(())
    }

    /// Build into caller-owned buffers and return the build timing.
    ///
    /// `lut`, `valid` and `volume` must hold `2 * total`, `total` and
    /// `total` elements. Every element of `lut` and `valid` is overwritten;
    /// `volume` is only checked for size.
    pub fn build_into_slices(
        &self,
        lut: &mut [i32],
        valid: &mut [i32],
        volume: &[f32],
    ) -> Result<BuildTiming, LutError> {
        let mut collector = TimingCollector::new();
        collector.start();
        self.fill(&mut collector, lut, valid, volume)?;

        let stats = time_phase!(
            collector,
            "stats",
            compute_stats(lut, valid, self.cameras.len())
        );
        log_stats(&stats);

        Ok(collector.finish())
    }

    fn fill(
        &self,
        collector: &mut TimingCollector,
        lut: &mut [i32],
        valid: &mut [i32],
        volume: &[f32],
    ) -> Result<(), LutError> {
        let total = time_phase!(collector, "validate", {
            self.validate()?;
            let total = self.grid.total_voxels();
            check_len("lut", total * 2, lut.len())?;
            check_len("valid", total, valid.len())?;
            check_len("volume", total, volume.len())?;
            total
        });

        debug!(
            n_voxels = ?self.grid.n_voxels,
            n_images = self.cameras.len(),
            height = self.image.height,
            width = self.image.width,
            "Building voxel lookup table"
        );

        let rounding = self.config.rounding;
        time_phase!(collector, "kernel", {
            let (grid, cameras, image) = (&self.grid, &self.cameras, &self.image);
            if self.config.use_parallel(total) {
                trace!(total, "Using parallel kernel");
                build_lut_parallel(grid, cameras, image, rounding, lut, valid);
            } else {
                trace!(total, "Using sequential kernel");
                build_lut_sequential(grid, cameras, image, rounding, lut, valid);
            }
        });

        Ok(())
    }
}

fn log_stats(stats: &LutStats) {
    if stats.valid_voxels == 0 {
        warn!(
            total_voxels = stats.total_voxels,
            "No voxel is observed by any camera"
        );
    } else {
        debug!(
            valid_voxels = stats.valid_voxels,
            total_voxels = stats.total_voxels,
            per_camera = ?stats.per_camera,
            "Lookup table built"
        );
    }
}

/// Build a lookup table into caller-owned buffers.
///
/// Sequential, with the default rounding. `n_channels` of `image` is not
/// used. See [`LutBuilder`] for the configurable, owning variant.
///
/// # Errors
/// * [`LutError::InvalidArgument`] for empty grids or image planes
/// * [`LutError::InvalidShape`] when a buffer length does not match the grid
pub fn build_lut(
    grid: &VoxelGridConfig,
    cameras: &CameraSet,
    image: &ImagePlane,
    lut: &mut [i32],
    valid: &mut [i32],
    volume: &[f32],
) -> Result<(), LutError> {
    grid.validate()?;
    image.validate()?;

    let total = grid.total_voxels();
    check_len("lut", total * 2, lut.len())?;
    check_len("valid", total, valid.len())?;
    check_len("volume", total, volume.len())?;

    build_lut_sequential(grid, cameras, image, PixelRounding::default(), lut, valid);
    Ok(())
}
