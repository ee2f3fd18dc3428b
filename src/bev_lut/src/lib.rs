//! Voxel-to-image lookup tables for multi-camera BEV perception.
//!
//! Given a regular voxel volume and per-camera 3×4 projection matrices, this
//! library computes, for every voxel, the first camera that observes the
//! voxel center and the pixel it lands on. A downstream stage uses the table
//! to gather image features into the volume without repeating the
//! projection per frame.
//!
//! # Usage
//!
//! ```ignore
//! use bev_lut::{CameraSet, ImagePlane, LutBuilder, Tensor, VoxelGridConfig};
//!
//! let voxel_size = Tensor::from_slice(&[0.5, 0.5, 1.5])?;
//! let origin = Tensor::from_slice(&[0.0, 0.0, -1.0])?;
//! let grid = VoxelGridConfig::from_tensors([200, 200, 4], &voxel_size, &origin)?;
//!
//! // [n_images, 3, 4] projection matrices, row-major
//! let projection = Tensor::new(vec![6, 3, 4], load_projection())?;
//! let cameras = CameraSet::from_tensor(&projection)?;
//!
//! let table = LutBuilder::new(grid, cameras, ImagePlane::new(64, 176, 64)).build()?;
//! let (lut, valid, volume) = table.into_parts();
//! ```

pub mod camera;
pub mod error;
pub mod lut;
pub mod tensor;
pub mod test_utils;
pub mod timing;
pub mod voxel_grid;

pub use camera::{CameraSet, ImagePlane, PixelRounding, Projection};
pub use error::LutError;
pub use lut::{build_lut, LookupTable, LutBuilder, LutConfig, LutEntry, LutStats, NO_CAMERA};
pub use tensor::Tensor;
pub use timing::BuildTiming;
pub use voxel_grid::{VoxelGridConfig, VoxelIndex};
