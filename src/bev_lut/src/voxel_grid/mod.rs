//! BEV voxel volume geometry.
//!
//! The volume is a dense `n_x × n_y × n_z` grid. Voxels are addressed either by
//! a [`VoxelIndex`] or by their flat row-major offset
//! `z * n_y * n_x + y * n_x + x`, which is also the row index into every
//! per-voxel output buffer.

pub mod types;

pub use types::{VoxelGridConfig, VoxelIndex};
