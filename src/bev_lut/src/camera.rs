//! Camera projection matrices and the shared image plane.
//!
//! Every camera is described by a 3×4 matrix mapping homogeneous world
//! coordinates to homogeneous image coordinates (intrinsics × [R | t]).
//! Matrices are stored row-major, cameras consecutive, so camera `c`, row `r`,
//! column `k` lives at `(c * 3 + r) * 4 + k`.

use nalgebra::{Matrix3x4, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::LutError;
use crate::tensor::Tensor;

/// Elements per projection matrix.
pub const PROJECTION_LEN: usize = 12;

/// Feature map dimensions shared by all cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePlane {
    pub height: usize,
    pub width: usize,
    /// Feature channels per pixel. Carried for the gather stage, the lookup
    /// table itself does not depend on it.
    pub n_channels: usize,
}

impl ImagePlane {
    pub fn new(height: usize, width: usize, n_channels: usize) -> Self {
        Self {
            height,
            width,
            n_channels,
        }
    }

    /// Pixel indices are stored as `i32`, so the plane must fit.
    pub fn validate(&self) -> Result<(), LutError> {
        if self.height == 0 {
            return Err(LutError::argument("height", "must be positive"));
        }
        if self.width == 0 {
            return Err(LutError::argument("width", "must be positive"));
        }
        match self.height.checked_mul(self.width) {
            Some(n) if n <= i32::MAX as usize => Ok(()),
            _ => Err(LutError::argument(
                "height * width",
                "pixel count does not fit in i32",
            )),
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Linear pixel index `y * width + x` if `(x, y)` lies on the plane.
    #[inline]
    pub fn pixel_index(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as u32)
    }

    /// Inverse of [`pixel_index`](Self::pixel_index), `None` if the index
    /// is off the plane.
    pub fn pixel_coords(&self, pixel_index: u32) -> Option<(usize, usize)> {
        let i = pixel_index as usize;
        if i >= self.pixel_count() {
            return None;
        }
        Some((i % self.width, i / self.width))
    }
}

/// How projected coordinates are snapped to integer pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelRounding {
    /// `f32::round`: ties away from zero, the C `round` behavior existing
    /// tables were produced with.
    #[default]
    HalfAwayFromZero,
    /// Banker's rounding.
    HalfToEven,
}

impl PixelRounding {
    #[inline]
    pub fn apply(self, v: f32) -> i32 {
        // `as` saturates and maps NaN to 0. Callers reject non-finite input.
        match self {
            PixelRounding::HalfAwayFromZero => v.round() as i32,
            PixelRounding::HalfToEven => v.round_ties_even() as i32,
        }
    }
}

/// Homogeneous image coordinates of one projected point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub u: f32,
    pub v: f32,
    /// Third homogeneous coordinate, positive in front of the camera.
    pub depth: f32,
}

impl Projection {
    /// Pixel the point lands on, or `None` if it is behind the camera, off
    /// the plane, or not finite.
    #[inline]
    pub fn pixel(&self, image: &ImagePlane, rounding: PixelRounding) -> Option<u32> {
        if self.depth.is_nan() || self.depth <= 0.0 {
            return None;
        }
        let (x, y) = (self.u / self.depth, self.v / self.depth);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        image.pixel_index(rounding.apply(x), rounding.apply(y))
    }
}

/// Projection matrices for an ordered set of cameras.
///
/// Camera order is priority order when building the lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSet {
    n_images: usize,
    projection: Vec<f32>,
}

impl CameraSet {
    /// Wrap a flat `n_images * 12` buffer. Every element must be finite.
    pub fn new(n_images: usize, projection: Vec<f32>) -> Result<Self, LutError> {
        if n_images == 0 {
            return Err(LutError::argument("n_images", "must be positive"));
        }
        if n_images > i32::MAX as usize {
            return Err(LutError::argument("n_images", "does not fit in i32"));
        }
        let expected = n_images
            .checked_mul(PROJECTION_LEN)
            .ok_or_else(|| LutError::argument("n_images", "overflows usize"))?;
        if projection.len() != expected {
            return Err(LutError::shape("projection", expected, projection.len()));
        }
        if let Some(i) = projection.iter().position(|v| !v.is_finite()) {
            return Err(LutError::argument(
                "projection",
                format!("element {i} is not finite"),
            ));
        }
        Ok(Self {
            n_images,
            projection,
        })
    }

    /// Accepts `[n, 3, 4]` or, for a single camera, `[3, 4]`.
    pub fn from_tensor(tensor: &Tensor) -> Result<Self, LutError> {
        let n_images = match tensor.dims() {
            &[n, 3, 4] => n,
            &[3, 4] => 1,
            _ => {
                return Err(LutError::argument(
                    "projection",
                    format!("expected shape [n, 3, 4], got {:?}", tensor.dims()),
                ))
            }
        };
        Self::new(n_images, tensor.data().to_vec())
    }

    pub fn from_matrices(matrices: &[Matrix3x4<f32>]) -> Result<Self, LutError> {
        let mut projection = Vec::with_capacity(matrices.len() * PROJECTION_LEN);
        for m in matrices {
            for row in 0..3 {
                for col in 0..4 {
                    projection.push(m[(row, col)]);
                }
            }
        }
        Self::new(matrices.len(), projection)
    }

    pub fn len(&self) -> usize {
        self.n_images
    }

    pub fn is_empty(&self) -> bool {
        self.n_images == 0
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.projection
    }

    /// Element `(row, col)` of camera `camera`.
    ///
    /// # Panics
    /// If `camera >= self.len()`, `row >= 3` or `col >= 4`.
    #[inline]
    pub fn get(&self, camera: usize, row: usize, col: usize) -> f32 {
        self.projection[(camera * 3 + row) * 4 + col]
    }

    pub fn matrix(&self, camera: usize) -> Matrix3x4<f32> {
        Matrix3x4::from_fn(|row, col| self.get(camera, row, col))
    }

    /// Project a world point through one camera.
    ///
    /// Each row starts from the translation column and accumulates the
    /// linear part in column order, which fixes the rounding of the result.
    ///
    /// # Panics
    /// If `camera >= self.len()`.
    #[inline]
    pub fn project(&self, camera: usize, point: &Vector3<f32>) -> Projection {
        let m = &self.projection[camera * PROJECTION_LEN..(camera + 1) * PROJECTION_LEN];
        let mut ar = [0.0f32; 3];
        for (i, a) in ar.iter_mut().enumerate() {
            let row = &m[i * 4..i * 4 + 4];
            *a = row[3];
            for (p, x) in row[..3].iter().zip(point.iter()) {
                *a += p * x;
            }
        }
        Projection {
            u: ar[0],
            v: ar[1],
            depth: ar[2],
        }
    }
}
