//! Synthetic cameras and grids for tests.
//!
//! Provides camera rigs with known geometry so lookup tables can be checked
//! against hand-computed projections.

use std::f32::consts::PI;

use nalgebra::{Matrix3, Matrix3x4, Vector3};

use crate::camera::{CameraSet, ImagePlane};
use crate::voxel_grid::VoxelGridConfig;

/// Single camera with identity rotation and unit translation along depth:
///
/// ```text
/// [1 0 0 0]
/// [0 1 0 0]
/// [0 0 1 1]
/// ```
pub fn identity_camera() -> CameraSet {
    let m = Matrix3x4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 1.0,
    );
    CameraSet::from_matrices(&[m]).expect("one camera is a valid set")
}

/// Compose `K · [R | t]` for a pinhole camera.
///
/// # Arguments
/// * `fx`, `fy`, `cx`, `cy` - Intrinsics in pixels
/// * `rotation` - World-to-camera rotation
/// * `translation` - World-to-camera translation
pub fn pinhole_projection(
    fx: f32,
    fy: f32,
    cx: f32,
    cy: f32,
    rotation: &Matrix3<f32>,
    translation: &Vector3<f32>,
) -> Matrix3x4<f32> {
    let k = Matrix3::new(
        fx, 0.0, cx, //
        0.0, fy, cy, //
        0.0, 0.0, 1.0,
    );
    let mut extrinsic = Matrix3x4::<f32>::zeros();
    extrinsic.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    extrinsic.set_column(3, translation);
    k * extrinsic
}

/// World-to-camera rotation for a camera at the ego origin looking
/// horizontally along `yaw` (radians, counter-clockwise from +x).
///
/// Camera axes: x right, y down, z forward. World z is up.
pub fn yaw_rotation(yaw: f32) -> Matrix3<f32> {
    let (s, c) = yaw.sin_cos();
    Matrix3::new(
        s, -c, 0.0, // right
        0.0, 0.0, -1.0, // down
        c, s, 0.0, // forward
    )
}

/// `n_images` cameras at the ego origin, evenly spaced in yaw, each with a
/// 90° horizontal field of view on `image`.
///
/// Camera 0 looks along +x.
pub fn make_surround_rig(n_images: usize, image: &ImagePlane) -> CameraSet {
    let f = image.width as f32 / 2.0;
    let cx = image.width as f32 / 2.0;
    let cy = image.height as f32 / 2.0;

    let matrices: Vec<_> = (0..n_images)
        .map(|i| {
            let yaw = 2.0 * PI * i as f32 / n_images as f32;
            pinhole_projection(f, f, cx, cy, &yaw_rotation(yaw), &Vector3::zeros())
        })
        .collect();

    CameraSet::from_matrices(&matrices).expect("rig matrices are well formed")
}

/// A small BEV volume centered on the ego origin.
pub fn make_bev_grid(n_xy: usize, n_z: usize, size: f32) -> VoxelGridConfig {
    VoxelGridConfig::new([n_xy, n_xy, n_z], [size, size, size], [0.0, 0.0, 0.0])
}

/// Surround rig with every matrix element scaled by `1 + N(0, 0.2)`, so
/// visibility boundaries fall at arbitrary positions. Deterministic in `seed`.
#[cfg(test)]
pub fn make_random_projections(n_images: usize, image: &ImagePlane, seed: u64) -> CameraSet {
    use rand::prelude::*;
    use rand_distr::Normal;

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0f32, 0.2).unwrap();
    let rig = make_surround_rig(n_images, image);

    let projection = rig
        .as_slice()
        .iter()
        .map(|&v| v * (1.0 + noise.sample(&mut rng)))
        .collect();
    CameraSet::new(n_images, projection).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_yaw_rotation_is_orthonormal() {
        for yaw in [0.0, 0.7, PI / 2.0, 2.5] {
            let r = yaw_rotation(yaw);
            assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-6);
            assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rig_projects_forward_point_to_center() {
        let image = ImagePlane::new(32, 64, 1);
        let rig = make_surround_rig(4, &image);
        assert_eq!(rig.len(), 4);

        // 10 m ahead of camera 1 (yaw 90°), at camera height.
        let p = rig.project(1, &Vector3::new(0.0, 10.0, 0.0));
        assert_relative_eq!(p.depth, 10.0, epsilon = 1e-4);
        assert_relative_eq!(p.u / p.depth, 32.0, epsilon = 1e-3);
        assert_relative_eq!(p.v / p.depth, 16.0, epsilon = 1e-3);

        // The same point is behind camera 3.
        let p = rig.project(3, &Vector3::new(0.0, 10.0, 0.0));
        assert!(p.depth < 0.0);
    }

    #[test]
    fn test_point_above_projects_up() {
        let image = ImagePlane::new(32, 64, 1);
        let rig = make_surround_rig(1, &image);

        let p = rig.project(0, &Vector3::new(10.0, 0.0, 1.0));
        assert!(p.v / p.depth < 16.0);
    }

    #[test]
    fn test_pinhole_projection_translation() {
        let p = pinhole_projection(
            100.0,
            100.0,
            50.0,
            50.0,
            &Matrix3::identity(),
            &Vector3::new(0.0, 0.0, 2.0),
        );
        assert_relative_eq!(p[(0, 3)], 100.0);
        assert_relative_eq!(p[(1, 3)], 100.0);
        assert_relative_eq!(p[(2, 3)], 2.0);
    }

    #[test]
    fn test_random_projections_are_seeded() {
        let image = ImagePlane::new(16, 44, 8);
        let a = make_random_projections(3, &image, 42);
        let b = make_random_projections(3, &image, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_ne!(a, make_surround_rig(3, &image));
    }
}
