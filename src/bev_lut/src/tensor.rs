//! Shape-tagged contiguous buffer used to hand grid and camera parameters
//! to the builder.

use crate::error::LutError;

/// Row-major `f32` buffer with a shape descriptor.
///
/// The element count implied by `dims` always equals `data.len()`, and
/// neither is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    dims: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Create a tensor, validating the shape against the data length.
    pub fn new(dims: Vec<usize>, data: Vec<f32>) -> Result<Self, LutError> {
        if dims.is_empty() || data.is_empty() {
            return Err(LutError::argument(
                "tensor",
                "dimensions and data cannot be empty",
            ));
        }

        let expected = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| LutError::argument("tensor", "shape overflows usize"))?;
        if expected != data.len() {
            return Err(LutError::shape("tensor", expected, data.len()));
        }

        Ok(Self { dims, data })
    }

    /// One-dimensional tensor over `data`.
    pub fn from_slice(data: &[f32]) -> Result<Self, LutError> {
        Self::new(vec![data.len()], data.to_vec())
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Read exactly three values (voxel size, origin).
    pub fn to_vec3(&self, name: &'static str) -> Result<[f32; 3], LutError> {
        match self.data.as_slice() {
            &[a, b, c] => Ok([a, b, c]),
            other => Err(LutError::shape(name, 3, other.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_new() {
        let tensor = Tensor::new(vec![1, 3, 4], vec![0.0; 12]).unwrap();
        assert_eq!(tensor.dims(), &[1, 3, 4]);
        assert_eq!(tensor.len(), 12);
        assert!(!tensor.is_empty());
    }

    #[test]
    fn test_tensor_size_mismatch() {
        let err = Tensor::new(vec![2, 3, 4], vec![0.0; 12]).unwrap_err();
        assert_eq!(err, LutError::shape("tensor", 24, 12));
    }

    #[test]
    fn test_tensor_empty() {
        assert!(Tensor::new(vec![], vec![1.0]).is_err());
        assert!(Tensor::new(vec![0], vec![]).is_err());
    }

    #[test]
    fn test_to_vec3() {
        let tensor = Tensor::from_slice(&[0.5, 0.5, 1.5]).unwrap();
        assert_eq!(tensor.to_vec3("voxel_size").unwrap(), [0.5, 0.5, 1.5]);

        let tensor = Tensor::from_slice(&[1.0, 2.0]).unwrap();
        let err = tensor.to_vec3("origin").unwrap_err();
        assert_eq!(err, LutError::shape("origin", 3, 2));
    }
}
