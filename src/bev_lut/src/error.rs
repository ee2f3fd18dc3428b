//! Error types for lookup table construction.

use thiserror::Error;

/// Errors from input validation.
///
/// The builder never fails once its inputs pass validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LutError {
    #[error("invalid shape for {name}: expected {expected} elements, got {actual}")]
    InvalidShape {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

impl LutError {
    pub(crate) fn shape(name: &'static str, expected: usize, actual: usize) -> Self {
        LutError::InvalidShape {
            name,
            expected,
            actual,
        }
    }

    pub(crate) fn argument(name: &'static str, reason: impl Into<String>) -> Self {
        LutError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Check that a buffer holds exactly `expected` elements.
pub(crate) fn check_len(
    name: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), LutError> {
    if expected != actual {
        return Err(LutError::shape(name, expected, actual));
    }
    Ok(())
}
