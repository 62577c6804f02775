//! Built-in op families.
//!
//! - [`ExponentOp`] - per-channel power curve
//! - [`LogOp`] - parametric logarithm
//! - [`MatrixOffsetOp`] - 4x4 matrix plus offset

mod exponent;
mod log;
mod matrix;

pub use exponent::{ExponentOp, NegativeStyle};
pub use log::{LogOp, LogParams};
pub use matrix::{MatrixOffsetOp, IDENTITY_MATRIX};
