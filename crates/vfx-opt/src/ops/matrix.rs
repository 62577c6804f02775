//! 4x4 matrix with offset.
//!
//! Forward: `out = M * in + offset`
//! Inverse: `out = M^-1 * (in - offset)`
//!
//! Matrices are stored row-major, matching the layout used in configs.

use std::any::Any;
use std::sync::Arc;

use glam::{DMat4, DVec4};

use crate::error::{OptError, OptResult};
use crate::op::{fmt_params, params_match, Op, OpRcPtr, TransformDirection, PARAM_EPSILON};

/// Row-major 4x4 identity.
pub const IDENTITY_MATRIX: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// Matrix + offset op.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixOffsetOp {
    matrix: [f64; 16],
    offset: [f64; 4],
    direction: TransformDirection,
    /// Matrix actually applied (inverted for inverse direction), row-major.
    applied: [f64; 16],
}

impl MatrixOffsetOp {
    /// Creates a matrix op.
    ///
    /// Inverse ops invert the matrix up front; a singular matrix is rejected.
    pub fn new(
        matrix: [f64; 16],
        offset: [f64; 4],
        direction: TransformDirection,
    ) -> OptResult<Self> {
        let applied = match direction {
            TransformDirection::Forward => matrix,
            TransformDirection::Inverse => {
                // glam is column-major: load transposed, invert, store transposed.
                let m = DMat4::from_cols_array(&matrix).transpose();
                if m.determinant().abs() < 1e-12 {
                    return Err(OptError::InvalidOp {
                        reason: "singular matrix cannot be inverted".into(),
                    });
                }
                m.inverse().transpose().to_cols_array()
            }
        };
        Ok(Self { matrix, offset, direction, applied })
    }

    /// Pure scale, no offset.
    pub fn scale(scale: [f64; 4], direction: TransformDirection) -> OptResult<Self> {
        let mut matrix = [0.0; 16];
        for (i, s) in scale.iter().enumerate() {
            matrix[i * 5] = *s;
        }
        Self::new(matrix, [0.0; 4], direction)
    }

    /// Pure offset, identity matrix.
    pub fn offset(offset: [f64; 4], direction: TransformDirection) -> OptResult<Self> {
        Self::new(IDENTITY_MATRIX, offset, direction)
    }

    /// Creates a shared handle, ready to push onto a chain.
    pub fn shared(
        matrix: [f64; 16],
        offset: [f64; 4],
        direction: TransformDirection,
    ) -> OptResult<OpRcPtr> {
        Ok(Arc::new(Self::new(matrix, offset, direction)?))
    }

    /// Stored matrix (row-major).
    pub fn matrix(&self) -> &[f64; 16] {
        &self.matrix
    }

    /// Stored offset.
    pub fn offset_values(&self) -> &[f64; 4] {
        &self.offset
    }

    /// Direction.
    pub fn direction(&self) -> TransformDirection {
        self.direction
    }
}

impl Op for MatrixOffsetOp {
    fn name(&self) -> &'static str {
        "MatrixOffset"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_no_op(&self) -> bool {
        params_match(&self.matrix, &IDENTITY_MATRIX)
            && self.offset.iter().all(|v| v.abs() < PARAM_EPSILON)
    }

    fn is_same_type(&self, other: &dyn Op) -> bool {
        other.as_any().is::<Self>()
    }

    fn is_inverse(&self, other: &dyn Op) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return false;
        };
        self.direction.inverse() == other.direction
            && params_match(&self.matrix, &other.matrix)
            && params_match(&self.offset, &other.offset)
    }

    fn serialize(&self, indent: usize) -> String {
        format!(
            "{:indent$}<MatrixOffsetOp matrix={} offset={} direction={}>",
            "",
            fmt_params(&self.matrix),
            fmt_params(&self.offset),
            self.direction.as_str(),
        )
    }

    fn apply(&self, pixels: &mut [[f32; 4]]) {
        let m = DMat4::from_cols_array(&self.applied).transpose();
        let o = DVec4::from_array(self.offset);
        for pixel in pixels.iter_mut() {
            let v = DVec4::from_array(pixel.map(f64::from));
            let out = match self.direction {
                TransformDirection::Forward => m * v + o,
                TransformDirection::Inverse => m * (v - o),
            };
            *pixel = out.to_array().map(|c| c as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SRGB_TO_XYZ: [f64; 16] = [
        0.4124, 0.3576, 0.1805, 0.0,
        0.2126, 0.7152, 0.0722, 0.0,
        0.0193, 0.1192, 0.9505, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];

    #[test]
    fn identity_is_no_op() {
        let op =
            MatrixOffsetOp::new(IDENTITY_MATRIX, [0.0; 4], TransformDirection::Forward).unwrap();
        assert!(op.is_no_op());
        let op = MatrixOffsetOp::offset([0.1, 0.0, 0.0, 0.0], TransformDirection::Forward).unwrap();
        assert!(!op.is_no_op());
        let op = MatrixOffsetOp::scale([2.0, 1.0, 1.0, 1.0], TransformDirection::Forward).unwrap();
        assert!(!op.is_no_op());
    }

    #[test]
    fn forward_applies_row_major() {
        let op = MatrixOffsetOp::new(SRGB_TO_XYZ, [0.0; 4], TransformDirection::Forward).unwrap();
        let mut px = [[1.0_f32, 0.0, 0.0, 1.0]];
        op.apply(&mut px);
        assert_abs_diff_eq!(px[0][0], 0.4124, epsilon = 1e-6);
        assert_abs_diff_eq!(px[0][1], 0.2126, epsilon = 1e-6);
        assert_abs_diff_eq!(px[0][2], 0.0193, epsilon = 1e-6);
        assert_abs_diff_eq!(px[0][3], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn inverse_undoes_forward() {
        let offset = [0.05, -0.02, 0.0, 0.0];
        let fwd = MatrixOffsetOp::new(SRGB_TO_XYZ, offset, TransformDirection::Forward).unwrap();
        let inv = MatrixOffsetOp::new(SRGB_TO_XYZ, offset, TransformDirection::Inverse).unwrap();
        assert!(fwd.is_inverse(&inv));

        let mut px = [[0.18_f32, 0.45, 0.7, 1.0]];
        fwd.apply(&mut px);
        inv.apply(&mut px);
        assert_abs_diff_eq!(px[0][0], 0.18, epsilon = 1e-5);
        assert_abs_diff_eq!(px[0][1], 0.45, epsilon = 1e-5);
        assert_abs_diff_eq!(px[0][2], 0.7, epsilon = 1e-5);
    }

    #[test]
    fn singular_inverse_rejected() {
        let err = MatrixOffsetOp::scale([1.0, 0.0, 1.0, 1.0], TransformDirection::Inverse);
        assert!(matches!(err, Err(OptError::InvalidOp { .. })));
    }

    #[test]
    fn offset_mismatch_not_inverse() {
        let a = MatrixOffsetOp::offset([0.1, 0.0, 0.0, 0.0], TransformDirection::Forward).unwrap();
        let b = MatrixOffsetOp::offset([0.2, 0.0, 0.0, 0.0], TransformDirection::Inverse).unwrap();
        assert!(!a.is_inverse(&b));
    }
}
