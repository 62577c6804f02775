//! Per-channel power curve.

use std::any::Any;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{OptError, OptResult};
use crate::op::{fmt_params, params_match, Op, OpRcPtr, TransformDirection, PARAM_EPSILON};

/// Negative value handling for exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeStyle {
    /// Clamp negatives to zero.
    #[default]
    Clamp,
    /// Mirror: sign * pow(abs(x), exp).
    Mirror,
    /// Pass through unchanged.
    PassThru,
}

/// Exponent op: `out = in ^ value` forward, `out = in ^ (1 / value)` inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentOp {
    value: [f64; 4],
    negative_style: NegativeStyle,
    direction: TransformDirection,
}

impl ExponentOp {
    /// Creates an exponent op.
    ///
    /// An inverse op with a zero exponent has no defined result and is rejected.
    pub fn new(value: [f64; 4], direction: TransformDirection) -> OptResult<Self> {
        Self::with_style(value, NegativeStyle::default(), direction)
    }

    /// Creates an exponent op with explicit negative handling.
    pub fn with_style(
        value: [f64; 4],
        negative_style: NegativeStyle,
        direction: TransformDirection,
    ) -> OptResult<Self> {
        let has_zero = value.iter().any(|v| v.abs() < PARAM_EPSILON);
        if direction == TransformDirection::Inverse && has_zero {
            return Err(OptError::InvalidOp {
                reason: format!("inverse exponent with zero value: {}", fmt_params(&value)),
            });
        }
        Ok(Self { value, negative_style, direction })
    }

    /// Creates a shared handle, ready to push onto a chain.
    pub fn shared(value: [f64; 4], direction: TransformDirection) -> OptResult<OpRcPtr> {
        Ok(Arc::new(Self::new(value, direction)?))
    }

    /// Stored exponents [R, G, B, A].
    pub fn value(&self) -> [f64; 4] {
        self.value
    }

    /// Negative handling.
    pub fn negative_style(&self) -> NegativeStyle {
        self.negative_style
    }

    /// Direction.
    pub fn direction(&self) -> TransformDirection {
        self.direction
    }

    /// Exponents actually applied per channel, with direction folded in.
    pub fn effective_value(&self) -> [f64; 4] {
        match self.direction {
            TransformDirection::Forward => self.value,
            TransformDirection::Inverse => self.value.map(|v| 1.0 / v),
        }
    }
}

impl Op for ExponentOp {
    fn name(&self) -> &'static str {
        "Exponent"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_no_op(&self) -> bool {
        self.value.iter().all(|v| (v - 1.0).abs() < PARAM_EPSILON)
    }

    fn is_same_type(&self, other: &dyn Op) -> bool {
        other.as_any().is::<Self>()
    }

    fn is_inverse(&self, other: &dyn Op) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return false;
        };
        self.direction.inverse() == other.direction
            && self.negative_style == other.negative_style
            && params_match(&self.value, &other.value)
    }

    fn serialize(&self, indent: usize) -> String {
        format!(
            "{:indent$}<ExponentOp value={} style={:?} direction={}>",
            "",
            fmt_params(&self.value),
            self.negative_style,
            self.direction.as_str(),
        )
    }

    fn apply(&self, pixels: &mut [[f32; 4]]) {
        let effective = self.effective_value();
        // A unit exponent leaves its channel alone, negatives included, so it
        // agrees with is_no_op.
        let unit = effective.map(|v| (v - 1.0).abs() < PARAM_EPSILON);
        let exp = effective.map(|v| v as f32);
        for pixel in pixels.iter_mut() {
            for ((v, e), skip) in pixel.iter_mut().zip(exp).zip(unit) {
                if skip {
                    continue;
                }
                match self.negative_style {
                    NegativeStyle::Clamp => *v = v.max(0.0).powf(e),
                    NegativeStyle::Mirror => *v = v.signum() * v.abs().powf(e),
                    NegativeStyle::PassThru => {
                        if *v >= 0.0 {
                            *v = v.powf(e);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const GAMMA: [f64; 4] = [2.2, 2.2, 2.2, 1.0];

    #[test]
    fn unit_exponent_is_no_op() {
        let op = ExponentOp::new([1.0; 4], TransformDirection::Inverse).unwrap();
        assert!(op.is_no_op());
        let op = ExponentOp::new(GAMMA, TransformDirection::Forward).unwrap();
        assert!(!op.is_no_op());
    }

    #[test]
    fn inverse_requires_opposite_direction() {
        let fwd = ExponentOp::new(GAMMA, TransformDirection::Forward).unwrap();
        let inv = ExponentOp::new(GAMMA, TransformDirection::Inverse).unwrap();
        let fwd2 = ExponentOp::new(GAMMA, TransformDirection::Forward).unwrap();
        assert!(fwd.is_inverse(&inv));
        assert!(inv.is_inverse(&fwd));
        assert!(!fwd.is_inverse(&fwd2));
    }

    #[test]
    fn inverse_requires_same_values_and_style() {
        let fwd = ExponentOp::new(GAMMA, TransformDirection::Forward).unwrap();
        let other = ExponentOp::new([2.4, 2.4, 2.4, 1.0], TransformDirection::Inverse).unwrap();
        assert!(!fwd.is_inverse(&other));

        let mirrored =
            ExponentOp::with_style(GAMMA, NegativeStyle::Mirror, TransformDirection::Inverse)
                .unwrap();
        assert!(!fwd.is_inverse(&mirrored));
    }

    #[test]
    fn zero_inverse_rejected() {
        let err = ExponentOp::new([0.0, 1.0, 1.0, 1.0], TransformDirection::Inverse);
        assert!(matches!(err, Err(OptError::InvalidOp { .. })));
        assert!(ExponentOp::new([0.0, 1.0, 1.0, 1.0], TransformDirection::Forward).is_ok());
    }

    #[test]
    fn apply_forward_then_inverse() {
        let fwd = ExponentOp::new(GAMMA, TransformDirection::Forward).unwrap();
        let inv = ExponentOp::new(GAMMA, TransformDirection::Inverse).unwrap();
        let mut px = [[0.18_f32, 0.5, 0.9, 1.0]];
        fwd.apply(&mut px);
        assert_abs_diff_eq!(px[0][1], 0.5_f32.powf(2.2), epsilon = 1e-6);
        inv.apply(&mut px);
        assert_abs_diff_eq!(px[0][0], 0.18, epsilon = 1e-5);
        assert_abs_diff_eq!(px[0][2], 0.9, epsilon = 1e-5);
    }

    #[test]
    fn negative_styles() {
        let clamp = ExponentOp::new([2.0; 4], TransformDirection::Forward).unwrap();
        let mut px = [[-0.5_f32, 0.5, 0.0, 1.0]];
        clamp.apply(&mut px);
        assert_eq!(px[0][0], 0.0);

        let mirror =
            ExponentOp::with_style([2.0; 4], NegativeStyle::Mirror, TransformDirection::Forward)
                .unwrap();
        let mut px = [[-0.5_f32, 0.5, 0.0, 1.0]];
        mirror.apply(&mut px);
        assert_abs_diff_eq!(px[0][0], -0.25, epsilon = 1e-6);

        let pass =
            ExponentOp::with_style([2.0; 4], NegativeStyle::PassThru, TransformDirection::Forward)
                .unwrap();
        let mut px = [[-0.5_f32, 0.5, 0.0, 1.0]];
        pass.apply(&mut px);
        assert_eq!(px[0][0], -0.5);
    }

    #[test]
    fn unit_exponent_keeps_negatives() {
        for style in [NegativeStyle::Clamp, NegativeStyle::Mirror, NegativeStyle::PassThru] {
            let op = ExponentOp::with_style([1.0; 4], style, TransformDirection::Forward).unwrap();
            assert!(op.is_no_op());
            let mut px = [[-0.5_f32, 0.5, -0.25, 1.0]];
            op.apply(&mut px);
            assert_eq!(px, [[-0.5, 0.5, -0.25, 1.0]], "{style:?}");
        }

        // Only the unit channels pass negatives through under clamp.
        let op = ExponentOp::new([2.0, 1.0, 1.0, 1.0], TransformDirection::Forward).unwrap();
        let mut px = [[-0.5_f32, -0.5, 0.5, 1.0]];
        op.apply(&mut px);
        assert_eq!(px, [[0.0, -0.5, 0.5, 1.0]]);
    }

    #[test]
    fn serialize_indents() {
        let op = ExponentOp::new(GAMMA, TransformDirection::Inverse).unwrap();
        let text = op.serialize(4);
        assert!(text.starts_with("    <ExponentOp"));
        assert!(text.contains("direction=inverse"));
    }
}
