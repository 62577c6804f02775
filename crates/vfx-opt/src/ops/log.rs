//! Parametric logarithm.
//!
//! Forward: `out = k * log_base(m * in + b) + kb`
//! Inverse: `out = (base ^ ((in - kb) / k) - b) / m`
//!
//! Alpha passes through untouched.

use std::any::Any;
use std::sync::Arc;

use crate::error::{OptError, OptResult};
use crate::op::{fmt_params, params_match, Op, OpRcPtr, TransformDirection, PARAM_EPSILON};

/// Per-channel log parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogParams {
    /// Log-side slope.
    pub k: [f64; 3],
    /// Lin-side slope.
    pub m: [f64; 3],
    /// Lin-side offset.
    pub b: [f64; 3],
    /// Logarithm base.
    pub base: [f64; 3],
    /// Log-side offset.
    pub kb: [f64; 3],
}

impl LogParams {
    /// Plain `log_base(x)`.
    pub fn with_base(base: f64) -> Self {
        Self {
            k: [1.0; 3],
            m: [1.0; 3],
            b: [0.0; 3],
            base: [base; 3],
            kb: [0.0; 3],
        }
    }

    fn flatten(&self) -> [f64; 15] {
        let mut out = [0.0; 15];
        for (chunk, src) in out.chunks_mut(3).zip([self.k, self.m, self.b, self.base, self.kb]) {
            chunk.copy_from_slice(&src);
        }
        out
    }
}

/// Log op.
#[derive(Debug, Clone, PartialEq)]
pub struct LogOp {
    params: LogParams,
    direction: TransformDirection,
}

impl LogOp {
    /// Creates a log op, rejecting parameters with no defined curve.
    pub fn new(params: LogParams, direction: TransformDirection) -> OptResult<Self> {
        for i in 0..3 {
            if params.k[i].abs() < PARAM_EPSILON || params.m[i].abs() < PARAM_EPSILON {
                return Err(OptError::InvalidOp {
                    reason: format!("log op with zero slope in channel {i}"),
                });
            }
            if params.base[i] <= 0.0 || (params.base[i] - 1.0).abs() < PARAM_EPSILON {
                return Err(OptError::InvalidOp {
                    reason: format!("log base {} is not usable", params.base[i]),
                });
            }
        }
        Ok(Self { params, direction })
    }

    /// Plain `log_base(x)` op.
    pub fn with_base(base: f64, direction: TransformDirection) -> OptResult<Self> {
        Self::new(LogParams::with_base(base), direction)
    }

    /// Creates a shared handle, ready to push onto a chain.
    pub fn shared(params: LogParams, direction: TransformDirection) -> OptResult<OpRcPtr> {
        Ok(Arc::new(Self::new(params, direction)?))
    }

    /// Curve parameters.
    pub fn params(&self) -> &LogParams {
        &self.params
    }

    /// Direction.
    pub fn direction(&self) -> TransformDirection {
        self.direction
    }
}

impl Op for LogOp {
    fn name(&self) -> &'static str {
        "Log"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    // A log curve is never the identity.
    fn is_no_op(&self) -> bool {
        false
    }

    fn is_same_type(&self, other: &dyn Op) -> bool {
        other.as_any().is::<Self>()
    }

    fn is_inverse(&self, other: &dyn Op) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return false;
        };
        self.direction.inverse() == other.direction
            && params_match(&self.params.flatten(), &other.params.flatten())
    }

    fn serialize(&self, indent: usize) -> String {
        let p = &self.params;
        format!(
            "{:indent$}<LogOp k={} m={} b={} base={} kb={} direction={}>",
            "",
            fmt_params(&p.k),
            fmt_params(&p.m),
            fmt_params(&p.b),
            fmt_params(&p.base),
            fmt_params(&p.kb),
            self.direction.as_str(),
        )
    }

    fn apply(&self, pixels: &mut [[f32; 4]]) {
        let p = &self.params;
        for pixel in pixels.iter_mut() {
            for i in 0..3 {
                let x = pixel[i] as f64;
                let y = match self.direction {
                    TransformDirection::Forward => {
                        let arg = (p.m[i] * x + p.b[i]).max(f32::MIN_POSITIVE as f64);
                        p.k[i] * arg.ln() / p.base[i].ln() + p.kb[i]
                    }
                    TransformDirection::Inverse => {
                        (p.base[i].powf((x - p.kb[i]) / p.k[i]) - p.b[i]) / p.m[i]
                    }
                };
                pixel[i] = y as f32;
            }
        }
    }
}
