//! YAML chain descriptions.
//!
//! Ops are written as tagged maps, in the same style OCIO configs use for
//! transforms:
//!
//! ```yaml
//! ops:
//!   - !Exponent { value: [2.2, 2.2, 2.2, 1.0] }
//!   - !Log { base: 10.0, direction: inverse }
//!   - !MatrixOffset
//!     matrix: [2, 0, 0, 0,  0, 2, 0, 0,  0, 0, 2, 0,  0, 0, 0, 1]
//!     offset: [0.1, 0.1, 0.1, 0]
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::chain::OpChain;
use crate::error::{OptError, OptResult};
use crate::op::{OpRcPtr, TransformDirection};
use crate::ops::{ExponentOp, LogOp, LogParams, MatrixOffsetOp, NegativeStyle, IDENTITY_MATRIX};

/// A chain as written in a file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainDesc {
    /// Ops in application order.
    #[serde(default)]
    pub ops: Vec<OpDesc>,
}

/// One op as written in a file.
#[derive(Debug, Clone, Deserialize)]
pub enum OpDesc {
    /// Power curve.
    Exponent {
        /// Per-channel exponents [R, G, B, A].
        value: [f64; 4],
        /// Negative handling.
        #[serde(default)]
        style: NegativeStyle,
        /// Direction.
        #[serde(default)]
        direction: TransformDirection,
    },
    /// Logarithm. `base` alone gives a plain log; the slope/offset arrays
    /// default to the plain curve.
    Log {
        /// Logarithm base.
        #[serde(default = "default_log_base")]
        base: f64,
        /// Log-side slope.
        #[serde(default = "ones3")]
        k: [f64; 3],
        /// Lin-side slope.
        #[serde(default = "ones3")]
        m: [f64; 3],
        /// Lin-side offset.
        #[serde(default)]
        b: [f64; 3],
        /// Log-side offset.
        #[serde(default)]
        kb: [f64; 3],
        /// Direction.
        #[serde(default)]
        direction: TransformDirection,
    },
    /// Matrix with offset.
    MatrixOffset {
        /// Row-major 4x4 matrix.
        #[serde(default = "identity16")]
        matrix: [f64; 16],
        /// Offset [R, G, B, A].
        #[serde(default)]
        offset: [f64; 4],
        /// Direction.
        #[serde(default)]
        direction: TransformDirection,
    },
}

fn default_log_base() -> f64 {
    2.0
}

fn ones3() -> [f64; 3] {
    [1.0; 3]
}

fn identity16() -> [f64; 16] {
    IDENTITY_MATRIX
}

impl OpDesc {
    /// Builds the op.
    pub fn build(&self) -> OptResult<OpRcPtr> {
        let op: OpRcPtr = match self {
            OpDesc::Exponent { value, style, direction } => {
                Arc::new(ExponentOp::with_style(*value, *style, *direction)?)
            }
            OpDesc::Log { base, k, m, b, kb, direction } => {
                let params = LogParams {
                    k: *k,
                    m: *m,
                    b: *b,
                    base: [*base; 3],
                    kb: *kb,
                };
                Arc::new(LogOp::new(params, *direction)?)
            }
            OpDesc::MatrixOffset { matrix, offset, direction } => {
                Arc::new(MatrixOffsetOp::new(*matrix, *offset, *direction)?)
            }
        };
        Ok(op)
    }
}

impl ChainDesc {
    /// Loads a chain description from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> OptResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OptError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses a chain description.
    pub fn from_yaml_str(yaml: &str) -> OptResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Builds every op, in order.
    pub fn build(&self) -> OptResult<OpChain> {
        self.ops
            .iter()
            .enumerate()
            .map(|(i, desc)| {
                desc.build().map_err(|e| match e {
                    OptError::InvalidOp { reason } => OptError::InvalidOp {
                        reason: format!("op {i}: {reason}"),
                    },
                    other => other,
                })
            })
            .collect()
    }
}
