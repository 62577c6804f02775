//! The op capability contract.
//!
//! Every stage of a color transform chain implements [`Op`]. The optimizer
//! only ever asks three structural questions (is it a no-op, is it the same
//! family as another op, is it the exact inverse of another op) plus a text
//! form for diagnostics. Numeric evaluation lives here too so chains can be
//! applied to pixels, but the optimizer never calls it.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use serde::Deserialize;

/// Shared handle to an op. Chains hold these; the optimizer moves and drops
/// handles but never touches the op behind them.
pub type OpRcPtr = Arc<dyn Op>;

/// Tolerance used by the built-in families when comparing parameters.
pub const PARAM_EPSILON: f64 = 1e-6;

/// Transform application direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformDirection {
    /// Forward transform.
    #[default]
    Forward,
    /// Inverse transform.
    Inverse,
}

impl TransformDirection {
    /// Returns the opposite direction.
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Short lowercase label used in serialized chains.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Inverse => "inverse",
        }
    }
}

/// One stage of a color transform.
///
/// Implementations are immutable once built. Equality-style queries take
/// `&dyn Op` so any two families can be compared; an implementation should
/// answer `false` for anything outside its own family.
pub trait Op: Debug + Send + Sync {
    /// Family name, e.g. `"Exponent"`.
    fn name(&self) -> &'static str;

    /// Downcast hook.
    fn as_any(&self) -> &dyn Any;

    /// True if applying this op leaves every input unchanged.
    fn is_no_op(&self) -> bool;

    /// True if `other` belongs to the same op family.
    fn is_same_type(&self, other: &dyn Op) -> bool;

    /// True if applying `self` then `other` (or the reverse) is the identity.
    ///
    /// Only meaningful when [`Op::is_same_type`] holds.
    fn is_inverse(&self, other: &dyn Op) -> bool;

    /// Text form for diagnostics, prefixed with `indent` spaces.
    fn serialize(&self, indent: usize) -> String;

    /// Applies the op in place to RGBA pixels.
    fn apply(&self, pixels: &mut [[f32; 4]]);
}

/// Compares two parameter slices within [`PARAM_EPSILON`].
pub(crate) fn params_match(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < PARAM_EPSILON)
}

/// Formats a parameter slice compactly for serialization.
pub(crate) fn fmt_params(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v}")).collect();
    format!("[{}]", parts.join(", "))
}
