//! Combine-adjacent extension.
//!
//! Merges an adjacent pair of compatible ops into a single op equivalent to
//! applying both in sequence. Unlike the elimination passes this needs
//! family-specific knowledge, supplied by [`Combiner`] implementations.
//!
//! Disabled unless [`OptimizerConfig::combine_adjacent`] is set.
//!
//! [`OptimizerConfig::combine_adjacent`]: crate::OptimizerConfig::combine_adjacent

use std::fmt::Debug;
use std::sync::Arc;

use tracing::trace;

use crate::chain::OpChain;
use crate::error::{OptError, OptResult};
use crate::op::{Op, OpRcPtr, TransformDirection, PARAM_EPSILON};
use crate::ops::{ExponentOp, NegativeStyle};

/// Builds one op out of an adjacent pair.
pub trait Combiner: Debug + Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// True if this combiner handles `first` followed by `second`.
    fn can_combine(&self, first: &dyn Op, second: &dyn Op) -> bool;

    /// Builds the replacement op.
    ///
    /// Only called when [`Combiner::can_combine`] returned true. An error
    /// aborts the whole optimize call.
    fn combine(&self, first: &OpRcPtr, second: &OpRcPtr) -> OptResult<OpRcPtr>;
}

/// Runs one combine pass. Returns the number of pairs merged.
///
/// The merged op takes the pair's position and the cursor moves past it, so
/// a run of three combinable ops merges pairwise across scheduler passes.
pub fn combine_ops(chain: &mut OpChain, combiners: &[Box<dyn Combiner>]) -> OptResult<usize> {
    if combiners.is_empty() {
        return Ok(0);
    }

    let mut count = 0;
    let mut index = 0;

    while index + 1 < chain.len() {
        let first = Arc::clone(&chain.ops()[index]);
        let second = Arc::clone(&chain.ops()[index + 1]);

        let combiner = combiners
            .iter()
            .find(|c| c.can_combine(first.as_ref(), second.as_ref()));

        if let Some(combiner) = combiner {
            let merged = combiner.combine(&first, &second).map_err(|e| OptError::CombineFailed {
                first: first.serialize(0),
                second: second.serialize(0),
                reason: format!("{}: {}", combiner.name(), e),
            })?;
            trace!(combiner = combiner.name(), index, "combined adjacent ops");
            chain.replace_pair(index, merged);
            count += 1;
        }
        index += 1;
    }

    Ok(count)
}

/// Merges two exponent ops with the same negative style.
///
/// The result is a forward op whose exponent is the product of the two
/// effective exponents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExponentCombiner;

impl Combiner for ExponentCombiner {
    fn name(&self) -> &'static str {
        "ExponentCombiner"
    }

    fn can_combine(&self, first: &dyn Op, second: &dyn Op) -> bool {
        match (
            first.as_any().downcast_ref::<ExponentOp>(),
            second.as_any().downcast_ref::<ExponentOp>(),
        ) {
            (Some(a), Some(b)) => {
                a.negative_style() == b.negative_style()
                    && !(a.negative_style() == NegativeStyle::Clamp && drops_clamp(a, b))
            }
            _ => false,
        }
    }

    fn combine(&self, first: &OpRcPtr, second: &OpRcPtr) -> OptResult<OpRcPtr> {
        let (Some(a), Some(b)) = (
            first.as_any().downcast_ref::<ExponentOp>(),
            second.as_any().downcast_ref::<ExponentOp>(),
        ) else {
            return Err(OptError::InvalidOp {
                reason: "exponent combiner given a non-exponent op".into(),
            });
        };

        let ea = a.effective_value();
        let eb = b.effective_value();
        let mut value = [0.0; 4];
        for i in 0..4 {
            value[i] = ea[i] * eb[i];
            if !value[i].is_finite() {
                return Err(OptError::InvalidOp {
                    reason: format!("combined exponent {} in channel {i} is not finite", value[i]),
                });
            }
        }

        let op = ExponentOp::with_style(value, a.negative_style(), TransformDirection::Forward)?;
        Ok(Arc::new(op))
    }
}

/// True if merging two clamping exponents would produce a unit channel that
/// neither input had. A unit exponent does not clamp, so the merged op would
/// let negatives through where the pair zeroes them.
fn drops_clamp(a: &ExponentOp, b: &ExponentOp) -> bool {
    let is_unit = |v: f64| (v - 1.0).abs() < PARAM_EPSILON;
    a.effective_value()
        .iter()
        .zip(b.effective_value())
        .any(|(&x, y)| !is_unit(x) && !is_unit(y) && is_unit(x * y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::LogOp;
    use approx::assert_abs_diff_eq;

    fn exp(v: f64, dir: TransformDirection) -> OpRcPtr {
        ExponentOp::shared([v, v, v, 1.0], dir).unwrap()
    }

    fn combiners() -> Vec<Box<dyn Combiner>> {
        vec![Box::new(ExponentCombiner)]
    }

    #[test]
    fn merges_adjacent_exponents() {
        let mut chain = OpChain::from_ops(vec![
            exp(2.0, TransformDirection::Forward),
            exp(1.5, TransformDirection::Forward),
        ]);
        let n = combine_ops(&mut chain, &combiners()).unwrap();
        assert_eq!(n, 1);
        assert_eq!(chain.len(), 1);

        let merged = chain.ops()[0].as_any().downcast_ref::<ExponentOp>().unwrap();
        assert_abs_diff_eq!(merged.value()[0], 3.0, epsilon = 1e-12);
        assert_eq!(merged.direction(), TransformDirection::Forward);
    }

    #[test]
    fn inverse_contributes_reciprocal() {
        let mut chain = OpChain::from_ops(vec![
            exp(4.0, TransformDirection::Forward),
            exp(2.0, TransformDirection::Inverse),
        ]);
        combine_ops(&mut chain, &combiners()).unwrap();
        let merged = chain.ops()[0].as_any().downcast_ref::<ExponentOp>().unwrap();
        assert_abs_diff_eq!(merged.value()[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn merged_op_matches_sequence() {
        let a = exp(2.2, TransformDirection::Forward);
        let b = exp(1.8, TransformDirection::Inverse);
        let mut expected = [[0.3_f32, 0.6, 0.9, 1.0]];
        a.apply(&mut expected);
        b.apply(&mut expected);

        let mut chain = OpChain::from_ops(vec![a, b]);
        combine_ops(&mut chain, &combiners()).unwrap();
        let mut got = [[0.3_f32, 0.6, 0.9, 1.0]];
        chain.apply(&mut got);
        for c in 0..4 {
            assert_abs_diff_eq!(got[0][c], expected[0][c], epsilon = 1e-5);
        }
    }

    #[test]
    fn zero_exponent_merges() {
        let zero = ExponentOp::shared([0.0, 2.0, 2.0, 1.0], TransformDirection::Forward).unwrap();
        let mut chain = OpChain::from_ops(vec![zero, exp(2.0, TransformDirection::Forward)]);
        assert_eq!(combine_ops(&mut chain, &combiners()).unwrap(), 1);

        let merged = chain.ops()[0].as_any().downcast_ref::<ExponentOp>().unwrap();
        assert_eq!(merged.value(), [0.0, 4.0, 4.0, 1.0]);
        let mut px = [[0.5_f32, 0.5, 0.5, 1.0]];
        chain.apply(&mut px);
        assert_abs_diff_eq!(px[0][0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(px[0][1], 0.0625, epsilon = 1e-6);
    }

    #[test]
    fn clamp_pair_cancelling_to_unit_is_kept() {
        let clamp_pair = || {
            OpChain::from_ops(vec![
                exp(2.0, TransformDirection::Forward),
                ExponentOp::shared([0.5, 0.5, 0.5, 1.0], TransformDirection::Forward).unwrap(),
            ])
        };
        let mut chain = clamp_pair();
        assert_eq!(combine_ops(&mut chain, &combiners()).unwrap(), 0);
        assert_eq!(chain.len(), 2);

        let mut px = [[-0.5_f32, 0.25, 0.5, 1.0]];
        chain.apply(&mut px);
        assert_eq!(px[0][0], 0.0);

        let mirror = |v: f64| -> OpRcPtr {
            Arc::new(
                ExponentOp::with_style(
                    [v, v, v, 1.0],
                    NegativeStyle::Mirror,
                    TransformDirection::Forward,
                )
                .unwrap(),
            )
        };
        let mut chain = OpChain::from_ops(vec![mirror(2.0), mirror(0.5)]);
        assert_eq!(combine_ops(&mut chain, &combiners()).unwrap(), 1);
    }

    #[test]
    fn three_in_a_row_leaves_one_pair() {
        let mut chain = OpChain::from_ops(vec![
            exp(2.0, TransformDirection::Forward),
            exp(2.0, TransformDirection::Forward),
            exp(2.0, TransformDirection::Forward),
        ]);
        assert_eq!(combine_ops(&mut chain, &combiners()).unwrap(), 1);
        assert_eq!(chain.len(), 2);
        assert_eq!(combine_ops(&mut chain, &combiners()).unwrap(), 1);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn skips_other_families_and_styles() {
        let mirror: OpRcPtr = Arc::new(
            ExponentOp::with_style([2.0; 4], NegativeStyle::Mirror, TransformDirection::Forward)
                .unwrap(),
        );
        let mut chain = OpChain::from_ops(vec![
            exp(2.0, TransformDirection::Forward),
            Arc::new(LogOp::with_base(2.0, TransformDirection::Forward).unwrap()),
            exp(2.0, TransformDirection::Forward),
            mirror,
        ]);
        assert_eq!(combine_ops(&mut chain, &combiners()).unwrap(), 0);
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn no_combiners_is_noop() {
        let mut chain = OpChain::from_ops(vec![
            exp(2.0, TransformDirection::Forward),
            exp(2.0, TransformDirection::Forward),
        ]);
        assert_eq!(combine_ops(&mut chain, &[]).unwrap(), 0);
        assert_eq!(chain.len(), 2);
    }

    #[derive(Debug)]
    struct Broken;

    impl Combiner for Broken {
        fn name(&self) -> &'static str {
            "Broken"
        }
        fn can_combine(&self, _: &dyn Op, _: &dyn Op) -> bool {
            true
        }
        fn combine(&self, _: &OpRcPtr, _: &OpRcPtr) -> OptResult<OpRcPtr> {
            Err(OptError::InvalidOp { reason: "nope".into() })
        }
    }

    #[test]
    fn failure_is_fatal() {
        let mut chain = OpChain::from_ops(vec![
            exp(2.0, TransformDirection::Forward),
            exp(3.0, TransformDirection::Forward),
        ]);
        let broken: Vec<Box<dyn Combiner>> = vec![Box::new(Broken)];
        let err = combine_ops(&mut chain, &broken).unwrap_err();
        match err {
            OptError::CombineFailed { first, reason, .. } => {
                assert!(first.contains("ExponentOp"));
                assert!(reason.starts_with("Broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(chain.len(), 2);
    }
}
