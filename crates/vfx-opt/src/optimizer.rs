//! Peephole optimizer for op chains.
//!
//! Two structural rewrites are applied repeatedly until a full round changes
//! nothing:
//!
//! 1. [`remove_no_ops`] drops every op that is an identity.
//! 2. [`remove_inverse_ops`] drops adjacent same-type pairs that undo each
//!    other, stepping back after each removal so nested pairs
//!    (`A, B, B', A'`) collapse in one sweep.
//!
//! Both rules only remove ops the ops themselves report as redundant, so the
//! chain's net transform is unchanged. The number of rounds is bounded; hitting
//! the bound is reported through the diagnostic sink and the chain is returned
//! as it stands.
//!
//! # Example
//!
//! ```
//! use vfx_opt::{optimize_op_vec, CaptureSink, OpChain, TransformDirection};
//! use vfx_opt::ops::ExponentOp;
//!
//! let mut chain = OpChain::new();
//! chain.push(ExponentOp::shared([2.2, 2.2, 2.2, 1.0], TransformDirection::Forward).unwrap());
//! chain.push(ExponentOp::shared([2.2, 2.2, 2.2, 1.0], TransformDirection::Inverse).unwrap());
//!
//! let report = optimize_op_vec(&mut chain, &CaptureSink::new(false));
//! assert!(chain.is_empty());
//! assert_eq!(report.inverse_pairs_removed, 1);
//! ```

use std::convert::Infallible;

use crate::chain::OpChain;
use crate::combine::{combine_ops, Combiner, ExponentCombiner};
use crate::config::OptimizerConfig;
use crate::diag::{DiagnosticSink, TracingSink};
use crate::error::OptResult;

/// Removes every identity op. Returns the number removed.
pub fn remove_no_ops(chain: &mut OpChain) -> usize {
    let before = chain.len();
    chain.retain(|op| !op.is_no_op());
    before - chain.len()
}

/// Removes adjacent inverse pairs. Returns the number of pairs removed.
pub fn remove_inverse_ops(chain: &mut OpChain) -> usize {
    let mut count = 0;
    let mut index = 0;

    while index + 1 < chain.len() {
        let first = &chain.ops()[index];
        let second = &chain.ops()[index + 1];

        // Nested pairs are the common case:
        //
        //         |
        // ..., A, B, B', A', ...
        //
        // Dropping B, B' leaves the cursor on A', so step back one to
        // reconsider A, A'.
        if first.is_same_type(second.as_ref()) && first.is_inverse(second.as_ref()) {
            chain.remove_pair(index);
            count += 1;
            index = index.saturating_sub(1);
        } else {
            index += 1;
        }
    }

    count
}

/// How a scheduler run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassOutcome {
    /// Empty input; nothing ran.
    #[default]
    Idle,
    /// A full round made no changes.
    Converged,
    /// Changes were still happening when the pass bound was reached.
    BoundExhausted,
}

/// Summary of one optimize call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    /// Chain length before optimizing.
    pub original_len: usize,
    /// Chain length after optimizing.
    pub final_len: usize,
    /// Rounds that changed the chain.
    pub passes: usize,
    /// Identity ops removed.
    pub noops_removed: usize,
    /// Inverse pairs removed (each pair counts once).
    pub inverse_pairs_removed: usize,
    /// Adjacent pairs merged by the combine extension.
    pub ops_combined: usize,
    /// Terminal state.
    pub outcome: PassOutcome,
}

impl OptimizeReport {
    /// Net number of ops that left the chain.
    pub fn ops_removed(&self) -> usize {
        self.original_len - self.final_len
    }

    /// True if the scheduler reached a fixed point.
    pub fn converged(&self) -> bool {
        self.outcome == PassOutcome::Converged
    }

    /// One-line summary used in diagnostics.
    pub fn summary(&self) -> String {
        format!(
            "Optimized {}->{}, {} passes, {} noops removed, \
             {} inverse ops removed, {} ops combined",
            self.original_len,
            self.final_len,
            self.passes,
            self.noops_removed,
            self.inverse_pairs_removed,
            self.ops_combined,
        )
    }
}

/// Configurable pass scheduler.
///
/// ```
/// use vfx_opt::{Optimizer, OptimizerConfig, OpChain};
///
/// let optimizer = Optimizer::new(OptimizerConfig { max_passes: 4, ..Default::default() });
/// let mut chain = OpChain::new();
/// let report = optimizer.optimize(&mut chain).unwrap();
/// assert_eq!(report.passes, 0);
/// ```
pub struct Optimizer<'a> {
    config: OptimizerConfig,
    sink: &'a dyn DiagnosticSink,
    combiners: Vec<Box<dyn Combiner>>,
}

static TRACING_SINK: TracingSink = TracingSink;

impl std::fmt::Debug for Optimizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer")
            .field("config", &self.config)
            .field("combiners", &self.combiners)
            .field("debug_enabled", &self.sink.debug_enabled())
            .finish()
    }
}

impl Default for Optimizer<'_> {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl<'a> Optimizer<'a> {
    /// Creates an optimizer logging through `tracing`.
    ///
    /// With `combine_adjacent` set, the built-in [`ExponentCombiner`] is
    /// registered.
    pub fn new(config: OptimizerConfig) -> Self {
        let combiners: Vec<Box<dyn Combiner>> = if config.combine_adjacent {
            vec![Box::new(ExponentCombiner)]
        } else {
            Vec::new()
        };
        Self {
            config,
            sink: &TRACING_SINK,
            combiners,
        }
    }

    /// Routes diagnostics to `sink`.
    pub fn with_sink(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    /// Registers an extra combiner. Combiners only run when
    /// `combine_adjacent` is enabled.
    pub fn with_combiner(mut self, combiner: impl Combiner + 'static) -> Self {
        self.combiners.push(Box::new(combiner));
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimizes `chain` in place.
    ///
    /// Fails only when the combine extension is enabled and a combiner fails;
    /// in that case the chain is left in whatever state the failing pass
    /// reached.
    pub fn optimize(&self, chain: &mut OpChain) -> OptResult<OptimizeReport> {
        if !self.config.combine_adjacent {
            return Ok(self.run_required(chain));
        }
        self.run(chain, |chain| combine_ops(chain, &self.combiners))
    }

    /// Required passes only; cannot fail.
    fn run_required(&self, chain: &mut OpChain) -> OptimizeReport {
        match self.run(chain, |_| Ok::<usize, Infallible>(0)) {
            Ok(report) => report,
            Err(never) => match never {},
        }
    }

    fn run<E>(
        &self,
        chain: &mut OpChain,
        mut extra_pass: impl FnMut(&mut OpChain) -> Result<usize, E>,
    ) -> Result<OptimizeReport, E> {
        if chain.is_empty() {
            return Ok(OptimizeReport::default());
        }

        let indent = self.config.serialize_indent;
        if self.sink.debug_enabled() {
            self.sink.debug("Optimizing op chain...");
            self.sink.debug(&chain.serialize(indent));
        }

        let mut report = OptimizeReport {
            original_len: chain.len(),
            ..Default::default()
        };
        let mut converged = false;

        while report.passes < self.config.max_passes {
            let noops = remove_no_ops(chain);
            let inverse = remove_inverse_ops(chain);
            let combined = extra_pass(chain)?;

            if noops == 0 && inverse == 0 && combined == 0 {
                converged = true;
                break;
            }

            report.noops_removed += noops;
            report.inverse_pairs_removed += inverse;
            report.ops_combined += combined;
            report.passes += 1;
        }

        // Out of passes, but the last round may have left nothing to do.
        if !converged && !self.has_pending_work(chain) {
            converged = true;
        }

        report.final_len = chain.len();
        report.outcome = if converged {
            PassOutcome::Converged
        } else {
            PassOutcome::BoundExhausted
        };

        if report.outcome == PassOutcome::BoundExhausted {
            self.sink.warn(&format!(
                "The max number of passes, {}, was reached during optimization. \
                 This is likely a sign that either the complexity of the color \
                 transform is very high, or that some internal optimizers are in \
                 conflict (undo-ing / redo-ing the other's results).",
                report.passes
            ));
        }

        if self.sink.debug_enabled() {
            self.sink
                .debug(&format!("{}\n{}", report.summary(), chain.serialize(indent)));
        }
        self.sink.report(&report);

        Ok(report)
    }

    /// True if another round would still change `chain`. Asks the same
    /// questions as the passes without modifying anything.
    fn has_pending_work(&self, chain: &OpChain) -> bool {
        if chain.iter().any(|op| op.is_no_op()) {
            return true;
        }
        let ops = chain.ops();
        if ops
            .windows(2)
            .any(|w| w[0].is_same_type(w[1].as_ref()) && w[0].is_inverse(w[1].as_ref()))
        {
            return true;
        }
        self.config.combine_adjacent
            && ops.windows(2).any(|w| {
                self.combiners
                    .iter()
                    .any(|c| c.can_combine(w[0].as_ref(), w[1].as_ref()))
            })
    }
}

/// Optimizes `chain` in place with the required passes and default settings.
///
/// Never fails. Empty chains return immediately without touching `sink`.
pub fn optimize_op_vec(chain: &mut OpChain, sink: &dyn DiagnosticSink) -> OptimizeReport {
    Optimizer::new(OptimizerConfig::default())
        .with_sink(sink)
        .run_required(chain)
}
