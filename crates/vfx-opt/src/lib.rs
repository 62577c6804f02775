//! # vfx-opt
//!
//! Peephole optimization of color transform op chains.
//!
//! A color pipeline compiles to an ordered chain of ops (exponents, logs,
//! matrices, ...). Chains built from configs are often redundant: identity ops
//! left behind by defaults, or an op immediately followed by its own inverse
//! where two color spaces meet. Evaluating those per pixel is wasted work.
//! This crate shortens a chain once, before it is applied, without changing
//! what it computes.
//!
//! # Quick Start
//!
//! ```
//! use vfx_opt::{optimize_op_vec, OpChain, TracingSink, TransformDirection};
//! use vfx_opt::ops::{ExponentOp, LogOp};
//!
//! let gamma = [2.2, 2.2, 2.2, 1.0];
//! let mut chain = OpChain::new();
//! chain.push(ExponentOp::shared(gamma, TransformDirection::Forward).unwrap());
//! chain.push(std::sync::Arc::new(LogOp::with_base(10.0, TransformDirection::Forward).unwrap()));
//! chain.push(std::sync::Arc::new(LogOp::with_base(10.0, TransformDirection::Inverse).unwrap()));
//! chain.push(ExponentOp::shared(gamma, TransformDirection::Inverse).unwrap());
//!
//! let report = optimize_op_vec(&mut chain, &TracingSink);
//! assert!(chain.is_empty());
//! assert_eq!(report.inverse_pairs_removed, 2);
//! ```
//!
//! # Modules
//!
//! - [`ops`] - Built-in op families
//! - [`combine`] - Optional pass merging adjacent compatible ops
//!
//! # Custom ops
//!
//! Anything implementing [`Op`] can live in a chain. The optimizer only uses
//! [`Op::is_no_op`], [`Op::is_same_type`], [`Op::is_inverse`] and
//! [`Op::serialize`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod chain;
mod config;
mod desc;
mod diag;
mod error;
mod op;
mod optimizer;

pub mod combine;
pub mod ops;

pub use chain::OpChain;
pub use combine::{Combiner, ExponentCombiner};
pub use config::{OptimizerConfig, MAX_OPTIMIZATION_PASSES};
pub use desc::{ChainDesc, OpDesc};
pub use diag::{CaptureSink, DiagnosticSink, Level, NullSink, TracingSink};
pub use error::{OptError, OptResult};
pub use op::{Op, OpRcPtr, TransformDirection, PARAM_EPSILON};
pub use optimizer::{
    optimize_op_vec, remove_inverse_ops, remove_no_ops, OptimizeReport, Optimizer, PassOutcome,
};
