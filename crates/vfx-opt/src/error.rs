//! Error types for op chain construction and optimization.
//!
//! The two required optimizer passes never fail. Errors come from:
//! - The combine extension (a combiner that cannot build a replacement op)
//! - Building ops from a chain description
//! - Loading configs / chain descriptions from disk

use std::path::PathBuf;
use thiserror::Error;

/// Result type for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

/// Errors that can occur while building or optimizing an op chain.
#[derive(Debug, Error)]
pub enum OptError {
    /// I/O error reading a config or chain file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was searched.
        path: PathBuf,
    },

    /// A combiner could not produce a replacement for an adjacent pair.
    ///
    /// Fatal for the whole optimize call: leaving the pair alone would hide
    /// an inconsistent combiner.
    #[error("error combining {first} with {second}: {reason}")]
    CombineFailed {
        /// Serialized first op of the pair.
        first: String,
        /// Serialized second op of the pair.
        second: String,
        /// Why the combination failed.
        reason: String,
    },

    /// Op parameters cannot describe a valid op.
    #[error("invalid op: {reason}")]
    InvalidOp {
        /// Description of what's wrong.
        reason: String,
    },

    /// Invalid optimizer configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
