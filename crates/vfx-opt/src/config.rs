//! Optimizer configuration.
//!
//! Configs are small YAML documents; every field is optional.
//!
//! ```yaml
//! max_passes: 8
//! combine_adjacent: false
//! serialize_indent: 4
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{OptError, OptResult};

/// Default bound on scheduler passes.
pub const MAX_OPTIMIZATION_PASSES: usize = 8;

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Upper bound on scheduler passes. Reaching it is logged, not an error.
    pub max_passes: usize,
    /// Run the combine-adjacent extension after the elimination passes.
    pub combine_adjacent: bool,
    /// Indent used when serializing chains into diagnostics.
    pub serialize_indent: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_passes: MAX_OPTIMIZATION_PASSES,
            combine_adjacent: false,
            serialize_indent: 4,
        }
    }
}

impl OptimizerConfig {
    /// Loads a config from a YAML file.
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

    /// Parses and validates a YAML config.
    pub fn from_yaml_str(yaml: &str) -> OptResult<Self> {
        // An empty document means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants not expressible in the type.
    pub fn validate(&self) -> OptResult<()> {
        if self.max_passes == 0 {
            return Err(OptError::InvalidConfig("max_passes must be >= 1".into()));
        }
        Ok(())
    }
}
