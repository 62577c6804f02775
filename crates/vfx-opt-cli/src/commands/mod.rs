//! CLI command implementations

pub mod apply;
pub mod optimize;

use anyhow::{Context, Result};
use std::path::Path;
use vfx_opt::{ChainDesc, OpChain, OptimizerConfig};

use crate::OptimizerArgs;

/// Load and build a chain description
pub fn load_chain(path: &Path) -> Result<OpChain> {
    let desc = ChainDesc::from_file(path)
        .with_context(|| format!("Failed to load chain: {}", path.display()))?;
    desc.build()
        .with_context(|| format!("Failed to build chain: {}", path.display()))
}

/// Resolve optimizer settings: config file first, then command-line overrides
pub fn resolve_config(args: &OptimizerArgs) -> Result<OptimizerConfig> {
    let mut config = match &args.config {
        Some(path) => OptimizerConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => OptimizerConfig::default(),
    };

    if args.combine {
        config.combine_adjacent = true;
    }
    if let Some(n) = args.max_passes {
        config.max_passes = n;
    }
    config.validate()?;

    Ok(config)
}

/// Format a pixel for display
pub fn format_rgba(px: &[f32; 4]) -> String {
    format!("{:.6}, {:.6}, {:.6}, {:.6}", px[0], px[1], px[2], px[3])
}
