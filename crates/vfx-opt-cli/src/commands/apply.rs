//! Apply command: compare a pixel through the original and optimized chain

use crate::ApplyArgs;
#[allow(unused_imports)]
use tracing::{debug, info, trace};
use anyhow::{Result, bail};
use vfx_opt::{Optimizer, TracingSink};

pub fn run(args: ApplyArgs, verbose: u8) -> Result<()> {
    let [r, g, b, a] = args.rgba[..] else {
        bail!("--rgba expects 4 values, got {}", args.rgba.len());
    };

    let config = super::resolve_config(&args.optimizer)?;
    let original = super::load_chain(&args.input)?;
    let mut optimized = original.clone();
    let report = Optimizer::new(config).with_sink(&TracingSink).optimize(&mut optimized)?;

    let mut before = [[r, g, b, a]];
    let mut after = before;
    original.apply(&mut before);
    optimized.apply(&mut after);

    let max_diff = before[0]
        .iter()
        .zip(&after[0])
        .map(|(x, y)| (x - y).abs())
        .fold(0.0_f32, f32::max);

    debug!(max_diff, "evaluated pixel");

    if verbose > 0 {
        println!("{}", report.summary());
    }
    println!("Input:     {}", super::format_rgba(&[r, g, b, a]));
    println!("Original:  {} ({} ops)", super::format_rgba(&before[0]), original.len());
    println!("Optimized: {} ({} ops)", super::format_rgba(&after[0]), optimized.len());
    println!("Max diff:  {:.3e}", max_diff);

    Ok(())
}
