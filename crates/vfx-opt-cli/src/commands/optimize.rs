//! Optimize command

use crate::OptimizeArgs;
#[allow(unused_imports)]
use tracing::{debug, info, trace};
use anyhow::Result;
use vfx_opt::{
    CaptureSink, Level, OpChain, OptimizeReport, Optimizer, OptimizerConfig, PassOutcome,
    TracingSink,
};

pub fn run(args: OptimizeArgs, verbose: u8) -> Result<()> {
    let config = super::resolve_config(&args.optimizer)?;
    let mut chain = super::load_chain(&args.input)?;
    let indent = config.serialize_indent;

    info!(ops = chain.len(), input = %args.input.display(), "loaded chain");

    if !args.quiet {
        println!("Original ({} ops):", chain.len());
        println!("{}", chain.serialize(indent));
    }

    let (report, diagnostics) = optimize_chain(&mut chain, config, args.trace_passes)?;

    if args.trace_passes {
        println!("Optimizer diagnostics:");
        for (level, msg) in &diagnostics {
            println!("{}", format_diagnostic(*level, msg));
        }
    }

    if !args.quiet {
        println!("Optimized ({} ops):", chain.len());
        println!("{}", chain.serialize(indent));
    }
    println!("{}", report.summary());

    if report.outcome == PassOutcome::BoundExhausted {
        println!("Warning: optimizer stopped at the pass limit ({} passes)", report.passes);
    }

    if verbose > 0 {
        println!(
            "Removed {} of {} ops",
            report.ops_removed(),
            report.original_len
        );
    }

    Ok(())
}

/// Run the optimizer. With `trace_passes`, diagnostics are captured and
/// returned in order instead of going to the log.
fn optimize_chain(
    chain: &mut OpChain,
    config: OptimizerConfig,
    trace_passes: bool,
) -> Result<(OptimizeReport, Vec<(Level, String)>)> {
    if !trace_passes {
        let report = Optimizer::new(config).with_sink(&TracingSink).optimize(chain)?;
        return Ok((report, Vec::new()));
    }

    let sink = CaptureSink::new(true);
    let report = Optimizer::new(config).with_sink(&sink).optimize(chain)?;
    Ok((report, sink.messages()))
}

/// Prefix each line of a diagnostic with its level
fn format_diagnostic(level: Level, msg: &str) -> String {
    let tag = match level {
        Level::Debug => "[debug]",
        Level::Warn => "[warn] ",
    };
    msg.lines()
        .map(|line| format!("{tag} {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
