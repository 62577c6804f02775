//! vfx-opt - inspect and optimize color transform op chains
//!
//! Reads a YAML chain description, runs the peephole optimizer over it and
//! reports what was removed.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "vfx-opt")]
#[command(author, version, about = "Optimize color transform op chains")]
#[command(long_about = "
Loads an op chain written as YAML, removes identity ops and adjacent
inverse pairs, and prints the result.

Examples:
  vfx-opt optimize chain.yaml                  # Optimize and print summary
  vfx-opt optimize chain.yaml --combine        # Also merge adjacent exponents
  vfx-opt -vv optimize chain.yaml              # Show optimizer debug output
  vfx-opt optimize chain.yaml --trace-passes   # Print pass diagnostics
  vfx-opt apply chain.yaml --rgba 0.18,0.18,0.18,1
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a chain and print the result
    #[command(visible_alias = "o")]
    Optimize(OptimizeArgs),

    /// Evaluate a pixel through the original and optimized chain
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),
}

/// Optimizer settings shared by all commands.
#[derive(Args)]
struct OptimizerArgs {
    /// Optimizer config (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Merge adjacent compatible ops
    #[arg(long)]
    combine: bool,

    /// Override the maximum number of optimizer passes
    #[arg(long)]
    max_passes: Option<usize>,
}

#[derive(Args)]
struct OptimizeArgs {
    /// Chain description (YAML)
    input: PathBuf,

    #[command(flatten)]
    optimizer: OptimizerArgs,

    /// Only print the summary line
    #[arg(short, long)]
    quiet: bool,

    /// Print the optimizer's pass diagnostics in order
    #[arg(long)]
    trace_passes: bool,
}

#[derive(Args)]
struct ApplyArgs {
    /// Chain description (YAML)
    input: PathBuf,

    /// Pixel to evaluate: r,g,b,a
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [0.18_f32, 0.18, 0.18, 1.0]
    )]
    rgba: Vec<f32>,

    #[command(flatten)]
    optimizer: OptimizerArgs,
}

/// Initialize logging based on verbosity level.
fn init_logging(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Optimize(args) => commands::optimize::run(args, cli.verbose),
        Commands::Apply(args) => commands::apply::run(args, cli.verbose),
    }
}
