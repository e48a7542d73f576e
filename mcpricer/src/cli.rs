use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mcpricer", version, about = "Monte Carlo pricer for Asian options")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price an arithmetic-average Asian option by simulation
    Asian(PricingArgs),
    /// Price a European option in closed form and by simulation
    European(PricingArgs),
    /// Time sequential against parallel path simulation
    Bench(BenchArgs),
}

/// Pricing inputs. Flags override values read from `--config`.
#[derive(Debug, Clone, Default, Args)]
pub struct PricingArgs {
    /// JSON file with a full or partial pricing request
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Spot price S0
    #[arg(long)]
    pub s0: Option<f64>,
    #[arg(long, short = 'k')]
    pub strike: Option<f64>,
    /// Time to maturity in years
    #[arg(long, short = 't')]
    pub maturity: Option<f64>,
    /// Continuously compounded risk-free rate, e.g. 0.05
    #[arg(long, short = 'r', allow_negative_numbers = true)]
    pub rate: Option<f64>,
    /// Volatility, e.g. 0.2
    #[arg(long)]
    pub sigma: Option<f64>,
    #[arg(long, short = 'n')]
    pub simulations: Option<usize>,
    #[arg(long)]
    pub steps: Option<usize>,
    /// "call" or "put"
    #[arg(long)]
    pub option_type: Option<String>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Number of paths kept for plotting
    #[arg(long)]
    pub sample_cap: Option<usize>,
    #[arg(long)]
    pub threads: Option<usize>,
    #[arg(long)]
    pub sequential: bool,
    /// Drop trials with non-finite values instead of failing
    #[arg(long)]
    pub skip_non_finite: bool,
    #[arg(long)]
    pub timeout_secs: Option<f64>,
    /// Write the sample paths as JSON to this file
    #[arg(long)]
    pub paths_out: Option<PathBuf>,
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Clone, Args)]
pub struct BenchArgs {
    #[arg(long, short = 'n', default_value_t = 100_000)]
    pub simulations: usize,
    #[arg(long, default_value_t = 252)]
    pub steps: usize,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
