use std::{fs::File, io::BufWriter, path::Path, time::Instant};

use mcatlas::prelude::*;
use serde::Serialize;

use crate::{
    cli::{BenchArgs, PricingArgs},
    config::PricingRequest,
    errors::Result,
    progress::ProgressObserver,
};

/// Sample paths laid out for a line chart: one row per time step.
#[derive(Debug, Serialize)]
struct PathsExport<'a> {
    option: &'a OptionSpec,
    market: &'a MarketParams,
    price: f64,
    std_error: f64,
    times: Vec<f64>,
    paths: Vec<Vec<f64>>,
}

fn simulate(
    request: &PricingRequest,
    option: &OptionSpec,
    show_progress: bool,
) -> Result<PricingResult> {
    let observer = if show_progress {
        ProgressObserver::new(request.simulation.num_simulations)
    } else {
        ProgressObserver::hidden()
    };
    let mut pricer = MonteCarloPricer::new(request.simulation.clone()).with_observer(&observer);
    if let Some(timeout) = request.timeout()? {
        pricer = pricer.with_cancel(CancellationToken::with_timeout(timeout));
    }

    let started = Instant::now();
    let result = pricer.price(&request.market, option);
    observer.finish();
    let result = result?;
    tracing::info!(
        paths = result.num_paths,
        skipped = result.skipped_paths,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "simulation finished"
    );
    Ok(result)
}

fn write_paths(
    path: &Path,
    request: &PricingRequest,
    option: &OptionSpec,
    result: &PricingResult,
) -> Result<()> {
    let dt = request.market.t / request.simulation.steps as f64;
    let export = PathsExport {
        option,
        market: &request.market,
        price: result.price,
        std_error: result.std_error,
        times: (0..=request.simulation.steps).map(|i| i as f64 * dt).collect(),
        paths: result.sample_matrix(),
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &export)?;
    tracing::info!(file = %path.display(), samples = result.sample_paths.len(), "wrote sample paths");
    Ok(())
}

fn print_estimate(label: &str, result: &PricingResult) {
    let (lo, hi) = result.confidence_interval(1.96);
    println!(
        "{} price: ${:.4} (± {:.4}, 95% CI ${:.4} - ${:.4})",
        label, result.price, result.std_error, lo, hi
    );
    if result.skipped_paths > 0 {
        println!(
            "  {} of {} trials dropped for non-finite values",
            result.skipped_paths,
            result.skipped_paths + result.num_paths
        );
    }
}

pub fn run_asian(args: &PricingArgs) -> Result<()> {
    let request = PricingRequest::from_args(args)?;
    let option = OptionSpec::asian(request.strike, request.option_type);
    tracing::debug!(?request, "pricing Asian option");

    let result = simulate(&request, &option, !args.no_progress)?;
    print_estimate(&format!("Asian {}", option.option_type), &result);

    if let Some(path) = &args.paths_out {
        write_paths(path, &request, &option, &result)?;
    }
    Ok(())
}

pub fn run_european(args: &PricingArgs) -> Result<()> {
    let request = PricingRequest::from_args(args)?;
    let option = OptionSpec::european(request.strike, request.option_type);
    tracing::debug!(?request, "pricing European option");

    let greeks = black_scholes_greeks(&request.market, request.strike, request.option_type)?;
    println!("Black-Scholes {} price: ${:.4}", option.option_type, greeks.price);
    println!(
        "  delta {:.4}  gamma {:.4}  vega {:.4}  theta/day {:.4}  rho {:.4}",
        greeks.delta,
        greeks.gamma,
        greeks.vega,
        greeks.theta / 365.0,
        greeks.rho
    );

    let result = simulate(&request, &option, !args.no_progress)?;
    print_estimate(&format!("Monte Carlo {}", option.option_type), &result);
    let z = if result.std_error > 0.0 {
        (result.price - greeks.price) / result.std_error
    } else {
        0.0
    };
    println!("  deviation from closed form: {:.2} standard errors", z);

    if let Some(path) = &args.paths_out {
        write_paths(path, &request, &option, &result)?;
    }
    Ok(())
}

pub fn run_bench(args: &BenchArgs) -> Result<()> {
    let market = MarketParams::new(100.0, 0.05, 0.2, 1.0);
    let option = OptionSpec::asian(100.0, OptionType::Call);
    let config = SimulationConfig::new(args.simulations, args.steps).with_seed(args.seed);

    println!("Running {} simulations sequentially...", args.simulations);
    let started = Instant::now();
    let seq = MonteCarloPricer::new(config.clone().sequential()).price(&market, &option)?;
    let seq_secs = started.elapsed().as_secs_f64();
    println!("Sequential run took: {:.4} seconds", seq_secs);

    println!("{}", "-".repeat(30));

    println!("Running {} simulations in parallel...", args.simulations);
    let started = Instant::now();
    let par = MonteCarloPricer::new(config).price(&market, &option)?;
    let par_secs = started.elapsed().as_secs_f64();
    println!("Parallel run took: {:.4} seconds", par_secs);

    println!("{}", "-".repeat(30));

    if seq.price != par.price {
        tracing::warn!(seq = seq.price, par = par.price, "seeded runs disagree");
    }
    if par_secs > 0.0 {
        println!("Parallel run is {:.2}x faster.", seq_secs / par_secs);
    }
    println!("Price from both runs: ${:.4}", par.price);
    Ok(())
}
