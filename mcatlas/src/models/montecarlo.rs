//! Monte Carlo pricer for path dependent options.
//!
//! * Trials are split into batches of consecutive logical indices. Every batch
//!   owns a private `StdRng` whose seed is drawn, in batch order, from a master
//!   generator seeded with the run seed. A seeded run therefore produces the
//!   same paths whatever the thread count or scheduling.
//! * Batch results are collected in batch order and folded sequentially, so the
//!   price of a seeded run is identical bit for bit between sequential and
//!   parallel execution.
//! * The sample buffer holds the paths of the first `min(N, sample_cap)`
//!   logical trials and never feeds back into the estimate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::{
    iter::{IntoParallelIterator, ParallelIterator},
    ThreadPoolBuilder,
};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Discounted mean payoff.
    pub price: f64,
    /// Standard error of `price`.
    pub std_error: f64,
    /// Trials that contributed to the estimate.
    pub num_paths: usize,
    /// Trials dropped under `NonFinitePolicy::Skip`.
    pub skipped_paths: usize,
    /// Up to `sample_cap` paths, in generation order.
    pub sample_paths: Vec<Path>,
}

impl PricingResult {
    /// `price ± z · std_error`.
    pub fn confidence_interval(&self, z: f64) -> (f64, f64) {
        let margin = z * self.std_error;
        (self.price - margin, self.price + margin)
    }

    /// Sample paths as a `[steps + 1][num_samples]` matrix, one row per time
    /// step, ready for a line chart.
    pub fn sample_matrix(&self) -> Vec<Vec<f64>> {
        let points = self.sample_paths.first().map_or(0, |p| p.len());
        (0..points)
            .map(|step| self.sample_paths.iter().map(|path| path[step]).collect())
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Batch {
    start: usize,
    end: usize,
    seed: u64,
}

#[derive(Debug, Default)]
struct BatchOutcome {
    moments: RunningMoments,
    skipped: usize,
    samples: Vec<Path>,
}

/// Prices options by averaging discounted payoffs over simulated paths.
pub struct MonteCarloPricer<'a> {
    config: SimulationConfig,
    cancel: Option<CancellationToken>,
    observer: Option<&'a dyn SimulationObserver>,
}

impl<'a> MonteCarloPricer<'a> {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            cancel: None,
            observer: None,
        }
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn SimulationObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Prices `option` under GBM dynamics given by `market`.
    pub fn price(&self, market: &MarketParams, option: &OptionSpec) -> Result<PricingResult> {
        self.config.validate()?;
        option.validate()?;
        let simulator = GbmPathSimulator::new(market, self.config.steps)?;
        self.price_with(&simulator, option, market.discount_factor())
    }

    /// Prices `option` on paths drawn from any generator. Fails with
    /// `InvalidParameter` before any simulation if the inputs are invalid.
    pub fn price_with<G: PathGenerator>(
        &self,
        generator: &G,
        option: &OptionSpec,
        discount_factor: f64,
    ) -> Result<PricingResult> {
        self.config.validate()?;
        option.validate()?;
        if generator.steps() < 1 {
            return Err(McError::InvalidParameter(
                "generator must produce at least one step".to_string(),
            ));
        }
        if !discount_factor.is_finite() || discount_factor < 0.0 {
            return Err(McError::InvalidParameter(format!(
                "discount factor must be non-negative and finite, got {}",
                discount_factor
            )));
        }

        let span = tracing::debug_span!(
            "mc_price",
            paths = self.config.num_simulations,
            steps = generator.steps(),
            parallel = self.config.parallel,
        );
        let _guard = span.enter();
        let started = Instant::now();

        let batches = self.plan_batches();
        let outcomes = if self.config.parallel {
            match self.config.threads {
                Some(threads) => {
                    let pool = ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .thread_name(|i| format!("mcatlas-worker-{}", i))
                        .build()
                        .map_err(|e| {
                            McError::InvalidParameter(format!("cannot build worker pool: {}", e))
                        })?;
                    pool.install(|| self.run_parallel(generator, option, batches))?
                }
                None => self.run_parallel(generator, option, batches)?,
            }
        } else {
            self.run_sequential(generator, option, batches)?
        };

        let mut moments = RunningMoments::new();
        let mut skipped = 0;
        let mut sample_paths = Vec::with_capacity(self.config.retained_paths());
        for outcome in outcomes {
            moments = moments.merge(outcome.moments);
            skipped += outcome.skipped;
            sample_paths.extend(outcome.samples);
        }

        let mean = moments.mean().ok_or_else(|| {
            McError::NumericalError(format!(
                "all {} trials produced non-finite values",
                self.config.num_simulations
            ))
        })?;

        let result = PricingResult {
            price: discount_factor * mean,
            std_error: discount_factor * moments.std_error(),
            num_paths: moments.count(),
            skipped_paths: skipped,
            sample_paths,
        };
        if skipped > 0 {
            tracing::warn!(skipped, "dropped trials with non-finite values");
        }
        tracing::debug!(
            price = result.price,
            std_error = result.std_error,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "monte carlo run finished"
        );
        Ok(result)
    }

    fn plan_batches(&self) -> Vec<Batch> {
        let n = self.config.num_simulations;
        let size = self.config.batch_size;
        let mut master = rng_from_seed(self.config.seed);
        (0..n.div_ceil(size))
            .map(|b| Batch {
                start: b * size,
                end: ((b + 1) * size).min(n),
                seed: master.gen(),
            })
            .collect()
    }

    fn run_sequential<G: PathGenerator>(
        &self,
        generator: &G,
        option: &OptionSpec,
        batches: Vec<Batch>,
    ) -> Result<Vec<BatchOutcome>> {
        let progress = AtomicUsize::new(0);
        let mut path = Vec::with_capacity(generator.steps() + 1);
        batches
            .into_iter()
            .map(|batch| self.run_batch(generator, option, batch, &mut path, &progress))
            .collect()
    }

    fn run_parallel<G: PathGenerator>(
        &self,
        generator: &G,
        option: &OptionSpec,
        batches: Vec<Batch>,
    ) -> Result<Vec<BatchOutcome>> {
        let progress = AtomicUsize::new(0);
        batches
            .into_par_iter()
            .map_init(
                || Vec::with_capacity(generator.steps() + 1),
                |path, batch| self.run_batch(generator, option, batch, path, &progress),
            )
            .collect()
    }

    fn run_batch<G: PathGenerator>(
        &self,
        generator: &G,
        option: &OptionSpec,
        batch: Batch,
        path: &mut Vec<f64>,
        progress: &AtomicUsize,
    ) -> Result<BatchOutcome> {
        if let Some(token) = &self.cancel {
            token.check()?;
        }

        let retained = self.config.retained_paths();
        let len = batch.end - batch.start;
        let mut rng = StdRng::seed_from_u64(batch.seed);
        let mut outcome = BatchOutcome {
            samples: Vec::with_capacity(retained.saturating_sub(batch.start).min(len)),
            ..BatchOutcome::default()
        };

        for trial in batch.start..batch.end {
            generator.generate_into(&mut rng, path);
            let underlying = option.underlying_price(path)?;
            let payoff = option.payoff_from_price(underlying);

            // inf and NaN are absorbing under the multiplicative update, so a
            // finite terminal value means the whole path is finite
            let terminal = path[path.len() - 1];
            if !(terminal.is_finite() && underlying.is_finite() && payoff.is_finite()) {
                match self.config.non_finite_policy {
                    NonFinitePolicy::Fail => {
                        return Err(McError::NumericalError(format!(
                            "trial {} produced a non-finite value (terminal {}, average {})",
                            trial, terminal, underlying
                        )))
                    }
                    NonFinitePolicy::Skip => {
                        outcome.skipped += 1;
                        continue;
                    }
                }
            }

            outcome.moments.add(payoff);
            if trial < retained {
                outcome.samples.push(path.clone());
            }
        }

        let done = progress.fetch_add(len, Ordering::Relaxed) + len;
        if let Some(observer) = self.observer {
            observer.on_batch_complete(done, self.config.num_simulations);
        }
        Ok(outcome)
    }
}

/// Prices an arithmetic-average Asian option with the default configuration:
/// entropy seeded, parallel, at most 100 sample paths.
///
/// `option_type` is `"call"` or `"put"`; anything else is `InvalidParameter`.
#[allow(clippy::too_many_arguments)]
pub fn price_asian_option(
    s0: f64,
    k: f64,
    t: f64,
    r: f64,
    sigma: f64,
    num_simulations: usize,
    steps: usize,
    option_type: &str,
) -> Result<PricingResult> {
    let option = OptionSpec::asian(k, option_type.parse()?);
    let market = MarketParams::new(s0, r, sigma, t);
    MonteCarloPricer::new(SimulationConfig::new(num_simulations, steps)).price(&market, &option)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atm() -> MarketParams {
        MarketParams::new(100.0, 0.05, 0.2, 1.0)
    }

    fn asian_call() -> OptionSpec {
        OptionSpec::asian(100.0, OptionType::Call)
    }

    /// Regenerates the paths of a run the way the pricer draws them.
    fn replay_paths(config: &SimulationConfig, market: &MarketParams) -> Result<Vec<Path>> {
        let sim = GbmPathSimulator::new(market, config.steps)?;
        let mut master = rng_from_seed(config.seed);
        let mut paths = Vec::with_capacity(config.num_simulations);
        let n_batches = config.num_simulations.div_ceil(config.batch_size);
        for b in 0..n_batches {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let len = (config.num_simulations - b * config.batch_size).min(config.batch_size);
            for _ in 0..len {
                paths.push(sim.simulate(&mut rng));
            }
        }
        Ok(paths)
    }

    #[test]
    fn test_single_simulation() -> Result<()> {
        let config = SimulationConfig::new(1, 12).with_seed(3);
        let result = MonteCarloPricer::new(config.clone()).price(&atm(), &asian_call())?;
        assert_eq!(result.num_paths, 1);
        assert_eq!(result.sample_paths.len(), 1);
        assert_eq!(result.std_error, 0.0);

        let path = &replay_paths(&config, &atm())?[0];
        assert_eq!(&result.sample_paths[0], path);
        let expected = atm().discount_factor() * asian_call().payoff(path)?;
        assert_eq!(result.price, expected);
        Ok(())
    }

    #[test]
    fn test_sample_buffer_is_first_paths_in_order() -> Result<()> {
        let config = SimulationConfig::new(250, 8).with_seed(21).with_batch_size(16);
        let result = MonteCarloPricer::new(config.clone()).price(&atm(), &asian_call())?;
        let replay = replay_paths(&config, &atm())?;
        assert_eq!(result.sample_paths.len(), 100);
        assert_eq!(result.sample_paths, replay[..100].to_vec());

        let config = SimulationConfig::new(50, 8).with_seed(21);
        let result = MonteCarloPricer::new(config).price(&atm(), &asian_call())?;
        assert_eq!(result.sample_paths.len(), 50);
        Ok(())
    }

    #[test]
    fn test_price_is_mean_of_replayed_payoffs() -> Result<()> {
        let config = SimulationConfig::new(300, 5).with_seed(8).with_batch_size(64);
        let result = MonteCarloPricer::new(config.clone()).price(&atm(), &asian_call())?;
        let payoffs = replay_paths(&config, &atm())?
            .iter()
            .map(|p| asian_call().payoff(p))
            .collect::<Result<Vec<f64>>>()?;
        let expected = atm().discount_factor() * payoffs.iter().sum::<f64>() / 300.0;
        assert!((result.price - expected).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_configurable_sample_cap() -> Result<()> {
        let config = SimulationConfig::new(40, 4).with_seed(1).with_sample_cap(7);
        let result = MonteCarloPricer::new(config).price(&atm(), &asian_call())?;
        assert_eq!(result.sample_paths.len(), 7);

        let config = SimulationConfig::new(40, 4).with_seed(1).with_sample_cap(0);
        let result = MonteCarloPricer::new(config).price(&atm(), &asian_call())?;
        assert!(result.sample_paths.is_empty());
        assert!(result.sample_matrix().is_empty());
        Ok(())
    }

    #[test]
    fn test_sample_cap_does_not_change_price() -> Result<()> {
        let base = SimulationConfig::new(500, 10).with_seed(5);
        let a = MonteCarloPricer::new(base.clone()).price(&atm(), &asian_call())?;
        let b = MonteCarloPricer::new(base.with_sample_cap(0)).price(&atm(), &asian_call())?;
        assert_eq!(a.price, b.price);
        assert_eq!(a.std_error, b.std_error);
        Ok(())
    }

    #[test]
    fn test_sequential_matches_parallel() -> Result<()> {
        let config = SimulationConfig::new(5_000, 20).with_seed(99).with_batch_size(128);
        let par = MonteCarloPricer::new(config.clone().with_threads(3)).price(&atm(), &asian_call())?;
        let seq = MonteCarloPricer::new(config.sequential()).price(&atm(), &asian_call())?;
        assert_eq!(par, seq);
        Ok(())
    }

    #[test]
    fn test_sample_matrix_layout() -> Result<()> {
        let config = SimulationConfig::new(3, 4).with_seed(2);
        let result = MonteCarloPricer::new(config).price(&atm(), &asian_call())?;
        let matrix = result.sample_matrix();
        assert_eq!(matrix.len(), 5);
        assert!(matrix.iter().all(|row| row.len() == 3));
        assert!(matrix[0].iter().all(|&s| s == 100.0));
        assert_eq!(matrix[4][1], result.sample_paths[1][4]);
        Ok(())
    }

    #[test]
    fn test_zero_vol_price_is_deterministic() -> Result<()> {
        let market = MarketParams::new(100.0, 0.05, 0.0, 1.0);
        let steps = 4;
        let config = SimulationConfig::new(64, steps).with_seed(4);
        let result = MonteCarloPricer::new(config).price(&market, &asian_call())?;

        let dt = 1.0 / steps as f64;
        let avg = (1..=steps)
            .map(|i| 100.0 * (0.05 * dt * i as f64).exp())
            .sum::<f64>()
            / steps as f64;
        let expected = market.discount_factor() * (avg - 100.0);
        assert!((result.price - expected).abs() < 1e-9);
        assert!(result.std_error < 1e-6);
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let pricer = MonteCarloPricer::new(SimulationConfig::new(0, 10));
        assert!(matches!(
            pricer.price(&atm(), &asian_call()),
            Err(McError::InvalidParameter(_))
        ));
        let pricer = MonteCarloPricer::new(SimulationConfig::new(10, 0));
        assert!(matches!(
            pricer.price(&atm(), &asian_call()),
            Err(McError::InvalidParameter(_))
        ));
        let pricer = MonteCarloPricer::new(SimulationConfig::new(10, 10));
        assert!(matches!(
            pricer.price(&MarketParams::new(-5.0, 0.05, 0.2, 1.0), &asian_call()),
            Err(McError::InvalidParameter(_))
        ));
        assert!(matches!(
            price_asian_option(100.0, 100.0, 1.0, 0.05, 0.2, 10, 10, "binary"),
            Err(McError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_cancelled_run_returns_error() {
        let token = CancellationToken::new();
        token.cancel();
        let pricer = MonteCarloPricer::new(SimulationConfig::new(10_000, 50)).with_cancel(token);
        assert_eq!(pricer.price(&atm(), &asian_call()), Err(McError::Cancelled));
    }

    #[test]
    fn test_observer_sees_every_path() -> Result<()> {
        let counter = PathCounter::new();
        let config = SimulationConfig::new(1_000, 5).with_batch_size(100);
        MonteCarloPricer::new(config)
            .with_observer(&counter)
            .price(&atm(), &asian_call())?;
        assert_eq!(counter.completed(), 1_000);
        assert_eq!(counter.batches(), 10);
        Ok(())
    }

    #[test]
    fn test_overflow_fails_by_default() {
        // exp(r dt) = exp(1000) overflows on every trial
        let market = MarketParams::new(1.0, 1000.0, 0.0, 1.0);
        let config = SimulationConfig::new(200, 1).with_seed(1);
        let result = MonteCarloPricer::new(config).price(&market, &asian_call());
        assert!(matches!(result, Err(McError::NumericalError(_))));
    }

    #[test]
    fn test_skip_policy_drops_overflowing_trials() -> Result<()> {
        // spot close to f64::MAX: roughly 30% of single step paths overflow
        let market = MarketParams::new(1.7e308, 0.0, 1.0, 1.0);
        let put = OptionSpec::asian(100.0, OptionType::Put);
        let config = SimulationConfig::new(200, 1)
            .with_seed(1)
            .with_non_finite_policy(NonFinitePolicy::Skip);
        let result = MonteCarloPricer::new(config).price(&market, &put)?;
        assert!(result.skipped_paths > 0);
        assert!(result.num_paths > 0);
        assert_eq!(result.num_paths + result.skipped_paths, 200);
        assert_eq!(result.price, 0.0);
        assert!(result.sample_paths.len() <= 100);
        assert!(result.sample_paths.iter().all(|p| p[1].is_finite()));
        Ok(())
    }

    #[test]
    fn test_skip_policy_with_no_survivors() {
        let market = MarketParams::new(1.0, 1000.0, 0.0, 1.0);
        let config = SimulationConfig::new(20, 1)
            .with_seed(1)
            .with_non_finite_policy(NonFinitePolicy::Skip);
        let result = MonteCarloPricer::new(config).price(&market, &asian_call());
        assert!(matches!(result, Err(McError::NumericalError(_))));
    }

    #[test]
    fn test_confidence_interval() {
        let result = PricingResult {
            price: 5.0,
            std_error: 0.5,
            num_paths: 10,
            skipped_paths: 0,
            sample_paths: vec![],
        };
        assert_eq!(result.confidence_interval(2.0), (4.0, 6.0));
    }
}
