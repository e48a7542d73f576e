use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Default number of paths retained for plotting.
pub const DEFAULT_SAMPLE_CAP: usize = 100;
/// Default number of consecutive trials sharing one generator.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Market and model inputs of a single pricing call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Spot price S0
    pub s0: f64,
    /// Continuously compounded risk-free rate
    pub r: f64,
    /// Volatility
    pub sigma: f64,
    /// Time to maturity in years
    pub t: f64,
}

impl MarketParams {
    pub fn new(s0: f64, r: f64, sigma: f64, t: f64) -> Self {
        Self { s0, r, sigma, t }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.s0.is_finite() || self.s0 <= 0.0 {
            return Err(McError::InvalidParameter(format!(
                "spot price must be positive and finite, got {}",
                self.s0
            )));
        }
        if !self.r.is_finite() {
            return Err(McError::InvalidParameter(format!(
                "risk-free rate must be finite, got {}",
                self.r
            )));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(McError::InvalidParameter(format!(
                "volatility must be non-negative and finite, got {}",
                self.sigma
            )));
        }
        if !self.t.is_finite() || self.t < 0.0 {
            return Err(McError::InvalidParameter(format!(
                "time to maturity must be non-negative and finite, got {}",
                self.t
            )));
        }
        Ok(())
    }

    /// Discount factor exp(-rT).
    pub fn discount_factor(&self) -> f64 {
        (-self.r * self.t).exp()
    }
}

/// What to do with a trial whose path or payoff is not finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonFinitePolicy {
    /// Abort the run with `NumericalError`.
    #[default]
    Fail,
    /// Drop the trial and average over the accepted ones.
    Skip,
}

/// Simulation controls: cost, precision, reproducibility and execution mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub steps: usize,
    pub num_simulations: usize,
    /// Run seed. `None` draws one from OS entropy, so results are not
    /// reproducible.
    pub seed: Option<u64>,
    pub sample_cap: usize,
    pub batch_size: usize,
    pub non_finite_policy: NonFinitePolicy,
    pub parallel: bool,
    /// Size of a dedicated worker pool. `None` runs on rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 252,
            num_simulations: 10_000,
            seed: None,
            sample_cap: DEFAULT_SAMPLE_CAP,
            batch_size: DEFAULT_BATCH_SIZE,
            non_finite_policy: NonFinitePolicy::Fail,
            parallel: true,
            threads: None,
        }
    }
}

impl SimulationConfig {
    pub fn new(num_simulations: usize, steps: usize) -> Self {
        Self {
            num_simulations,
            steps,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_sample_cap(mut self, sample_cap: usize) -> Self {
        self.sample_cap = sample_cap;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_non_finite_policy(mut self, policy: NonFinitePolicy) -> Self {
        self.non_finite_policy = policy;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps < 1 {
            return Err(McError::InvalidParameter(format!(
                "steps must be at least 1, got {}",
                self.steps
            )));
        }
        if self.num_simulations < 1 {
            return Err(McError::InvalidParameter(format!(
                "number of simulations must be at least 1, got {}",
                self.num_simulations
            )));
        }
        if self.batch_size < 1 {
            return Err(McError::InvalidParameter(format!(
                "batch size must be at least 1, got {}",
                self.batch_size
            )));
        }
        if self.threads == Some(0) {
            return Err(McError::InvalidParameter(
                "thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of paths that end up in the sample buffer.
    pub fn retained_paths(&self) -> usize {
        self.num_simulations.min(self.sample_cap)
    }
}
