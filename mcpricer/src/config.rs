use std::{fs, path::Path, time::Duration};

use mcatlas::prelude::{MarketParams, NonFinitePolicy, OptionType, SimulationConfig};
use serde::{Deserialize, Serialize};

use crate::{
    cli::PricingArgs,
    errors::{CliError, Result},
};

/// Everything needed for one pricing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingRequest {
    pub market: MarketParams,
    pub strike: f64,
    pub option_type: OptionType,
    pub simulation: SimulationConfig,
    pub timeout_secs: Option<f64>,
}

impl Default for PricingRequest {
    fn default() -> Self {
        Self {
            market: MarketParams::new(100.0, 0.05, 0.2, 1.0),
            strike: 100.0,
            option_type: OptionType::Call,
            simulation: SimulationConfig::new(10_000, 252),
            timeout_secs: None,
        }
    }
}

impl PricingRequest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Config file (if any) with command line flags applied on top.
    pub fn from_args(args: &PricingArgs) -> Result<Self> {
        let mut request = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        request.apply(args)?;
        Ok(request)
    }

    pub fn apply(&mut self, args: &PricingArgs) -> Result<()> {
        if let Some(s0) = args.s0 {
            self.market.s0 = s0;
        }
        if let Some(t) = args.maturity {
            self.market.t = t;
        }
        if let Some(r) = args.rate {
            self.market.r = r;
        }
        if let Some(sigma) = args.sigma {
            self.market.sigma = sigma;
        }
        if let Some(strike) = args.strike {
            self.strike = strike;
        }
        if let Some(option_type) = &args.option_type {
            self.option_type = option_type.parse()?;
        }

        let sim = &mut self.simulation;
        if let Some(n) = args.simulations {
            sim.num_simulations = n;
        }
        if let Some(steps) = args.steps {
            sim.steps = steps;
        }
        if let Some(seed) = args.seed {
            sim.seed = Some(seed);
        }
        if let Some(cap) = args.sample_cap {
            sim.sample_cap = cap;
        }
        if let Some(threads) = args.threads {
            sim.threads = Some(threads);
        }
        if args.sequential {
            sim.parallel = false;
        }
        if args.skip_non_finite {
            sim.non_finite_policy = NonFinitePolicy::Skip;
        }
        if let Some(secs) = args.timeout_secs {
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| {
                    CliError::InvalidArgument(format!(
                        "timeout must be a non-negative number of seconds, got {}",
                        secs
                    ))
                })
            })
            .transpose()
    }
}
