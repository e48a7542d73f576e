//! Geometric Brownian motion path simulator.
//!
//! Under the risk-neutral measure `dS = r S dt + σ S dW`, whose exact solution
//! over one step is
//!
//! `S(t + dt) = S(t) · exp((r - σ²/2) dt + σ √dt Z)`, `Z ~ N(0, 1)`.
//!
//! The update has no discretisation bias, so the step count only changes the
//! resolution of the path.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::prelude::*;

/// Ordered prices `S(t_0), .., S(t_steps)` with `S(t_0) = S0`.
pub type Path = Vec<f64>;

/// Immutable GBM stepper. All mutable state lives in the caller's generator,
/// so one simulator can be shared by every worker thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbmPathSimulator {
    s0: f64,
    steps: usize,
    dt: f64,
    drift: f64,
    vol_sqrt_dt: f64,
}

impl GbmPathSimulator {
    pub fn new(market: &MarketParams, steps: usize) -> Result<Self> {
        market.validate()?;
        if steps < 1 {
            return Err(McError::InvalidParameter(format!(
                "steps must be at least 1, got {}",
                steps
            )));
        }
        let dt = market.t / steps as f64;
        Ok(Self {
            s0: market.s0,
            steps,
            dt,
            drift: (market.r - 0.5 * market.sigma * market.sigma) * dt,
            vol_sqrt_dt: market.sigma * dt.sqrt(),
        })
    }

    pub fn s0(&self) -> f64 {
        self.s0
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Overwrites `path` with a fresh path, reusing its allocation.
    /// Consumes exactly `steps` standard normal draws from `rng`.
    #[inline]
    pub fn simulate_into<R: Rng + ?Sized>(&self, rng: &mut R, path: &mut Vec<f64>) {
        path.clear();
        path.reserve(self.steps + 1);
        path.push(self.s0);

        let mut s = self.s0;
        for _ in 0..self.steps {
            let z = rng.sample::<f64, _>(StandardNormal);
            s *= (self.drift + self.vol_sqrt_dt * z).exp();
            path.push(s);
        }
    }

    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> Path {
        let mut path = Vec::with_capacity(self.steps + 1);
        self.simulate_into(rng, &mut path);
        path
    }
}

/// Generator for a run: seeded when a seed is given, OS entropy otherwise.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generates one GBM path of `steps + 1` prices.
///
/// With `Some(seed)` the output is reproducible bit for bit; with `None` each
/// call uses a freshly entropy-seeded generator.
pub fn generate_path(
    s0: f64,
    r: f64,
    sigma: f64,
    t: f64,
    steps: usize,
    seed: Option<u64>,
) -> Result<Path> {
    let simulator = GbmPathSimulator::new(&MarketParams::new(s0, r, sigma, t), steps)?;
    let mut rng = rng_from_seed(seed);
    Ok(simulator.simulate(&mut rng))
}
