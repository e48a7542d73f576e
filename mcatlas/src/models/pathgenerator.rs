use rand::rngs::StdRng;

use crate::prelude::*;

/// Source of simulated price paths for the Monte Carlo pricer.
pub trait PathGenerator: Sync {
    /// Number of time steps; every path has `steps() + 1` points.
    fn steps(&self) -> usize;

    /// Overwrites `path` with a new path drawn from `rng`.
    fn generate_into(&self, rng: &mut StdRng, path: &mut Vec<f64>);

    fn generate_paths(&self, num_paths: usize, seed: Option<u64>) -> Vec<Path> {
        let mut rng = rng_from_seed(seed);
        (0..num_paths)
            .map(|_| {
                let mut path = Vec::with_capacity(self.steps() + 1);
                self.generate_into(&mut rng, &mut path);
                path
            })
            .collect()
    }
}

impl PathGenerator for GbmPathSimulator {
    fn steps(&self) -> usize {
        GbmPathSimulator::steps(self)
    }

    #[inline]
    fn generate_into(&self, rng: &mut StdRng, path: &mut Vec<f64>) {
        self.simulate_into(rng, path);
    }
}
