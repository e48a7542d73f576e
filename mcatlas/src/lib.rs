//! # mcatlas
//!
//! Monte Carlo engine for arithmetic-average Asian options under geometric
//! Brownian motion.
//!
//! - [`models::gbm`] - exact GBM path simulation
//! - [`models::montecarlo`] - batched, optionally parallel Monte Carlo pricer
//! - [`math::black_scholes`] - closed-form European reference prices
//!
//! ```
//! use mcatlas::prelude::*;
//!
//! let market = MarketParams::new(100.0, 0.05, 0.2, 1.0);
//! let option = OptionSpec::asian(100.0, OptionType::Call);
//! let config = SimulationConfig::new(20_000, 52).with_seed(7);
//!
//! let result = MonteCarloPricer::new(config).price(&market, &option)?;
//! assert!(result.price > 4.0 && result.price < 7.5);
//! assert_eq!(result.sample_paths.len(), 100);
//! # Ok::<(), McError>(())
//! ```

pub mod math;
pub mod models;
pub mod prelude;
pub mod utils;
