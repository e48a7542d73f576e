pub use crate::{
    math::{black_scholes::*, statistics::*},
    models::{gbm::*, montecarlo::*, observer::*, params::*, pathgenerator::*, payoff::*},
    utils::{cancel::*, errors::*},
};
