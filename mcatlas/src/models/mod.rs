pub mod gbm;
pub mod montecarlo;
pub mod observer;
pub mod params;
pub mod pathgenerator;
pub mod payoff;
