use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl FromStr for OptionType {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(OptionType::Call),
            "put" => Ok(OptionType::Put),
            other => Err(McError::InvalidParameter(format!(
                "unsupported option type '{}', expected 'call' or 'put'",
                other
            ))),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Which price of the path the payoff is written on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionStyle {
    /// Arithmetic average of `path[1..]`. The initial spot is not averaged.
    #[default]
    Asian,
    /// Terminal price `path[steps]`.
    European,
}

impl fmt::Display for OptionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionStyle::Asian => write!(f, "Asian"),
            OptionStyle::European => write!(f, "European"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub strike: f64,
    pub option_type: OptionType,
    #[serde(default)]
    pub style: OptionStyle,
}

impl OptionSpec {
    pub fn new(strike: f64, option_type: OptionType) -> Self {
        Self {
            strike,
            option_type,
            style: OptionStyle::Asian,
        }
    }

    pub fn asian(strike: f64, option_type: OptionType) -> Self {
        Self::new(strike, option_type)
    }

    pub fn european(strike: f64, option_type: OptionType) -> Self {
        Self {
            strike,
            option_type,
            style: OptionStyle::European,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.strike.is_finite() || self.strike < 0.0 {
            return Err(McError::InvalidParameter(format!(
                "strike must be non-negative and finite, got {}",
                self.strike
            )));
        }
        Ok(())
    }

    /// Price the payoff is written on: the average of `path[1..]` for Asian
    /// options, the last value for European ones.
    pub fn underlying_price(&self, path: &[f64]) -> Result<f64> {
        if path.len() < 2 {
            return Err(McError::InvalidParameter(format!(
                "a path needs at least two points, got {}",
                path.len()
            )));
        }
        let observed = &path[1..];
        let price = match self.style {
            OptionStyle::Asian => observed.iter().sum::<f64>() / observed.len() as f64,
            OptionStyle::European => observed[observed.len() - 1],
        };
        Ok(price)
    }

    /// Undiscounted payoff of one path.
    pub fn payoff(&self, path: &[f64]) -> Result<f64> {
        let price = self.underlying_price(path)?;
        Ok(self.payoff_from_price(price))
    }

    #[inline]
    pub fn payoff_from_price(&self, price: f64) -> f64 {
        match self.option_type {
            OptionType::Call => (price - self.strike).max(0.0),
            OptionType::Put => (self.strike - price).max(0.0),
        }
    }
}
