use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::prelude::*;

/// Closed-form European price and first order sensitivities.
///
/// `theta` is per year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlackScholesGreeks {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

/// Black-Scholes-Merton price and greeks of a European call or put.
///
/// With zero volatility or zero maturity the option is worth its discounted
/// intrinsic value on the forward and only delta and rho are non-zero.
pub fn black_scholes_greeks(
    market: &MarketParams,
    strike: f64,
    option_type: OptionType,
) -> Result<BlackScholesGreeks> {
    market.validate()?;
    if !strike.is_finite() || strike <= 0.0 {
        return Err(McError::InvalidParameter(format!(
            "strike must be positive and finite, got {}",
            strike
        )));
    }
    let MarketParams { s0: s, r, sigma, t } = *market;
    let df = (-r * t).exp();
    let sign = match option_type {
        OptionType::Call => 1.0,
        OptionType::Put => -1.0,
    };

    let vol_sqrt_t = sigma * t.sqrt();
    if vol_sqrt_t <= 0.0 {
        let intrinsic = (sign * (s - strike * df)).max(0.0);
        let in_the_money = intrinsic > 0.0;
        return Ok(BlackScholesGreeks {
            price: intrinsic,
            delta: if in_the_money { sign } else { 0.0 },
            gamma: 0.0,
            vega: 0.0,
            theta: if in_the_money { -sign * r * strike * df } else { 0.0 },
            rho: if in_the_money { sign * strike * t * df } else { 0.0 },
        });
    }

    let n = Normal::standard();
    let d1 = ((s / strike).ln() + (r + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
    let d2 = d1 - vol_sqrt_t;
    let nd1 = n.cdf(sign * d1);
    let nd2 = n.cdf(sign * d2);
    let pdf_d1 = n.pdf(d1);

    Ok(BlackScholesGreeks {
        price: sign * (s * nd1 - strike * df * nd2),
        delta: sign * nd1,
        gamma: pdf_d1 / (s * vol_sqrt_t),
        vega: s * pdf_d1 * t.sqrt(),
        theta: -s * pdf_d1 * sigma / (2.0 * t.sqrt()) - sign * r * strike * df * nd2,
        rho: sign * strike * t * df * nd2,
    })
}

/// Black-Scholes-Merton price of a European call or put.
pub fn black_scholes_price(
    market: &MarketParams,
    strike: f64,
    option_type: OptionType,
) -> Result<f64> {
    Ok(black_scholes_greeks(market, strike, option_type)?.price)
}
