use mcatlas::prelude::*;

fn main() -> Result<()> {
    let market = MarketParams::new(100.0, 0.05, 0.2, 1.0);
    let config = SimulationConfig::new(100_000, 252).with_seed(42);

    for option_type in [OptionType::Call, OptionType::Put] {
        let option = OptionSpec::asian(100.0, option_type);
        let result = MonteCarloPricer::new(config.clone()).price(&market, &option)?;
        let (lo, hi) = result.confidence_interval(1.96);
        let european = black_scholes_price(&market, option.strike, option_type)?;
        println!(
            "Asian {} price: {:.4} (95% CI {:.4} - {:.4}), European: {:.4}",
            option_type, result.price, lo, hi, european
        );
    }
    Ok(())
}
