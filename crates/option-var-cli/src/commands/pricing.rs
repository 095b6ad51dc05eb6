use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use option_var_core::pricing::black_scholes::{self, CallContract};

/// Arguments for Black-Scholes call pricing
#[derive(Args)]
pub struct PriceArgs {
    /// Comma-separated spot prices (e.g. "90,100,110")
    #[arg(long, value_delimiter = ',', required = true)]
    pub spots: Vec<f64>,

    /// Option strike price
    #[arg(long)]
    pub strike_price: f64,

    /// Continuously-compounded risk-free rate
    #[arg(long, default_value = "0.05", allow_hyphen_values = true)]
    pub interest_rate: f64,

    /// Black-Scholes volatility (annualised)
    #[arg(long, default_value = "0.2")]
    pub volatility: f64,

    /// Option maturity in years from the valuation date
    #[arg(long, allow_hyphen_values = true)]
    pub maturity: f64,

    /// Valuation offset in years
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub today: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PriceRow {
    spot: f64,
    call_value: f64,
    intrinsic_value: f64,
    time_value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PriceOutput {
    time_to_maturity: f64,
    results: Vec<PriceRow>,
}

pub fn run_price(args: PriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let contract = CallContract {
        strike_price: args.strike_price,
        interest_rate: args.interest_rate,
        volatility: args.volatility,
        time_to_maturity: args.maturity - args.today,
    };
    let values = black_scholes::call_prices(&args.spots, &contract)?;

    let results = args
        .spots
        .iter()
        .zip(values)
        .map(|(&spot, call_value)| {
            let intrinsic_value = black_scholes::intrinsic_value(spot, args.strike_price);
            PriceRow {
                spot,
                call_value,
                intrinsic_value,
                time_value: call_value - intrinsic_value,
            }
        })
        .collect();

    let output = PriceOutput {
        time_to_maturity: contract.time_to_maturity,
        results,
    };
    Ok(serde_json::to_value(output)?)
}
