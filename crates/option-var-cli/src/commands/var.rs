use clap::Args;
use serde_json::Value;
use tracing::debug;

use option_var_core::market::price_series::PriceSource;
use option_var_core::risk::historical_var::{self, ContractParameters};
use option_var_core::risk::quantile::RankPolicy;

use crate::input;

/// Arguments for historical-simulation VaR
#[derive(Args)]
pub struct VarArgs {
    /// Path to JSON or YAML parameter file (overrides the flags below)
    #[arg(long)]
    pub input: Option<String>,

    /// Option maturity in years from the valuation date
    #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
    pub maturity: f64,

    /// Continuously-compounded risk-free rate
    #[arg(long, default_value = "0.05", allow_hyphen_values = true)]
    pub interest_rate: f64,

    /// Number of daily prices in the path
    #[arg(long, default_value = "250")]
    pub hist_data: u32,

    /// Black-Scholes volatility (annualised)
    #[arg(long, default_value = "0.2", allow_hyphen_values = true)]
    pub volatility: f64,

    /// Option strike price
    #[arg(long, default_value = "100")]
    pub strike_price: f64,

    /// Tail probability; VaR is reported at (1 - alpha) confidence
    #[arg(long, default_value = "0.05", allow_hyphen_values = true)]
    pub alpha: f64,

    /// Valuation offset in years
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub today: f64,

    /// Number of call contracts held
    #[arg(long, default_value = "100")]
    pub position_size: f64,

    /// Mean of the synthetic price distribution
    #[arg(long, default_value = "100")]
    pub price_mean: f64,

    /// Standard deviation of the synthetic price distribution
    #[arg(long, default_value = "5")]
    pub price_std_dev: f64,

    /// Seed for a reproducible price path
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fail instead of clamping when round(alpha * k) is rank 0
    #[arg(long)]
    pub strict_rank: bool,
}

impl VarArgs {
    fn to_parameters(&self) -> ContractParameters {
        let mut params = ContractParameters::new(
            self.maturity,
            self.interest_rate,
            self.hist_data,
            self.volatility,
            self.strike_price,
            self.alpha,
        );
        params.today = self.today;
        params.position_size = self.position_size;
        params.price_source = PriceSource::Synthetic {
            mean: self.price_mean,
            std_dev: self.price_std_dev,
        };
        params.seed = self.seed;
        if self.strict_rank {
            params.rank_policy = RankPolicy::Strict;
        }
        params
    }
}

pub fn run_var(args: VarArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: ContractParameters = if let Some(ref path) = args.input {
        debug!(path = %path, "reading parameters from file");
        input::file::read_config(path)?
    } else if let Some(piped) = input::stdin::read_stdin_config()? {
        debug!("read parameters from stdin");
        piped
    } else {
        args.to_parameters()
    };
    let result = historical_var::compute_historical_var(&params)?;
    Ok(result.to_value()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct VarCommand {
        #[command(flatten)]
        args: VarArgs,
    }

    fn parse(argv: &[&str]) -> ContractParameters {
        let mut full = vec!["ovar"];
        full.extend_from_slice(argv);
        VarCommand::try_parse_from(full).unwrap().args.to_parameters()
    }

    #[test]
    fn test_defaults() {
        let p = parse(&[]);
        assert_eq!(p, ContractParameters::new(1.0, 0.05, 250, 0.2, 100.0, 0.05));
    }

    #[test]
    fn test_flags_map_to_parameters() {
        let p = parse(&[
            "--maturity",
            "2",
            "--interest-rate",
            "-0.01",
            "--hist-data",
            "40",
            "--volatility",
            "0.3",
            "--strike-price",
            "110",
            "--alpha",
            "0.01",
            "--today",
            "0.5",
            "--position-size",
            "25",
            "--price-mean",
            "105",
            "--price-std-dev",
            "7.5",
            "--seed",
            "7",
            "--strict-rank",
        ]);
        assert_eq!(p.maturity, 2.0);
        assert_eq!(p.interest_rate, -0.01);
        assert_eq!(p.hist_data, 40);
        assert_eq!(p.volatility, 0.3);
        assert_eq!(p.strike_price, 110.0);
        assert_eq!(p.alpha, 0.01);
        assert_eq!(p.today, 0.5);
        assert_eq!(p.position_size, 25.0);
        assert_eq!(
            p.price_source,
            PriceSource::Synthetic {
                mean: 105.0,
                std_dev: 7.5
            }
        );
        assert_eq!(p.seed, Some(7));
        assert_eq!(p.rank_policy, RankPolicy::Strict);
    }

    #[test]
    fn test_rank_policy_clamps_without_flag() {
        let p = parse(&["--seed", "1"]);
        assert_eq!(p.rank_policy, RankPolicy::Clamp);
        assert_eq!(p.seed, Some(1));
    }
}
