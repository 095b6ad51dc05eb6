use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OptionVarError;
use crate::types::Price;
use crate::OptionVarResult;

/// Annualisation factor for daily return statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary of a log-return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatistics {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    /// `std_dev * sqrt(252)`
    pub annualised_volatility: f64,
}

/// Continuously-compounded returns `ln(p[i] / p[i-1])` for i in 1..n.
///
/// The first position has no predecessor and is omitted, so the output has
/// exactly `n - 1` elements aligned to `prices[1..]`.
pub fn log_returns(prices: &[Price]) -> OptionVarResult<Vec<f64>> {
    if prices.len() < 2 {
        return Err(OptionVarError::InsufficientData(format!(
            "Log returns need at least 2 prices, got {}",
            prices.len()
        )));
    }
    if let Some((i, p)) = prices
        .iter()
        .enumerate()
        .find(|(_, p)| !(p.is_finite() && **p > 0.0))
    {
        return Err(OptionVarError::domain(
            "log_returns",
            format!("price at index {i} is {p}; log return undefined for non-positive prices"),
        ));
    }

    let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    debug!(count = returns.len(), "extracted log returns");
    Ok(returns)
}

/// Mean, sample standard deviation and annualised volatility of `returns`.
pub fn summarise_returns(returns: &[f64]) -> OptionVarResult<ReturnStatistics> {
    if returns.is_empty() {
        return Err(OptionVarError::InsufficientData(
            "At least one return is required".into(),
        ));
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let std_dev = if returns.len() > 1 {
        let ss = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>();
        (ss / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    Ok(ReturnStatistics {
        count: returns.len(),
        mean,
        std_dev,
        annualised_volatility: std_dev * TRADING_DAYS_PER_YEAR.sqrt(),
    })
}
