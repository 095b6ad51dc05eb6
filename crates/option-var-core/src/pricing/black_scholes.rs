use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::error::OptionVarError;
use crate::types::{Price, Rate, Years};
use crate::OptionVarResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Fixed terms of a European call, held constant while the spot moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallContract {
    pub strike_price: Price,
    pub interest_rate: Rate,
    pub volatility: Rate,
    /// Maturity minus the valuation offset, in years.
    pub time_to_maturity: Years,
}

// ---------------------------------------------------------------------------
// Black-Scholes internals
// ---------------------------------------------------------------------------

struct BsTerms {
    d1: f64,
    d2: f64,
}

/// d1 = (ln(S/K) + (r - sigma^2/2) * tau) / (sigma * sqrt(tau)), d2 = d1 - sigma * sqrt(tau)
fn compute_bs_terms(spot: Price, contract: &CallContract) -> BsTerms {
    let sigma = contract.volatility;
    let tau = contract.time_to_maturity;
    let sigma_sqrt_t = sigma * tau.sqrt();
    let d1 = ((spot / contract.strike_price).ln()
        + (contract.interest_rate - sigma * sigma / 2.0) * tau)
        / sigma_sqrt_t;
    BsTerms {
        d1,
        d2: d1 - sigma_sqrt_t,
    }
}

fn standard_normal() -> OptionVarResult<Normal> {
    Normal::new(0.0, 1.0)
        .map_err(|e| OptionVarError::domain("standard normal", format!("{e}")))
}

fn price_with(norm: &Normal, spot: Price, contract: &CallContract) -> OptionVarResult<Price> {
    if !(spot.is_finite() && spot > 0.0) {
        return Err(OptionVarError::domain(
            "black_scholes",
            format!("spot price {spot} must be positive; log-moneyness is undefined"),
        ));
    }
    let BsTerms { d1, d2 } = compute_bs_terms(spot, contract);
    let discount = (-contract.interest_rate * contract.time_to_maturity).exp();
    let value = spot * norm.cdf(d1) - contract.strike_price * discount * norm.cdf(d2);
    Ok(value.max(0.0))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_contract(contract: &CallContract) -> OptionVarResult<()> {
    if !(contract.strike_price.is_finite() && contract.strike_price > 0.0) {
        return Err(OptionVarError::domain(
            "black_scholes",
            "strike price must be positive; log-moneyness is undefined",
        ));
    }
    if !(contract.volatility.is_finite() && contract.volatility > 0.0) {
        return Err(OptionVarError::domain(
            "black_scholes",
            format!(
                "volatility {} gives a zero or undefined sigma * sqrt(tau) denominator",
                contract.volatility
            ),
        ));
    }
    if !(contract.time_to_maturity.is_finite() && contract.time_to_maturity > 0.0) {
        return Err(OptionVarError::domain(
            "black_scholes",
            format!(
                "time to maturity {} gives a zero or undefined sigma * sqrt(tau) denominator",
                contract.time_to_maturity
            ),
        ));
    }
    if !contract.interest_rate.is_finite() {
        return Err(OptionVarError::domain(
            "black_scholes",
            "interest rate must be finite",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Black-Scholes value of one European call at `spot`.
pub fn call_price(spot: Price, contract: &CallContract) -> OptionVarResult<Price> {
    validate_contract(contract)?;
    price_with(&standard_normal()?, spot, contract)
}

/// Black-Scholes call values for every spot, same length and order as `spots`.
pub fn call_prices(spots: &[Price], contract: &CallContract) -> OptionVarResult<Vec<Price>> {
    validate_contract(contract)?;
    let norm = standard_normal()?;
    let values = spots
        .iter()
        .map(|&s| price_with(&norm, s, contract))
        .collect::<OptionVarResult<Vec<_>>>()?;
    debug!(
        count = values.len(),
        strike = contract.strike_price,
        tau = contract.time_to_maturity,
        "repriced call along spot path"
    );
    Ok(values)
}

/// Payoff at expiry, `max(S - K, 0)`.
pub fn intrinsic_value(spot: Price, strike_price: Price) -> Price {
    (spot - strike_price).max(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
