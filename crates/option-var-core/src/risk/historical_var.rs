use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

use crate::error::OptionVarError;
#[cfg(feature = "sampling")]
use crate::market::price_series::SeededNormalSampler;
use crate::market::price_series::{resolve_price_series, NormalSampler, PriceSource};
use crate::market::returns::{log_returns, summarise_returns, ReturnStatistics};
use crate::pricing::black_scholes::{call_prices, CallContract};
use crate::risk::portfolio::{change_series, value_portfolio};
use crate::risk::quantile::{estimate_var, RankPolicy};
use crate::risk::report::{
    assemble_report, build_histogram, loss_amount, summarise_changes, ChangeStatistics,
    HistogramBin, VarReport, HISTOGRAM_BINS,
};
use crate::types::{with_metadata, ComputationOutput, Price, Rate, Years};
use crate::OptionVarResult;

/// Below this many changes the empirical quantile is noisy.
const MIN_RELIABLE_CHANGES: usize = 30;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Contract and simulation parameters for one historical VaR run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractParameters {
    /// Maturity in years from the valuation date.
    pub maturity: Years,
    pub interest_rate: Rate,
    /// Number of daily prices in the path (at least 2).
    pub hist_data: u32,
    pub volatility: Rate,
    pub strike_price: Price,
    /// Tail probability; VaR is reported at confidence `1 - alpha`.
    pub alpha: f64,
    /// Valuation offset in years.
    #[serde(default)]
    pub today: Years,
    /// Number of call contracts held.
    #[serde(default = "default_position_size")]
    pub position_size: f64,
    #[serde(default)]
    pub price_source: PriceSource,
    /// Optional seed for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub rank_policy: RankPolicy,
}

fn default_position_size() -> f64 {
    100.0
}

impl ContractParameters {
    /// Parameters with `today = 0`, 100 contracts, the default synthetic
    /// price source, no seed and the clamping rank policy.
    pub fn new(
        maturity: Years,
        interest_rate: Rate,
        hist_data: u32,
        volatility: Rate,
        strike_price: Price,
        alpha: f64,
    ) -> Self {
        Self {
            maturity,
            interest_rate,
            hist_data,
            volatility,
            strike_price,
            alpha,
            today: 0.0,
            position_size: default_position_size(),
            price_source: PriceSource::default(),
            seed: None,
            rank_policy: RankPolicy::default(),
        }
    }

    /// Parse parameters from a JSON document, applying field defaults.
    pub fn from_json(json: &str) -> OptionVarResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Years remaining between the valuation offset and maturity.
    pub fn time_to_maturity(&self) -> Years {
        self.maturity - self.today
    }
}

/// Output of a historical-simulation VaR run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalVarOutput {
    #[serde(flatten)]
    pub report: VarReport,
    /// Change at the selected quantile; negative values are losses.
    pub var_estimate: f64,
    /// The estimate as a loss, rounded to 2 dp.
    pub loss_amount: Decimal,
    /// `1 - alpha`
    pub confidence_level: f64,
    pub quantile_rank: usize,
    pub time_to_maturity: Years,
    pub return_statistics: ReturnStatistics,
    pub change_statistics: ChangeStatistics,
    pub histogram: Vec<HistogramBin>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_parameters(params: &ContractParameters) -> OptionVarResult<()> {
    if !(0.0..=1.0).contains(&params.alpha) {
        return Err(OptionVarError::invalid("alpha", "must be between 0 and 1"));
    }
    if !(params.maturity.is_finite() && params.maturity >= 0.0) {
        return Err(OptionVarError::invalid(
            "maturity",
            "must be finite and not negative",
        ));
    }
    if !(params.volatility.is_finite() && params.volatility >= 0.0) {
        return Err(OptionVarError::invalid(
            "volatility",
            "must be finite and not negative",
        ));
    }
    if !params.today.is_finite() {
        return Err(OptionVarError::invalid("today", "must be finite"));
    }
    if params.maturity <= params.today {
        return Err(OptionVarError::invalid(
            "maturity",
            format!(
                "must be after today ({}); a contract at or past maturity has no forward-looking VaR",
                params.today
            ),
        ));
    }
    if params.hist_data < 2 {
        return Err(OptionVarError::invalid(
            "hist_data",
            "must be at least 2 to form a change series",
        ));
    }
    if !(params.strike_price.is_finite() && params.strike_price > 0.0) {
        return Err(OptionVarError::invalid("strike_price", "must be positive"));
    }
    if !(params.position_size.is_finite() && params.position_size > 0.0) {
        return Err(OptionVarError::invalid("position_size", "must be positive"));
    }
    if !params.interest_rate.is_finite() {
        return Err(OptionVarError::invalid("interest_rate", "must be finite"));
    }
    if let PriceSource::Synthetic { mean, std_dev } = params.price_source {
        if !mean.is_finite() {
            return Err(OptionVarError::invalid("price_source.mean", "must be finite"));
        }
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(OptionVarError::invalid(
                "price_source.std_dev",
                "must be positive",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run historical-simulation VaR with a `StdRng` sampler seeded from
/// `params.seed` (or from entropy when no seed is given).
#[cfg(feature = "sampling")]
pub fn compute_historical_var(
    params: &ContractParameters,
) -> OptionVarResult<ComputationOutput<HistoricalVarOutput>> {
    let mut sampler = SeededNormalSampler::new(params.seed);
    compute_historical_var_with(params, &mut sampler)
}

/// Run historical-simulation VaR drawing synthetic prices from `sampler`.
///
/// Pipeline: price path -> log returns -> Black-Scholes call values ->
/// portfolio values -> day-over-day changes -> empirical quantile at rank
/// `round(alpha * k)` -> narrative report. All parameters are validated
/// before the sampler is touched.
pub fn compute_historical_var_with<S: NormalSampler + ?Sized>(
    params: &ContractParameters,
    sampler: &mut S,
) -> OptionVarResult<ComputationOutput<HistoricalVarOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_parameters(params)?;

    let tau = params.time_to_maturity();
    let contract = CallContract {
        strike_price: params.strike_price,
        interest_rate: params.interest_rate,
        volatility: params.volatility,
        time_to_maturity: tau,
    };

    let prices = resolve_price_series(&params.price_source, params.hist_data as usize, sampler)?;
    let returns = log_returns(&prices)?;
    let return_statistics = summarise_returns(&returns)?;

    let option_values = call_prices(&prices, &contract)?;
    let portfolio_values = value_portfolio(&option_values, params.position_size);
    let changes = change_series(&portfolio_values)?;

    let estimate = estimate_var(&changes, params.alpha, params.rank_policy)?;
    if estimate.clamped {
        warnings.push(format!(
            "round(alpha * {}) is rank 0; clamped to rank 1 (worst observed change)",
            changes.len()
        ));
    }
    if changes.len() < MIN_RELIABLE_CHANGES {
        warnings.push(format!(
            "Only {} portfolio changes; the empirical quantile is unreliable below {MIN_RELIABLE_CHANGES}",
            changes.len()
        ));
    }
    if matches!(params.price_source, PriceSource::Observed { .. }) {
        let realised = return_statistics.annualised_volatility;
        if realised > 2.0 * params.volatility || realised < 0.5 * params.volatility {
            warnings.push(format!(
                "Realised volatility {realised:.4} of the observed window is far from the pricing volatility {}",
                params.volatility
            ));
        }
    }

    let change_statistics = summarise_changes(&changes)?;
    let histogram = build_histogram(&changes, HISTOGRAM_BINS);
    let loss = loss_amount(estimate.var)?;
    let report = assemble_report(estimate.var, params.alpha, changes)?;

    info!(
        var_estimate = estimate.var,
        rank = estimate.rank,
        alpha = params.alpha,
        "{}",
        report.var
    );
    for w in &warnings {
        warn!("{w}");
    }

    let output = HistoricalVarOutput {
        report,
        var_estimate: estimate.var,
        loss_amount: loss,
        confidence_level: 1.0 - params.alpha,
        quantile_rank: estimate.rank,
        time_to_maturity: tau,
        return_statistics,
        change_statistics,
        histogram,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Historical Simulation VaR (Black-Scholes European Call)",
        &serde_json::json!({
            "maturity": params.maturity,
            "today": params.today,
            "interest_rate": params.interest_rate,
            "volatility": params.volatility,
            "strike_price": params.strike_price,
            "alpha": params.alpha,
            "hist_data": params.hist_data,
            "position_size": params.position_size,
            "price_source": &params.price_source,
            "rank_policy": params.rank_policy,
            "seed": params.seed,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::price_series::ReplaySampler;

    fn params() -> ContractParameters {
        ContractParameters::new(1.0, 0.05, 5, 0.2, 100.0, 0.2)
    }

    fn replay() -> ReplaySampler {
        ReplaySampler::new(vec![100.0, 104.0, 97.0, 101.0, 110.0])
    }

    #[test]
    fn test_series_lengths() {
        let out = compute_historical_var_with(&params(), &mut replay()).unwrap();
        let r = &out.result;
        assert_eq!(r.report.change_series.len(), 4);
        assert_eq!(r.return_statistics.count, 4);
        assert_eq!(r.time_to_maturity, 1.0);
    }

    #[test]
    fn test_matches_stagewise_computation() {
        let p = params();
        let out = compute_historical_var_with(&p, &mut replay()).unwrap();

        let contract = CallContract {
            strike_price: 100.0,
            interest_rate: 0.05,
            volatility: 0.2,
            time_to_maturity: 1.0,
        };
        let prices = [100.0, 104.0, 97.0, 101.0, 110.0];
        let values = value_portfolio(&call_prices(&prices, &contract).unwrap(), 100.0);
        let changes = change_series(&values).unwrap();
        assert_eq!(out.result.report.change_series, changes);

        // round(0.2 * 4) = 1 => the worst change, the fall from 104 to 97
        let worst = changes.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(out.result.var_estimate, worst);
        assert_eq!(out.result.quantile_rank, 1);
        assert!(worst < 0.0);
    }

    #[test]
    fn test_validation_order_and_fields() {
        let mut p = params();
        p.alpha = 1.5;
        p.maturity = -1.0;
        match compute_historical_var_with(&p, &mut replay()).unwrap_err() {
            OptionVarError::InvalidParameter { field, .. } => assert_eq!(field, "alpha"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_maturity_equal_today_rejected() {
        let mut p = params();
        p.maturity = 0.0;
        p.today = 0.0;
        assert!(matches!(
            compute_historical_var_with(&p, &mut replay()),
            Err(OptionVarError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_negative_volatility_rejected() {
        let mut p = params();
        p.volatility = -0.1;
        match compute_historical_var_with(&p, &mut replay()).unwrap_err() {
            OptionVarError::InvalidParameter { field, .. } => assert_eq!(field, "volatility"),
            other => panic!("unexpected {other:?}"),
        }
    }

    /// Counts how often the pipeline asks for a price path.
    struct CountingSampler {
        calls: usize,
    }

    impl NormalSampler for CountingSampler {
        fn sample(&mut self, n: usize, mean: f64, _std_dev: f64) -> OptionVarResult<Vec<f64>> {
            self.calls += 1;
            Ok(vec![mean; n])
        }
    }

    #[test]
    fn test_non_finite_scalars_rejected_before_sampling() {
        let cases: [(&str, fn(&mut ContractParameters)); 5] = [
            ("maturity", |p| p.maturity = f64::NAN),
            ("maturity", |p| p.maturity = f64::INFINITY),
            ("today", |p| p.today = f64::NAN),
            ("volatility", |p| p.volatility = f64::NAN),
            ("volatility", |p| p.volatility = f64::INFINITY),
        ];
        for (expected, mutate) in cases {
            let mut p = params();
            mutate(&mut p);
            let mut sampler = CountingSampler { calls: 0 };
            match compute_historical_var_with(&p, &mut sampler) {
                Err(OptionVarError::InvalidParameter { field, .. }) => {
                    assert_eq!(field, expected)
                }
                other => panic!("{expected}: expected InvalidParameter, got {other:?}"),
            }
            assert_eq!(sampler.calls, 0, "{expected} reached the sampler");
        }
    }

    #[test]
    fn test_zero_volatility_reaches_pricer() {
        let mut p = params();
        p.volatility = 0.0;
        assert!(matches!(
            compute_historical_var_with(&p, &mut replay()),
            Err(OptionVarError::DomainError { .. })
        ));
    }

    #[test]
    fn test_hist_data_below_two_rejected() {
        let mut p = params();
        p.hist_data = 1;
        assert!(matches!(
            compute_historical_var_with(&p, &mut replay()),
            Err(OptionVarError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_negative_sampled_price_is_domain_error() {
        let mut sampler = ReplaySampler::new(vec![100.0, -5.0, 100.0]);
        let mut p = params();
        p.hist_data = 3;
        assert!(matches!(
            compute_historical_var_with(&p, &mut sampler),
            Err(OptionVarError::DomainError { .. })
        ));
    }

    #[test]
    fn test_today_offset_shortens_maturity() {
        let mut p = params();
        p.today = 0.25;
        let out = compute_historical_var_with(&p, &mut replay()).unwrap();
        assert_eq!(out.result.time_to_maturity, 0.75);
    }

    #[test]
    fn test_small_sample_and_clamp_warnings() {
        let mut p = params();
        p.alpha = 0.05;
        let out = compute_historical_var_with(&p, &mut replay()).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("clamped")));
        assert!(out.warnings.iter().any(|w| w.contains("unreliable")));
    }

    #[test]
    fn test_strict_policy_propagates() {
        let mut p = params();
        p.alpha = 0.05;
        p.rank_policy = RankPolicy::Strict;
        assert!(matches!(
            compute_historical_var_with(&p, &mut replay()),
            Err(OptionVarError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_observed_source_uses_window() {
        let mut p = params();
        p.hist_data = 3;
        p.price_source = PriceSource::Observed {
            prices: vec![80.0, 100.0, 104.0, 97.0],
        };
        let mut unused = ReplaySampler::new(vec![]);
        let out = compute_historical_var_with(&p, &mut unused).unwrap();
        assert_eq!(out.result.report.change_series.len(), 2);
    }

    #[test]
    fn test_metadata_populated() {
        let out = compute_historical_var_with(&params(), &mut replay()).unwrap();
        assert_eq!(out.metadata.precision, "ieee754_f64");
        assert!(out.methodology.contains("Historical Simulation"));
        assert_eq!(out.assumptions["hist_data"], 5);
    }

    #[test]
    fn test_parameters_deserialise_with_defaults() {
        let p = ContractParameters::from_json(
            r#"{"maturity":1.0,"interest_rate":0.05,"hist_data":250,
                "volatility":0.2,"strike_price":100.0,"alpha":0.05}"#,
        )
        .unwrap();
        assert_eq!(p.today, 0.0);
        assert_eq!(p.position_size, 100.0);
        assert_eq!(p.price_source, PriceSource::default());
        assert_eq!(p.rank_policy, RankPolicy::Clamp);
        assert_eq!(p.seed, None);
    }

    #[test]
    fn test_malformed_parameters_are_serialization_errors() {
        for bad in [r#"{"maturity":1.0"#, r#"{"maturity":"soon"}"#, r#"{"alpha":0.05}"#] {
            assert!(
                matches!(
                    ContractParameters::from_json(bad),
                    Err(OptionVarError::SerializationError(_))
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_envelope_to_value() {
        let out = compute_historical_var_with(&params(), &mut replay()).unwrap();
        let value = out.to_value().unwrap();
        assert_eq!(value["result"]["ChangeSeries"].as_array().unwrap().len(), 4);
        assert_eq!(value["metadata"]["precision"], "ieee754_f64");
    }
}
