use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::OptionVarError;
use crate::OptionVarResult;

/// Number of equal-width bins in the change-distribution histogram.
pub const HISTOGRAM_BINS: usize = 20;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Narrative VaR statement plus the change series it was drawn from.
///
/// Serialised with the keys `VaR` and `ChangeSeries`, the shape plotting
/// tools consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarReport {
    #[serde(rename = "VaR")]
    pub var: String,
    #[serde(rename = "ChangeSeries")]
    pub change_series: Vec<f64>,
}

/// A single histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub frequency: f64,
}

/// Descriptive statistics of the portfolio change series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn to_decimal(value: f64, context: &str) -> OptionVarResult<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| {
        OptionVarError::domain(context, format!("{value} cannot be represented as a decimal"))
    })
}

/// VaR expressed as a loss: the estimate rounded to 2 dp, sign flipped.
///
/// A negative change (a loss) reports as a positive amount.
pub fn loss_amount(var_estimate: f64) -> OptionVarResult<Decimal> {
    let rounded = to_decimal(var_estimate, "loss_amount")?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok((-rounded).normalize())
}

/// Confidence level `(1 - alpha) * 100` as a percentage.
pub fn confidence_percent(alpha: f64) -> OptionVarResult<Decimal> {
    let alpha = to_decimal(alpha, "confidence_percent")?;
    Ok(((Decimal::ONE - alpha) * dec!(100)).round_dp(4).normalize())
}

/// `"The <p>% VaR is £<amount>"`
pub fn format_var_statement(var_estimate: f64, alpha: f64) -> OptionVarResult<String> {
    let p = confidence_percent(alpha)?;
    let amount = loss_amount(var_estimate)?;
    Ok(format!("The {p}% VaR is £{amount}"))
}

/// Package the VaR statement with the raw change series.
pub fn assemble_report(
    var_estimate: f64,
    alpha: f64,
    change_series: Vec<f64>,
) -> OptionVarResult<VarReport> {
    Ok(VarReport {
        var: format_var_statement(var_estimate, alpha)?,
        change_series,
    })
}

// ---------------------------------------------------------------------------
// Distribution helpers
// ---------------------------------------------------------------------------

/// Equal-width histogram of the change series over `[min, max]`.
///
/// The top edge is closed so the largest change lands in the last bin. A
/// flat series collapses to a single bin holding every change.
pub fn build_histogram(changes: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    if changes.is_empty() || num_bins == 0 {
        return Vec::new();
    }
    let (lo, hi) = changes
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
            (lo.min(c), hi.max(c))
        });
    let total = changes.len();

    if hi - lo < f64::EPSILON {
        return vec![HistogramBin {
            lower: lo,
            upper: hi,
            count: total as u32,
            frequency: 1.0,
        }];
    }

    let width = (hi - lo) / num_bins as f64;
    let mut counts = vec![0_u32; num_bins];
    for &c in changes {
        let slot = ((c - lo) / width) as usize;
        counts[slot.min(num_bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + i as f64 * width,
            upper: if i + 1 == num_bins {
                hi
            } else {
                lo + (i + 1) as f64 * width
            },
            count,
            frequency: count as f64 / total as f64,
        })
        .collect()
}

/// Mean, population standard deviation, min and max of the changes.
pub fn summarise_changes(changes: &[f64]) -> OptionVarResult<ChangeStatistics> {
    if changes.is_empty() {
        return Err(OptionVarError::InsufficientData(
            "At least one portfolio change is required".into(),
        ));
    }
    let n = changes.len() as f64;
    let mean = changes.iter().sum::<f64>() / n;
    let variance = changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;

    Ok(ChangeStatistics {
        mean,
        std_dev: variance.sqrt(),
        min: changes.iter().copied().fold(f64::INFINITY, f64::min),
        max: changes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_statement() {
        assert_eq!(
            format_var_statement(-50.0, 0.2).unwrap(),
            "The 80% VaR is £50"
        );
    }

    #[test]
    fn test_amount_rounded_to_two_places() {
        assert_eq!(loss_amount(-12.3456).unwrap(), dec!(12.35));
        assert_eq!(loss_amount(-7.0).unwrap(), dec!(7));
        assert_eq!(
            format_var_statement(-12.3456, 0.05).unwrap(),
            "The 95% VaR is £12.35"
        );
    }

    #[test]
    fn test_gain_reports_negative_loss() {
        assert_eq!(
            format_var_statement(3.5, 0.01).unwrap(),
            "The 99% VaR is £-3.5"
        );
    }

    #[test]
    fn test_zero_change_has_no_sign() {
        assert_eq!(loss_amount(0.0).unwrap(), Decimal::ZERO);
        assert_eq!(loss_amount(-0.001).unwrap(), Decimal::ZERO);
        assert_eq!(
            format_var_statement(0.0, 0.1).unwrap(),
            "The 90% VaR is £0"
        );
    }

    #[test]
    fn test_fractional_confidence() {
        assert_eq!(confidence_percent(0.025).unwrap(), dec!(97.5));
    }

    #[test]
    fn test_nan_estimate_is_domain_error() {
        assert!(matches!(
            loss_amount(f64::NAN),
            Err(OptionVarError::DomainError { .. })
        ));
    }

    #[test]
    fn test_report_serialises_with_bundle_keys() {
        let report = assemble_report(-50.0, 0.2, vec![-50.0, -10.0, 0.0, 10.0, 50.0]).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["VaR"], "The 80% VaR is £50");
        assert_eq!(obj["ChangeSeries"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_histogram_counts_and_frequencies() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let bins = build_histogram(&values, HISTOGRAM_BINS);
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u32>(), 100);
        let freq: f64 = bins.iter().map(|b| b.frequency).sum();
        assert!((freq - 1.0).abs() < 1e-10);
        assert_eq!(bins[HISTOGRAM_BINS - 1].upper, 99.0);
    }

    #[test]
    fn test_histogram_constant_series() {
        let bins = build_histogram(&[2.0, 2.0, 2.0], HISTOGRAM_BINS);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn test_histogram_extremes_in_edge_bins() {
        let bins = build_histogram(&[-50.0, -10.0, 0.0, 10.0, 50.0], 4);
        assert_eq!(bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 1, 2, 1]);
        assert_eq!(bins[0].lower, -50.0);
        assert_eq!(bins[3].upper, 50.0);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(build_histogram(&[], HISTOGRAM_BINS).is_empty());
    }

    #[test]
    fn test_change_statistics() {
        let s = summarise_changes(&[-50.0, -10.0, 0.0, 10.0, 50.0]).unwrap();
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.min, -50.0);
        assert_eq!(s.max, 50.0);
        // (2500 + 100 + 0 + 100 + 2500) / 5 = 1040
        assert!((s.std_dev - 1040.0_f64.sqrt()).abs() < 1e-12);
    }
}
