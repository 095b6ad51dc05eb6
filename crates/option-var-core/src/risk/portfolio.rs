use tracing::debug;

use crate::error::OptionVarError;
use crate::OptionVarResult;

/// Scale per-unit option values by the number of contracts held.
pub fn value_portfolio(option_values: &[f64], position_size: f64) -> Vec<f64> {
    option_values.iter().map(|v| v * position_size).collect()
}

/// Day-over-day changes `values[i] - values[i-1]` for i in 1..m.
///
/// Position 0 has no predecessor and is dropped, the same convention as
/// log-return extraction, so the output has `m - 1` elements.
pub fn change_series(values: &[f64]) -> OptionVarResult<Vec<f64>> {
    if values.len() < 2 {
        return Err(OptionVarError::InsufficientData(format!(
            "Change series needs at least 2 portfolio values, got {}",
            values.len()
        )));
    }
    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    debug!(count = changes.len(), "built portfolio change series");
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_portfolio_scales() {
        let v = value_portfolio(&[1.5, 2.0, 0.0], 100.0);
        assert_eq!(v, vec![150.0, 200.0, 0.0]);
    }

    #[test]
    fn test_value_portfolio_propagates_nan() {
        let v = value_portfolio(&[f64::NAN], 10.0);
        assert!(v[0].is_nan());
    }

    #[test]
    fn test_change_series_differences() {
        let c = change_series(&[100.0, 110.0, 105.0, 105.0]).unwrap();
        assert_eq!(c, vec![10.0, -5.0, 0.0]);
    }

    #[test]
    fn test_change_series_minimum_length() {
        assert_eq!(change_series(&[1.0, 4.0]).unwrap(), vec![3.0]);
        assert!(matches!(
            change_series(&[1.0]),
            Err(OptionVarError::InsufficientData(_))
        ));
    }
}
