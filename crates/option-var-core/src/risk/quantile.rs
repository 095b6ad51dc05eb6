use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OptionVarError;
use crate::OptionVarResult;

/// What to do when `round(alpha * k)` lands on rank 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankPolicy {
    /// Use rank 1, the worst observed change.
    #[default]
    Clamp,
    /// Reject the request with `InvalidParameter`.
    Strict,
}

/// Empirical quantile selected from the sorted change series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileEstimate {
    /// Change at the selected rank; negative values are losses.
    pub var: f64,
    /// 1-indexed rank into the ascending change series.
    pub rank: usize,
    /// True when rank 0 was clamped to 1.
    pub clamped: bool,
}

/// `round(alpha * k)` with halves rounded up.
pub fn quantile_rank(alpha: f64, k: usize) -> usize {
    (alpha * k as f64 + 0.5).floor() as usize
}

/// Historical-simulation VaR: the change at rank `round(alpha * k)` of the
/// ascending change series.
pub fn estimate_var(
    changes: &[f64],
    alpha: f64,
    policy: RankPolicy,
) -> OptionVarResult<QuantileEstimate> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(OptionVarError::invalid("alpha", "must be between 0 and 1"));
    }
    if changes.is_empty() {
        return Err(OptionVarError::InsufficientData(
            "At least one portfolio change is required".into(),
        ));
    }
    if let Some(i) = changes.iter().position(|c| !c.is_finite()) {
        return Err(OptionVarError::domain(
            "estimate_var",
            format!("change at index {i} is not finite"),
        ));
    }

    let mut sorted = changes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let k = sorted.len();
    let raw_rank = quantile_rank(alpha, k);
    let (rank, clamped) = match (raw_rank, policy) {
        (0, RankPolicy::Clamp) => (1, true),
        (0, RankPolicy::Strict) => {
            return Err(OptionVarError::invalid(
                "alpha",
                format!("round({alpha} * {k}) is rank 0, below the first observation"),
            ));
        }
        (r, _) => (r.min(k), false),
    };

    debug!(k, alpha, rank, clamped, "selected empirical quantile");
    Ok(QuantileEstimate {
        var: sorted[rank - 1],
        rank,
        clamped,
    })
}
