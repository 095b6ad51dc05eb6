#[cfg(feature = "sampling")]
use rand::rngs::StdRng;
#[cfg(feature = "sampling")]
use rand::Rng;
#[cfg(feature = "sampling")]
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
#[cfg(feature = "sampling")]
use statrs::distribution::Normal;
use tracing::debug;

use crate::error::OptionVarError;
use crate::types::Price;
use crate::OptionVarResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the spot path driving the revaluation comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PriceSource {
    /// Independent draws from Normal(mean, std_dev), one per day.
    Synthetic { mean: f64, std_dev: f64 },
    /// A recorded price history, oldest first. The most recent
    /// `hist_data` observations are used.
    Observed { prices: Vec<Price> },
}

impl Default for PriceSource {
    fn default() -> Self {
        PriceSource::Synthetic {
            mean: 100.0,
            std_dev: 5.0,
        }
    }
}

/// Source of normally distributed draws.
///
/// The pipeline never touches a global RNG: every draw goes through an
/// implementation of this trait, so a run is reproducible whenever the
/// sampler is.
pub trait NormalSampler {
    /// Draw `n` independent samples from Normal(`mean`, `std_dev`).
    fn sample(&mut self, n: usize, mean: f64, std_dev: f64) -> OptionVarResult<Vec<f64>>;
}

// ---------------------------------------------------------------------------
// Samplers
// ---------------------------------------------------------------------------

/// `StdRng`-backed sampler, seeded explicitly or from OS entropy.
#[cfg(feature = "sampling")]
#[derive(Debug, Clone)]
pub struct SeededNormalSampler {
    rng: StdRng,
}

#[cfg(feature = "sampling")]
impl SeededNormalSampler {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::from_seed(s),
            None => Self::from_entropy(),
        }
    }
}

#[cfg(feature = "sampling")]
impl NormalSampler for SeededNormalSampler {
    fn sample(&mut self, n: usize, mean: f64, std_dev: f64) -> OptionVarResult<Vec<f64>> {
        let dist = Normal::new(mean, std_dev).map_err(|e| {
            OptionVarError::invalid("price_source", format!("Invalid Normal parameters: {e}"))
        })?;
        Ok((0..n).map(|_| self.rng.sample(dist)).collect())
    }
}

/// Replays a fixed sequence of values, cycling when exhausted.
///
/// Ignores the requested distribution parameters. Useful for replaying a
/// recorded path through the sampling interface and for deterministic tests.
#[derive(Debug, Clone)]
pub struct ReplaySampler {
    values: Vec<f64>,
    cursor: usize,
}

impl ReplaySampler {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl NormalSampler for ReplaySampler {
    fn sample(&mut self, n: usize, _mean: f64, _std_dev: f64) -> OptionVarResult<Vec<f64>> {
        if self.values.is_empty() {
            return Err(OptionVarError::InsufficientData(
                "Replay sampler has no values to replay".into(),
            ));
        }
        let len = self.values.len();
        let out = (0..n).map(|i| self.values[(self.cursor + i) % len]).collect();
        self.cursor = (self.cursor + n) % len;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate a synthetic price path of length `n` from Normal(`mean`, `std_dev`).
///
/// The draws are independent; downstream stages treat the result as a
/// chronologically ordered path.
pub fn generate_price_series<S: NormalSampler + ?Sized>(
    sampler: &mut S,
    n: usize,
    mean: f64,
    std_dev: f64,
) -> OptionVarResult<Vec<Price>> {
    if n == 0 {
        return Err(OptionVarError::invalid("hist_data", "must be at least 1"));
    }

    let prices = sampler.sample(n, mean, std_dev)?;
    if prices.len() != n {
        return Err(OptionVarError::domain(
            "price generation",
            format!("sampler returned {} values, expected {n}", prices.len()),
        ));
    }

    debug!(n, mean, std_dev, "generated synthetic price series");
    Ok(prices)
}

/// Take the most recent `n` observations of a recorded price history.
pub fn observed_window(prices: &[Price], n: usize) -> OptionVarResult<Vec<Price>> {
    if n == 0 {
        return Err(OptionVarError::invalid("hist_data", "must be at least 1"));
    }
    if prices.len() < n {
        return Err(OptionVarError::InsufficientData(format!(
            "{n} observations requested but only {} available",
            prices.len()
        )));
    }

    let window = prices[prices.len() - n..].to_vec();
    debug!(n, available = prices.len(), "selected observed price window");
    Ok(window)
}

/// Resolve a [`PriceSource`] into a price path of length `n`.
pub fn resolve_price_series<S: NormalSampler + ?Sized>(
    source: &PriceSource,
    n: usize,
    sampler: &mut S,
) -> OptionVarResult<Vec<Price>> {
    match source {
        PriceSource::Synthetic { mean, std_dev } => {
            generate_price_series(sampler, n, *mean, *std_dev)
        }
        PriceSource::Observed { prices } => observed_window(prices, n),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
