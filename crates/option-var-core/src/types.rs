use serde::{Deserialize, Serialize};

use crate::OptionVarResult;

/// Spot and strike levels, and per-unit option values, in currency units.
pub type Price = f64;

/// Rates and volatilities expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = f64;

/// Year fractions measured from the valuation date
pub type Years = f64;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

impl<T: Serialize> ComputationOutput<T> {
    /// The whole envelope as a JSON value.
    pub fn to_value(&self) -> OptionVarResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
