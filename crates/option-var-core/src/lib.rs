pub mod error;
pub mod market;
pub mod pricing;
pub mod risk;
pub mod types;

pub use error::OptionVarError;
pub use types::*;

/// Standard result type for all option VaR operations
pub type OptionVarResult<T> = Result<T, OptionVarError>;
