pub mod historical_var;
pub mod portfolio;
pub mod quantile;
pub mod report;
