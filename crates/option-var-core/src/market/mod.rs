pub mod price_series;
pub mod returns;
