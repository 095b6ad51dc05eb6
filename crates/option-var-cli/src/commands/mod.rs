pub mod pricing;
pub mod var;
