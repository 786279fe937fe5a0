// Re-export model modules
mod dollar_rates;

pub use dollar_rates::*;
