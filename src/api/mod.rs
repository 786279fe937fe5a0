pub mod bcv;
pub mod binance;

pub use bcv::BcvClient;
pub use binance::BinanceP2PClient;

use anyhow::Result;

/// A remote source that yields a single VES-per-USD rate.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;
    async fn fetch_rate(&self) -> Result<f64>;
}
