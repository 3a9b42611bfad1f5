use async_trait::async_trait;

use crate::core::types::{Candle, Resolution};
use crate::core::watch_list::WatchList;

/// Source of OHLC candles for watched instruments.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Provider name (for logging/display).
    fn name(&self) -> &str;

    /// Resolves once the next request can be sent without throttling.
    /// Callers time only the request itself, not this wait.
    async fn wait_ready(&self) {}

    /// Fetch up to `count` most recent candles, oldest first.
    async fn fetch_candles(
        &self,
        instrument: &str,
        resolution: Resolution,
        count: usize,
    ) -> Result<Vec<Candle>, ProviderError>;

    /// Tradable instrument identifiers, sorted.
    async fn list_instruments(&self) -> Result<Vec<String>, ProviderError>;
}

/// Whether `instrument` (normalized) is among the provider's listed instruments.
pub async fn is_listed(provider: &dyn CandleProvider, instrument: &str) -> Result<bool, ProviderError> {
    let wanted = WatchList::normalize(instrument);
    Ok(provider
        .list_instruments()
        .await?
        .iter()
        .any(|listed| WatchList::normalize(listed) == wanted))
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_) | ProviderError::RateLimited(_) | ProviderError::Timeout(_)
        )
    }
}
