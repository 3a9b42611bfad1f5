// External collaborators: market data and alert delivery

pub mod provider;
pub mod kraken_api;
pub mod notifier;

// Re-export client types
pub use provider::{is_listed, CandleProvider, ProviderError};
pub use kraken_api::{KrakenClient, parse_asset_pairs, parse_ohlc_response};
pub use notifier::{ActionLink, LogNotifier, Notifier, NotifyError, TelegramNotifier};
