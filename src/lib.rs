// Trend Signal Bot Library
//
// Multi-resolution technical-indicator scanner that classifies watched
// instruments and notifies on improving bullish setups

pub mod core;
pub mod clients;
pub mod config;
pub mod db;     // SQLite database layer
pub mod error;  // Unified error handling

// Re-export core pipeline types
pub use core::{
    Candle, CycleReport, ExitLevelCalculator, ExitLevels, IndicatorSnapshot, PairState,
    PairStateStore, Resolution, ScanOrchestrator, TrendClassifier, TrendLabel, TrendResult,
    WatchList,
};

// Re-export error types
pub use error::{BotError, BotResult};

// Re-export client types
pub use clients::{CandleProvider, KrakenClient, LogNotifier, Notifier, TelegramNotifier};

// Re-export configuration
pub use config::{Config, ConfigError, LoggingConfig, ScanConfig};

// Re-export database types
pub use db::Database;
