// Core signal pipeline modules

pub mod types;
pub mod indicators;
pub mod timeframe;
pub mod trend_classifier;
pub mod state_tracker;
pub mod exit_levels;
pub mod watch_list;
pub mod alert;
pub mod scanner;

// Re-export commonly used types
pub use types::{
    BollingerBands, Candle, ExitLevels, IndicatorSnapshot, MacdValue, PairState, Resolution,
    StochasticValue, TrendLabel, TrendResult,
};
pub use timeframe::{SnapshotOutcome, TimeframeAnalyzer};
pub use trend_classifier::{SignalTally, TrendClassifier};
pub use state_tracker::{should_alert, PairStateStore};
pub use exit_levels::ExitLevelCalculator;
pub use watch_list::WatchList;
pub use alert::TrendAlert;
pub use scanner::{CycleReport, InstrumentAnalysis, ScanOrchestrator};
