// Per-instrument label memory and alert filtering

use crate::core::types::{PairState, TrendLabel};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Transitions that count as an improving setup worth alerting on.
pub const ALERT_TRANSITIONS: [(TrendLabel, TrendLabel); 6] = [
    (TrendLabel::Bearish, TrendLabel::Bullish),
    (TrendLabel::Bearish, TrendLabel::StrongBullish),
    (TrendLabel::StrongBearish, TrendLabel::Bullish),
    (TrendLabel::StrongBearish, TrendLabel::StrongBullish),
    (TrendLabel::Neutral, TrendLabel::Bullish),
    (TrendLabel::Neutral, TrendLabel::StrongBullish),
];

/// Alert decision for a new label given the previously stored one.
pub fn should_alert(previous: Option<TrendLabel>, current: TrendLabel) -> bool {
    match previous {
        None => current.is_bullish(),
        Some(prev) if prev == current => false,
        Some(prev) => ALERT_TRANSITIONS.contains(&(prev, current)),
    }
}

/// Last known label per instrument.
///
/// Created at process start and shared by handle. Only the scan cycle writes
/// to it, but the map sits behind a mutex so concurrent readers (CLI, tests)
/// stay sound.
#[derive(Debug, Clone, Default)]
pub struct PairStateStore {
    states: Arc<Mutex<HashMap<String, TrendLabel>>>,
}

impl PairStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TrendLabel>> {
        // A poisoned map still holds valid labels.
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Decide whether `label` is alert-worthy, then store it unconditionally.
    pub fn observe(&self, instrument: &str, label: TrendLabel) -> bool {
        let mut states = self.lock();
        let previous = states.insert(instrument.to_string(), label);
        should_alert(previous, label)
    }

    pub fn get(&self, instrument: &str) -> Option<TrendLabel> {
        self.lock().get(instrument).copied()
    }

    /// Drop entries for instruments no longer watched.
    pub fn retain_instruments(&self, watched: &[String]) -> usize {
        let mut states = self.lock();
        let before = states.len();
        states.retain(|instrument, _| watched.iter().any(|w| w == instrument));
        before - states.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of every entry, for persistence.
    pub fn snapshot(&self) -> Vec<PairState> {
        let mut states: Vec<PairState> = self
            .lock()
            .iter()
            .map(|(instrument, label)| PairState {
                instrument: instrument.clone(),
                last_label: *label,
            })
            .collect();
        states.sort_by(|a, b| a.instrument.cmp(&b.instrument));
        states
    }

    /// Replace the contents with a previously taken snapshot.
    pub fn restore(&self, states: Vec<PairState>) {
        let mut map = self.lock();
        map.clear();
        map.extend(states.into_iter().map(|s| (s.instrument, s.last_label)));
    }
}
