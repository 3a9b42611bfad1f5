// Watched instrument identifiers

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared, insertion-ordered set of instruments. Read by the orchestrator at
/// the start of every cycle, so edits apply from the next cycle.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    instruments: Arc<RwLock<Vec<String>>>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instruments<I, S>(instruments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = Self::new();
        for instrument in instruments {
            list.add(instrument.as_ref());
        }
        list
    }

    /// Trimmed, uppercase form used for storage and comparison.
    pub fn normalize(instrument: &str) -> String {
        instrument.trim().to_ascii_uppercase()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<String>> {
        self.instruments.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<String>> {
        self.instruments.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns false for blanks and duplicates.
    pub fn add(&self, instrument: &str) -> bool {
        let normalized = Self::normalize(instrument);
        if normalized.is_empty() {
            return false;
        }
        let mut list = self.write();
        if list.contains(&normalized) {
            return false;
        }
        list.push(normalized);
        true
    }

    pub fn remove(&self, instrument: &str) -> bool {
        let normalized = Self::normalize(instrument);
        let mut list = self.write();
        let before = list.len();
        list.retain(|i| *i != normalized);
        list.len() != before
    }

    pub fn contains(&self, instrument: &str) -> bool {
        self.read().contains(&Self::normalize(instrument))
    }

    pub fn list(&self) -> Vec<String> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_normalizes_and_dedups() {
        let list = WatchList::new();
        assert!(list.add(" xbtusd "));
        assert!(!list.add("XBTUSD"));
        assert!(!list.add("   "));
        assert_eq!(list.list(), vec!["XBTUSD"]);
    }

    #[test]
    fn test_remove() {
        let list = WatchList::from_instruments(["XBTUSD", "ETHUSD"]);
        assert!(list.remove("ethusd"));
        assert!(!list.remove("ETHUSD"));
        assert!(!list.contains("ETHUSD"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let list = WatchList::new();
        let handle = list.clone();
        handle.add("SOLUSD");
        assert!(list.contains("SOLUSD"));
    }
}
