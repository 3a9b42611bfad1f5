//! Watch list persistence

use rusqlite::{params, OptionalExtension, Result as SqlResult};

use super::Database;
use crate::core::watch_list::WatchList;

const SEEDED_KEY: &str = "watch_list_seeded";

impl Database {
    /// Instruments in insertion order
    pub fn load_watch_list(&self) -> SqlResult<Vec<String>> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT instrument FROM watch_list ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    /// Stored list. The first call on a fresh database seeds it from `seed`;
    /// later calls never re-seed, so removing every instrument sticks.
    pub fn load_or_seed_watch_list(&self, seed: &[String]) -> SqlResult<Vec<String>> {
        if self.watch_list_seeded()? {
            return self.load_watch_list();
        }

        // Databases created before the marker existed keep their entries
        if self.load_watch_list()?.is_empty() {
            for instrument in seed {
                if !WatchList::normalize(instrument).is_empty() {
                    self.add_watched(instrument)?;
                }
            }
        }
        self.connection().execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, CURRENT_TIMESTAMP)",
            params![SEEDED_KEY],
        )?;
        self.load_watch_list()
    }

    fn watch_list_seeded(&self) -> SqlResult<bool> {
        let marker: Option<String> = self
            .connection()
            .query_row("SELECT value FROM meta WHERE key = ?1", params![SEEDED_KEY], |row| row.get(0))
            .optional()?;
        Ok(marker.is_some())
    }

    /// Returns true when the instrument was not stored yet
    pub fn add_watched(&self, instrument: &str) -> SqlResult<bool> {
        let changed = self.connection().execute(
            "INSERT OR IGNORE INTO watch_list (instrument) VALUES (?1)",
            params![WatchList::normalize(instrument)],
        )?;
        Ok(changed > 0)
    }

    /// Removes the instrument and its stored pair state
    pub fn remove_watched(&self, instrument: &str) -> SqlResult<bool> {
        let normalized = WatchList::normalize(instrument);
        let conn = self.connection();
        let changed = conn.execute("DELETE FROM watch_list WHERE instrument = ?1", params![normalized])?;
        conn.execute("DELETE FROM pair_state WHERE instrument = ?1", params![normalized])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_list_remove() {
        let db = Database::new_in_memory().unwrap();
        assert!(db.add_watched("xbtusd").unwrap());
        assert!(db.add_watched("ETHUSD").unwrap());
        assert!(!db.add_watched("XBTUSD").unwrap());

        assert_eq!(db.load_watch_list().unwrap(), vec!["XBTUSD", "ETHUSD"]);

        assert!(db.remove_watched("XBTUSD").unwrap());
        assert!(!db.remove_watched("XBTUSD").unwrap());
        assert_eq!(db.load_watch_list().unwrap(), vec!["ETHUSD"]);
    }

    #[test]
    fn test_seed_only_applies_to_empty_table() {
        let db = Database::new_in_memory().unwrap();
        let seed = vec!["xbtusd".to_string(), " ".to_string(), "ETHUSD".to_string()];
        assert_eq!(db.load_or_seed_watch_list(&seed).unwrap(), vec!["XBTUSD", "ETHUSD"]);

        db.remove_watched("ETHUSD").unwrap();
        assert_eq!(db.load_or_seed_watch_list(&seed).unwrap(), vec!["XBTUSD"]);
    }

    #[test]
    fn test_emptied_list_is_not_reseeded() {
        let db = Database::new_in_memory().unwrap();
        let seed = vec!["XBTUSD".to_string()];
        db.load_or_seed_watch_list(&seed).unwrap();

        assert!(db.remove_watched("XBTUSD").unwrap());
        assert!(db.load_or_seed_watch_list(&seed).unwrap().is_empty());
    }

    #[test]
    fn test_existing_entries_are_kept_when_marking_seeded() {
        let db = Database::new_in_memory().unwrap();
        db.add_watched("SOLUSD").unwrap();

        let seed = vec!["XBTUSD".to_string()];
        assert_eq!(db.load_or_seed_watch_list(&seed).unwrap(), vec!["SOLUSD"]);
    }
}
