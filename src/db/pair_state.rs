//! Pair-state snapshot persistence

use rusqlite::{params, Result as SqlResult};
use tracing::warn;

use super::Database;
use crate::core::types::{PairState, TrendLabel};

impl Database {
    /// Replace every stored pair state with `states` in one transaction
    pub fn save_pair_states(&self, states: &[PairState]) -> SqlResult<()> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM pair_state", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pair_state (instrument, last_label, updated_at)
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)",
            )?;
            for state in states {
                stmt.execute(params![state.instrument, state.last_label.as_str()])?;
            }
        }
        tx.commit()
    }

    /// Stored states; rows with unknown labels are skipped
    pub fn load_pair_states(&self) -> SqlResult<Vec<PairState>> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT instrument, last_label FROM pair_state ORDER BY instrument")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut states = Vec::new();
        for row in rows {
            let (instrument, label) = row?;
            match label.parse::<TrendLabel>() {
                Ok(last_label) => states.push(PairState { instrument, last_label }),
                Err(e) => warn!(instrument = %instrument, error = %e, "ignoring stored pair state"),
            }
        }
        Ok(states)
    }
}
