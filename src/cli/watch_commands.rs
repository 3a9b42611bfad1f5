// Watch list and market listing command implementations
use tracing::{info, warn};

use trend_signal_bot::clients::is_listed;
use trend_signal_bot::{BotError, BotResult, CandleProvider, Config, Database, KrakenClient, WatchList};

fn open(config: &Config) -> BotResult<Database> {
    let db = Database::open(&config.database.path)?;
    // Seed first so an explicit edit doesn't discard the configured defaults
    db.load_or_seed_watch_list(&config.scan.instruments)?;
    Ok(db)
}

pub async fn add(config: &Config, instrument: &str, verify: bool) -> BotResult<()> {
    let normalized = WatchList::normalize(instrument);
    if normalized.is_empty() {
        return Err(BotError::InvalidInstrument(instrument.to_string()));
    }

    if verify {
        let provider = KrakenClient::from_config(&config.kraken);
        match is_listed(&provider, &normalized).await {
            Ok(true) => {}
            Ok(false) => return Err(BotError::InvalidInstrument(normalized)),
            // Listing is advisory; an unreachable exchange shouldn't block edits
            Err(e) => warn!("⚠️  Could not verify {} against {}: {}", normalized, provider.name(), e),
        }
    }

    let db = open(config)?;
    if db.add_watched(&normalized)? {
        info!("➕ Watching {}", normalized);
    } else {
        warn!("⚠️  {} is already watched", normalized);
    }
    Ok(())
}

pub fn remove(config: &Config, instrument: &str) -> BotResult<()> {
    let db = open(config)?;
    let normalized = WatchList::normalize(instrument);
    if db.remove_watched(&normalized)? {
        info!("➖ Stopped watching {}", normalized);
    } else {
        warn!("⚠️  {} was not watched", normalized);
    }
    Ok(())
}

pub fn list(config: &Config) -> BotResult<()> {
    let db = open(config)?;
    let instruments = db.load_watch_list()?;
    let states = db.load_pair_states()?;

    if instruments.is_empty() {
        info!("👀 No instruments watched (add one with: trend-bot watch add XBTUSD)");
        return Ok(());
    }

    info!("👀 Watch list ({} instruments)", instruments.len());
    for instrument in &instruments {
        let label = states
            .iter()
            .find(|s| &s.instrument == instrument)
            .map(|s| s.last_label.as_str())
            .unwrap_or("-");
        info!("   {:<12} {}", instrument, label);
    }
    Ok(())
}

/// Tradable instruments, optionally narrowed to those containing `filter`.
pub async fn markets(config: &Config, filter: Option<&str>) -> BotResult<()> {
    let provider = KrakenClient::from_config(&config.kraken);
    let mut instruments = provider.list_instruments().await?;

    if let Some(filter) = filter {
        let needle = WatchList::normalize(filter);
        instruments.retain(|i| i.contains(&needle));
    }

    info!("🏦 {} markets on {}", instruments.len(), provider.name());
    for chunk in instruments.chunks(8) {
        info!("   {}", chunk.join("  "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, instruments: &[&str]) -> Config {
        let mut config = Config::default();
        config.scan.instruments = instruments.iter().map(|i| i.to_string()).collect();
        config.database.path = dir.path().join("bot.db").to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_empty_watch_list_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(list(&config_in(&dir, &[])).is_ok());
    }

    #[test]
    fn test_list_after_removing_everything() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, &["XBTUSD"]);

        remove(&config, "XBTUSD").unwrap();
        assert!(list(&config).is_ok());

        let db = Database::open(&config.database.path).unwrap();
        assert!(db.load_watch_list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_without_verification_stores_normalized() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, &[]);

        add(&config, " solusd ", false).await.unwrap();

        let db = Database::open(&config.database.path).unwrap();
        assert_eq!(db.load_watch_list().unwrap(), vec!["SOLUSD"]);
    }
}
