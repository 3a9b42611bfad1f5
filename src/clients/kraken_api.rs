// Kraken public OHLC client

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

use crate::clients::provider::{CandleProvider, ProviderError};
use crate::config::KrakenConfig;
use crate::core::types::{Candle, Resolution};

#[derive(Debug)]
pub struct KrakenClient {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Mutex<RateLimiter>,
}

impl KrakenClient {
    pub fn new() -> Self {
        Self::from_config(&KrakenConfig::default())
    }

    pub fn from_config(config: &KrakenConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.rest_url.trim_end_matches('/').to_string(),
            rate_limiter: Mutex::new(RateLimiter::new(
                config.max_calls_per_minute,
                Duration::from_secs(60),
            )),
        }
    }

    /// Replace the per-minute budget with `max_calls` per `window`.
    pub fn with_rate_limit(mut self, max_calls: u32, window: Duration) -> Self {
        self.rate_limiter = Mutex::new(RateLimiter::new(max_calls, window));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)], pair: &str) -> Result<Value, ProviderError> {
        self.rate_limiter.lock().await.acquire().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimited(pair.to_string()));
        }

        if !response.status().is_success() {
            return Err(ProviderError::Http(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Fetch OHLC data starting at `since`, sorted oldest first.
    pub async fn fetch_ohlc(
        &self,
        pair: &str,
        interval_minutes: u32,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>, ProviderError> {
        let mut params = vec![
            ("pair", pair.to_string()),
            ("interval", interval_minutes.to_string()),
        ];

        if let Some(since_time) = since {
            params.push(("since", since_time.timestamp().to_string()));
        }

        debug!(pair, interval_minutes, "requesting Kraken OHLC");
        let json = self.get_json("/0/public/OHLC", &params, pair).await?;
        parse_ohlc_response(&json, pair)
    }

    /// Online spot pairs by their alternate name (e.g. `XBTUSD`).
    pub async fn fetch_asset_pairs(&self) -> Result<Vec<String>, ProviderError> {
        debug!("requesting Kraken asset pairs");
        let json = self.get_json("/0/public/AssetPairs", &[], "AssetPairs").await?;
        parse_asset_pairs(&json)
    }
}

impl Default for KrakenClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandleProvider for KrakenClient {
    fn name(&self) -> &str {
        "kraken"
    }

    async fn wait_ready(&self) {
        self.rate_limiter.lock().await.wait_for_slot().await;
    }

    async fn list_instruments(&self) -> Result<Vec<String>, ProviderError> {
        self.fetch_asset_pairs().await
    }

    async fn fetch_candles(
        &self,
        instrument: &str,
        resolution: Resolution,
        count: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let interval = resolution.minutes();
        let lookback = ChronoDuration::minutes(interval as i64 * count as i64);
        let since = Utc::now() - lookback;

        let mut candles = self.fetch_ohlc(instrument, interval, Some(since)).await?;
        if candles.len() > count {
            candles.drain(..candles.len() - count);
        }
        Ok(candles)
    }
}

/// Parse Kraken's `{"error": [...], "result": {"<PAIR>": [[...]], "last": n}}`.
pub fn parse_ohlc_response(json: &Value, pair: &str) -> Result<Vec<Candle>, ProviderError> {
    if let Some(errors) = json["error"].as_array() {
        if let Some(first) = errors.iter().filter_map(|e| e.as_str()).next() {
            return Err(classify_api_error(first, pair));
        }
    }

    let result = json["result"]
        .as_object()
        .ok_or_else(|| ProviderError::Parse("Missing result field".to_string()))?;

    // The pair key is Kraken's normalized name; "last" is the pagination cursor.
    let rows = result
        .iter()
        .find(|(key, _)| key.as_str() != "last")
        .and_then(|(_, v)| v.as_array())
        .ok_or_else(|| ProviderError::Parse("Invalid OHLC data format".to_string()))?;

    let mut candles = Vec::with_capacity(rows.len());

    for row in rows {
        let fields = row
            .as_array()
            .ok_or_else(|| ProviderError::Parse("Invalid candle format".to_string()))?;

        if fields.len() < 7 {
            continue; // Skip malformed candles
        }

        let timestamp = fields[0]
            .as_i64()
            .ok_or_else(|| ProviderError::Parse("Invalid timestamp".to_string()))?;

        let timestamp = DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| ProviderError::Parse("Invalid timestamp conversion".to_string()))?;

        candles.push(Candle {
            timestamp,
            open: parse_price(&fields[1], "open")?,
            high: parse_price(&fields[2], "high")?,
            low: parse_price(&fields[3], "low")?,
            close: parse_price(&fields[4], "close")?,
            volume: parse_price(&fields[6], "volume")?,
        });
    }

    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);

    Ok(candles)
}

/// Parse `{"error": [...], "result": {"<PAIR>": {"altname": ..., "status": ...}}}`.
///
/// Dark-pool entries (`.d` keys) and pairs whose status is not `online` are
/// left out.
pub fn parse_asset_pairs(json: &Value) -> Result<Vec<String>, ProviderError> {
    if let Some(errors) = json["error"].as_array() {
        if let Some(first) = errors.iter().filter_map(|e| e.as_str()).next() {
            return Err(classify_api_error(first, "AssetPairs"));
        }
    }

    let result = json["result"]
        .as_object()
        .ok_or_else(|| ProviderError::Parse("Missing result field".to_string()))?;

    let mut pairs: Vec<String> = result
        .iter()
        .filter(|(key, _)| !key.ends_with(".d"))
        .filter(|(_, info)| info["status"].as_str().map_or(true, |s| s == "online"))
        .map(|(key, info)| info["altname"].as_str().unwrap_or(key).to_string())
        .collect();

    pairs.sort();
    pairs.dedup();
    Ok(pairs)
}

fn parse_price(value: &Value, field: &str) -> Result<f64, ProviderError> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value.as_f64())
        .ok_or_else(|| ProviderError::Parse(format!("Invalid {} price", field)))
}

fn classify_api_error(message: &str, pair: &str) -> ProviderError {
    if message.contains("Unknown asset pair") {
        ProviderError::UnknownInstrument(pair.to_string())
    } else if message.contains("Rate limit") || message.contains("Too many requests") {
        ProviderError::RateLimited(message.to_string())
    } else {
        ProviderError::Api(message.to_string())
    }
}

#[derive(Debug)]
struct RateLimiter {
    max_calls: u32,
    window_duration: Duration,
    calls: Vec<Instant>,
}

impl RateLimiter {
    fn new(max_calls: u32, window_duration: Duration) -> Self {
        Self {
            max_calls,
            window_duration,
            calls: Vec::new(),
        }
    }

    /// Sleep until the window has room for another call, without taking it.
    async fn wait_for_slot(&mut self) {
        let now = Instant::now();

        // Remove old calls outside the window
        self.calls
            .retain(|&call_time| now.duration_since(call_time) < self.window_duration);

        if self.calls.len() >= self.max_calls as usize {
            if let Some(&oldest_call) = self.calls.first() {
                let wait_time = self
                    .window_duration
                    .saturating_sub(now.duration_since(oldest_call));
                if !wait_time.is_zero() {
                    debug!(wait_ms = wait_time.as_millis() as u64, "Kraken rate limit reached, waiting");
                    sleep(wait_time).await;
                }
            }
            let now = Instant::now();
            self.calls
                .retain(|&call_time| now.duration_since(call_time) < self.window_duration);
        }
    }

    async fn acquire(&mut self) {
        self.wait_for_slot().await;
        self.calls.push(Instant::now());
    }
}
